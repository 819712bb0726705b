//! Discord command implementations organized by category.
//!
//! Each module is one help category; the category name doubles as the
//! catalog key of its title (`categories.<name>`).

#![allow(clippy::too_long_first_doc_paragraph)]

/// Tic-tac-toe with buttons or reactions
pub mod fun;

/// Localized help
pub mod help;

/// Avatars, user details and the oldest members
pub mod info;

/// Latency, privacy policy and bot information
pub mod misc;

/// Moderation and guild settings
pub mod moderation;

/// Dice, Brainfuck, Morse, vaporwave and link resolving
pub mod utilities;

/// Help categories in display order
pub const CATEGORIES: [&str; 5] = ["misc", "info", "moderation", "fun", "utilities"];

// Export commands
pub use fun::*;
pub use help::help;
pub use info::*;
pub use misc::*;
pub use moderation::*;
pub use utilities::*;
