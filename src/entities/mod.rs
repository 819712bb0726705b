//! Entity module - Contains the SeaORM entity definitions for the database.

pub mod guild_settings;

pub use guild_settings::{Entity as GuildSettings, Model as GuildSettingsModel};
