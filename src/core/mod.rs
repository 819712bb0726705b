//! Core logic - framework-agnostic pieces the Discord layer is built on.

/// Brainfuck interpreter
pub mod brainfuck;
/// Message catalogs and translators
pub mod i18n;
/// Bounded least-recently-used cache
pub mod lru;
/// Role hierarchy, channel lock and purge rules
pub mod moderation;
/// HTTP redirect chain resolution
pub mod redirects;
/// Per-guild settings documents behind an LRU cache
pub mod settings;
/// Morse, vaporwave, dice and escaping helpers
pub mod text;
/// Tic-tac-toe board and rules
pub mod tictactoe;
