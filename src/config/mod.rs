/// Application settings loaded from config.toml
pub mod app;

/// Command line arguments
pub mod cli;

/// Database configuration and connection management
pub mod database;

/// Subscriber setup for stdout and file logs
pub mod logging;

pub use app::{AppConfig, Badge, LogChannels, UserFlags, load_config, parse_config};
