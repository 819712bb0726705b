//! Unified error types and result handling for `KaiBot`.

use thiserror::Error;

/// Every failure the bot can surface, from configuration to Discord calls.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed configuration (config.toml, environment, CLI)
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Database failure reported by `SeaORM`
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// A stored document could not be decoded
    #[error("Corrupted settings for guild {guild_id}: {message}")]
    CorruptedSettings {
        /// Guild whose document failed to decode
        guild_id: u64,
        /// Decoder message
        message: String,
    },

    /// A prefix was rejected by the settings rules
    #[error("Invalid prefix `{prefix}`: {reason}")]
    InvalidPrefix {
        /// Offending prefix
        prefix: String,
        /// Which rule it broke
        reason: PrefixRejection,
    },

    /// A tic-tac-toe move was not allowed
    #[error("Invalid move {position}: {reason}")]
    InvalidMove {
        /// Zero-based board position
        position: usize,
        /// Why the move was rejected
        reason: &'static str,
    },

    /// A Brainfuck program ran out of its step budget
    #[error("Brainfuck program exceeded {limit} steps")]
    StepLimitExceeded {
        /// Budget that was exhausted
        limit: u64,
    },

    /// I/O failure (config and log files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP failure while resolving links
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// TOML parse failure
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON encode/decode failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A blocking task panicked or was cancelled
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Serenity/Poise framework error
    #[error("Serenity/Poise framework error: {0}")]
    #[allow(clippy::enum_variant_names)]
    FrameworkError(Box<poise::serenity_prelude::Error>),
}

/// Rules a custom prefix can break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixRejection {
    /// Empty, whitespace-only or colliding with mentions/slash commands
    Reserved,
    /// Longer than the allowed number of characters
    TooLong,
    /// Already configured for the guild
    Duplicate,
    /// The guild already has the maximum number of prefixes
    LimitReached,
    /// Removal of a prefix the guild does not use
    NotInUse,
}

impl std::fmt::Display for PrefixRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Reserved => "reserved",
            Self::TooLong => "too long",
            Self::Duplicate => "already in use",
            Self::LimitReached => "prefix limit reached",
            Self::NotInUse => "not in use",
        };
        f.write_str(text)
    }
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::FrameworkError(Box::new(value))
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
