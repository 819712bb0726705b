//! Application configuration loading from config.toml
//!
//! Every field carries a default so the bot can start without a config file;
//! the file only overrides what it names.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Default prefix list used when a guild has not configured its own
pub const DEFAULT_PREFIXES: [&str; 2] = ["k.", "kaibot "];

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Language used for DMs and guilds without a stored language
    pub default_language: String,
    /// Prefixes accepted when a guild has no custom ones
    pub prefixes: Vec<String>,
    /// Colour of every embed the bot sends
    pub main_color: u32,
    /// Link shown by the `privacy` command
    pub privacy_policy_url: String,
    /// Channels mirroring commands, errors and guild membership changes
    pub log_channels: LogChannels,
    /// Users with badges shown in `userinfo`
    pub flags: UserFlags,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_language: "pt_BR".to_string(),
            prefixes: DEFAULT_PREFIXES.iter().map(ToString::to_string).collect(),
            main_color: 0x00FF_6EFF,
            privacy_policy_url: "https://gist.github.com/uKaigo/ac2c76098eae2c2abc5e82bb19b80cb9"
                .to_string(),
            log_channels: LogChannels::default(),
            flags: UserFlags::default(),
        }
    }
}

/// Optional channel IDs for the bot's own log feed
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogChannels {
    /// Receives one embed per executed command
    pub commands: Option<u64>,
    /// Receives unexpected command errors
    pub errors: Option<u64>,
    /// Receives guild join/leave notices
    pub guilds: Option<u64>,
}

/// User IDs carrying special badges
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserFlags {
    /// Bot developers
    pub developers: Vec<u64>,
    /// Catalog translators
    pub translators: Vec<u64>,
    /// VIP users
    pub vips: Vec<u64>,
}

/// Badge a user can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    /// 💻
    Developer,
    /// 📖
    Translator,
    /// ⭐
    Vip,
}

impl UserFlags {
    /// Returns the badges held by `user_id`, in display order.
    #[must_use]
    pub fn badges_for(&self, user_id: u64) -> Vec<Badge> {
        let mut badges = Vec::new();
        if self.developers.contains(&user_id) {
            badges.push(Badge::Developer);
        }
        if self.translators.contains(&user_id) {
            badges.push(Badge::Translator);
        }
        if self.vips.contains(&user_id) {
            badges.push(Badge::Vip);
        }
        badges
    }
}

/// Parses configuration from TOML text.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads configuration from a TOML file, falling back to defaults when the
/// file does not exist.
///
/// # Errors
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::warn!("{} not found, using default configuration", path.display());
        return Ok(AppConfig::default());
    }

    tracing::debug!("Loading configuration from {}", path.display());
    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path.display()),
    })?;
    let config = parse_config(&contents)?;

    if config.prefixes.is_empty() {
        return Err(Error::Config {
            message: "At least one default prefix must be configured".to_string(),
        });
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_partial_config_keeps_defaults() {
        let toml_str = r#"
            default_language = "en_US"

            [log_channels]
            errors = 822644820170113057

            [flags]
            developers = [1, 2]
        "#;

        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.default_language, "en_US");
        assert_eq!(config.prefixes, vec!["k.", "kaibot "]);
        assert_eq!(config.main_color, 0x00FF_6EFF);
        assert_eq!(config.log_channels.errors, Some(822_644_820_170_113_057));
        assert!(config.log_channels.commands.is_none());
        assert_eq!(config.flags.badges_for(2), vec![Badge::Developer]);
    }

    #[test]
    fn test_badges_keep_display_order() {
        let flags = UserFlags {
            developers: vec![7],
            translators: vec![7],
            vips: vec![7, 8],
        };
        assert_eq!(
            flags.badges_for(7),
            vec![Badge::Developer, Badge::Translator, Badge::Vip]
        );
        assert_eq!(flags.badges_for(8), vec![Badge::Vip]);
        assert!(flags.badges_for(9).is_empty());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let result = parse_config("prefixes = 3");
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = load_config("definitely/not/here/config.toml").unwrap();
        assert_eq!(config.default_language, "pt_BR");
    }

    #[test]
    fn test_sample_config_parses() {
        let config = parse_config(include_str!("../../config.toml")).unwrap();
        assert_eq!(config.main_color, 0x00FF_6EFF);
        assert!(config.log_channels.guilds.is_none());
    }
}
