//! Command line arguments.

use crate::errors::{Error, Result};
use clap::Parser;
use std::path::PathBuf;

/// KaiBOT, a multipurpose Discord bot
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Args {
    /// Run with the given token instead of `DISCORD_TOKEN`
    #[arg(short, long)]
    pub token: Option<String>,

    /// Path to config.toml
    #[arg(long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Directory for log files
    #[arg(long, default_value = "logs")]
    pub log_dir: PathBuf,
}

impl Args {
    /// Resolves the bot token from the flag or the environment.
    pub fn resolve_token(&self) -> Result<String> {
        if let Some(token) = self.token.as_ref().filter(|t| !t.trim().is_empty()) {
            return Ok(token.clone());
        }
        std::env::var("DISCORD_TOKEN").map_err(|_| Error::Config {
            message: "Token must be set with --token or the DISCORD_TOKEN env.".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_token_flag_wins() {
        let args = Args::parse_from(["kaibot", "-t", "abc"]);
        assert_eq!(args.resolve_token().unwrap(), "abc");
        assert_eq!(args.config, PathBuf::from("config.toml"));
    }

    #[test]
    fn test_custom_paths() {
        let args = Args::parse_from(["kaibot", "--config", "a.toml", "--log-dir", "out"]);
        assert!(args.token.is_none());
        assert_eq!(args.config, PathBuf::from("a.toml"));
        assert_eq!(args.log_dir, PathBuf::from("out"));
    }
}
