//! Bot layer - Discord-specific interface and command handlers
//!
//! This module provides the Discord interface for `KaiBot`: the command
//! groups, the framework wiring and the gateway event handlers, plus the
//! shared state every command can reach.

/// Discord command implementations grouped by help category
pub mod commands;
/// Framework construction and client start-up
pub mod framework;
/// Error, event and prefix handlers
pub mod handlers;
/// Button-driven embed paginator
pub mod pagination;

use crate::{
    config::AppConfig,
    core::{
        i18n::{Catalogs, Translator},
        settings::SettingsStore,
        tictactoe::ActivePlayers,
    },
    errors::Error,
};
use poise::serenity_prelude as serenity;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Instant;
use tracing::warn;

/// Poise context used by every command.
pub type Context<'a> = poise::Context<'a, BotData, Error>;

/// Shared data available to all bot commands.
/// This structure holds the settings store, configuration and catalogs, and
/// the state shared between games.
pub struct BotData {
    /// Per-guild prefixes and language
    pub settings: SettingsStore,
    /// Parsed config.toml
    pub config: Arc<AppConfig>,
    /// Message catalogs for every language
    pub catalogs: Arc<Catalogs>,
    /// Members currently playing tic-tac-toe
    pub games: ActivePlayers,
    /// Client used to resolve links; never follows redirects itself
    pub http_client: reqwest::Client,
    /// Set by the first ready event
    pub started_at: OnceLock<Instant>,
    /// Process statistics for `botinfo`; kept so CPU usage has a baseline
    pub system_info: Mutex<sysinfo::System>,
}

impl BotData {
    /// Creates a new `BotData` instance.
    /// This is typically called during bot initialization to set up the
    /// shared context for all commands.
    #[must_use]
    pub fn new(
        settings: SettingsStore,
        config: Arc<AppConfig>,
        catalogs: Arc<Catalogs>,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            settings,
            config,
            catalogs,
            games: ActivePlayers::default(),
            http_client,
            started_at: OnceLock::new(),
            system_info: Mutex::new(sysinfo::System::new()),
        }
    }

    /// Translator for a guild; DMs and guilds without a language use the default.
    ///
    /// A failing settings lookup is logged and falls back to the default
    /// language so replies still go out.
    pub async fn translator_for(&self, guild_id: Option<serenity::GuildId>) -> Translator {
        let language = match guild_id {
            Some(guild_id) => match self.settings.language_for(guild_id.get()).await {
                Ok(language) => language,
                Err(e) => {
                    warn!("Failed to load language for guild {guild_id}: {e}");
                    None
                }
            },
            None => None,
        };

        let language = language.unwrap_or_else(|| self.catalogs.default_language().to_string());
        Translator::new(Arc::clone(&self.catalogs), &language)
    }

    /// An embed with the bot's colour.
    #[must_use]
    pub fn embed(&self) -> serenity::CreateEmbed {
        serenity::CreateEmbed::new().colour(self.config.main_color)
    }
}

/// Translator for the guild (or DM) a command runs in.
pub async fn translator(ctx: Context<'_>) -> Translator {
    ctx.data().translator_for(ctx.guild_id()).await
}

/// Embed author line carrying the bot's avatar.
pub fn bot_author(ctx: Context<'_>, name: impl Into<String>) -> serenity::CreateEmbedAuthor {
    let avatar = ctx.cache().current_user().face();
    serenity::CreateEmbedAuthor::new(name).icon_url(avatar)
}

pub use commands::*;
pub use framework::run_bot;
