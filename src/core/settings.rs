//! Per-guild settings store.
//!
//! Guild documents (custom prefixes and language) live in the `guild_settings`
//! table and are read through an LRU cache. Lookups that find nothing are
//! cached too, so guilds that never configured anything cost one query.

use crate::{
    core::lru::LruCache,
    entities::{GuildSettings as GuildSettingsEntity, guild_settings},
    errors::{Error, PrefixRejection, Result},
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QuerySelect, Set};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Number of guild documents kept in memory
pub const CACHE_CAPACITY: usize = 500;
/// Maximum number of custom prefixes per guild
pub const MAX_PREFIXES: usize = 3;
/// Maximum length of a custom prefix, in characters
pub const MAX_PREFIX_LEN: usize = 5;

/// A guild's settings document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildSettings {
    /// Discord guild ID
    pub guild_id: u64,
    /// Custom prefixes; empty means the configured defaults apply
    pub prefixes: Vec<String>,
    /// Language tag; None means the default language
    pub language: Option<String>,
}

impl GuildSettings {
    /// The template every new document starts from.
    #[must_use]
    pub const fn template(guild_id: u64) -> Self {
        Self {
            guild_id,
            prefixes: Vec::new(),
            language: None,
        }
    }

    fn from_model(model: guild_settings::Model) -> Result<Self> {
        let guild_id = model.id.parse::<u64>().map_err(|e| Error::CorruptedSettings {
            guild_id: 0,
            message: format!("invalid id {:?}: {e}", model.id),
        })?;
        let prefixes = if model.prefixes.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(&model.prefixes).map_err(|e| Error::CorruptedSettings {
                guild_id,
                message: e.to_string(),
            })?
        };

        Ok(Self {
            guild_id,
            prefixes,
            language: model.language,
        })
    }
}

/// Checks a prefix against the rules that do not depend on stored state.
pub fn validate_prefix(prefix: &str) -> Result<()> {
    let reject = |reason| {
        Err(Error::InvalidPrefix {
            prefix: prefix.to_string(),
            reason,
        })
    };

    if prefix.trim().is_empty()
        || prefix.starts_with('/')
        || prefix.starts_with('@')
        || prefix.starts_with("<@")
    {
        return reject(PrefixRejection::Reserved);
    }
    if prefix.chars().count() > MAX_PREFIX_LEN {
        return reject(PrefixRejection::TooLong);
    }
    Ok(())
}

/// Cache-aside access to guild documents.
#[derive(Debug)]
pub struct SettingsStore {
    db: DatabaseConnection,
    cache: Mutex<LruCache<u64, Option<GuildSettings>>>,
    /// Held from read to write by the read-modify-write operations
    writes: Mutex<()>,
}

impl SettingsStore {
    /// Creates a store over an initialised database.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_capacity(db, CACHE_CAPACITY)
    }

    /// Creates a store with a custom cache size.
    #[must_use]
    pub fn with_capacity(db: DatabaseConnection, capacity: usize) -> Self {
        Self {
            db,
            cache: Mutex::new(LruCache::new(capacity)),
            writes: Mutex::new(()),
        }
    }

    /// Finds a guild's document, consulting the cache first.
    pub async fn find(&self, guild_id: u64) -> Result<Option<GuildSettings>> {
        if let Some(cached) = self.cache.lock().await.get(&guild_id) {
            return Ok(cached.clone());
        }

        let model = GuildSettingsEntity::find_by_id(guild_id.to_string())
            .one(&self.db)
            .await?;
        let settings = model.map(GuildSettings::from_model).transpose()?;

        debug!(guild_id, found = settings.is_some(), "Loaded guild settings");
        self.cache.lock().await.insert(guild_id, settings.clone());
        Ok(settings)
    }

    /// Inserts a new document built from the template.
    pub async fn create(&self, guild_id: u64) -> Result<GuildSettings> {
        let settings = GuildSettings::template(guild_id);
        let model = guild_settings::ActiveModel {
            id: Set(guild_id.to_string()),
            prefixes: Set(serde_json::to_string(&settings.prefixes)?),
            language: Set(settings.language.clone()),
            updated_at: Set(chrono::Utc::now()),
        };
        model.insert(&self.db).await?;

        info!(guild_id, "Created guild settings");
        self.cache.lock().await.insert(guild_id, Some(settings.clone()));
        Ok(settings)
    }

    /// Writes the whole document, creating it when missing.
    pub async fn update(&self, settings: GuildSettings) -> Result<GuildSettings> {
        let id = settings.guild_id.to_string();
        let exists = GuildSettingsEntity::find_by_id(id.clone())
            .one(&self.db)
            .await?
            .is_some();

        let model = guild_settings::ActiveModel {
            id: Set(id),
            prefixes: Set(serde_json::to_string(&settings.prefixes)?),
            language: Set(settings.language.clone()),
            updated_at: Set(chrono::Utc::now()),
        };
        if exists {
            model.update(&self.db).await?;
        } else {
            model.insert(&self.db).await?;
        }

        debug!(guild_id = settings.guild_id, "Updated guild settings");
        self.cache
            .lock()
            .await
            .insert(settings.guild_id, Some(settings.clone()));
        Ok(settings)
    }

    /// Deletes a guild's document and evicts it from the cache.
    pub async fn delete(&self, guild_id: u64) -> Result<bool> {
        let result = GuildSettingsEntity::delete_by_id(guild_id.to_string())
            .exec(&self.db)
            .await?;
        self.cache.lock().await.remove(&guild_id);

        info!(guild_id, "Deleted guild settings");
        Ok(result.rows_affected > 0)
    }

    /// Every stored document, bypassing the cache.
    pub async fn all(&self) -> Result<Vec<GuildSettings>> {
        GuildSettingsEntity::find()
            .all(&self.db)
            .await?
            .into_iter()
            .map(GuildSettings::from_model)
            .collect()
    }

    /// Measures a trivial round trip to the database.
    pub async fn ping(&self) -> Result<Duration> {
        let start = Instant::now();
        GuildSettingsEntity::find().limit(1).all(&self.db).await?;
        Ok(start.elapsed())
    }

    /// The guild's custom prefixes, or `defaults` when it has none.
    pub async fn prefixes_for(&self, guild_id: u64, defaults: &[String]) -> Result<Vec<String>> {
        Ok(match self.find(guild_id).await? {
            Some(settings) if !settings.prefixes.is_empty() => settings.prefixes,
            _ => defaults.to_vec(),
        })
    }

    /// The guild's stored language, if any.
    pub async fn language_for(&self, guild_id: u64) -> Result<Option<String>> {
        Ok(self.find(guild_id).await?.and_then(|s| s.language))
    }

    /// Stores the guild's language; the default language is stored as None.
    pub async fn set_language(
        &self,
        guild_id: u64,
        language: &str,
        default_language: &str,
    ) -> Result<GuildSettings> {
        let _writing = self.writes.lock().await;
        let mut settings = self.find_or_template(guild_id).await?;
        settings.language = (language != default_language).then(|| language.to_string());
        self.update(settings).await
    }

    /// Adds a custom prefix after checking every prefix rule.
    pub async fn add_prefix(&self, guild_id: u64, prefix: &str) -> Result<GuildSettings> {
        validate_prefix(prefix)?;

        let _writing = self.writes.lock().await;
        let mut settings = self.find_or_template(guild_id).await?;
        let reject = |reason| Error::InvalidPrefix {
            prefix: prefix.to_string(),
            reason,
        };
        if settings.prefixes.len() >= MAX_PREFIXES {
            return Err(reject(PrefixRejection::LimitReached));
        }
        if settings.prefixes.iter().any(|p| p == prefix) {
            return Err(reject(PrefixRejection::Duplicate));
        }

        settings.prefixes.push(prefix.to_string());
        self.update(settings).await
    }

    /// Removes a custom prefix; removing the last one restores the defaults.
    pub async fn remove_prefix(&self, guild_id: u64, prefix: &str) -> Result<GuildSettings> {
        let not_in_use = || Error::InvalidPrefix {
            prefix: prefix.to_string(),
            reason: PrefixRejection::NotInUse,
        };

        let _writing = self.writes.lock().await;
        let mut settings = self.find(guild_id).await?.ok_or_else(not_in_use)?;
        let index = settings
            .prefixes
            .iter()
            .position(|p| p == prefix)
            .ok_or_else(not_in_use)?;

        settings.prefixes.remove(index);
        self.update(settings).await
    }

    async fn find_or_template(&self, guild_id: u64) -> Result<GuildSettings> {
        Ok(self
            .find(guild_id)
            .await?
            .unwrap_or_else(|| GuildSettings::template(guild_id)))
    }

    #[cfg(test)]
    pub(crate) async fn is_cached(&self, guild_id: u64) -> bool {
        self.cache.lock().await.peek(&guild_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::{setup_test_store, setup_test_store_with_capacity};

    const GUILD: u64 = 842_229_415_223_623_682;

    #[test]
    fn test_validate_prefix_rules() {
        assert!(validate_prefix("k.").is_ok());
        assert!(validate_prefix("ééééé").is_ok());

        for reserved in ["", "   ", "/", "@bot", "<@123>"] {
            assert!(matches!(
                validate_prefix(reserved),
                Err(Error::InvalidPrefix {
                    reason: PrefixRejection::Reserved,
                    ..
                })
            ));
        }
        assert!(matches!(
            validate_prefix("toolong"),
            Err(Error::InvalidPrefix {
                reason: PrefixRejection::TooLong,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_find_missing_caches_absence() -> Result<()> {
        let store = setup_test_store().await?;

        assert!(store.find(GUILD).await?.is_none());
        assert!(store.is_cached(GUILD).await);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_then_find() -> Result<()> {
        let store = setup_test_store().await?;

        let created = store.create(GUILD).await?;
        assert_eq!(created, GuildSettings::template(GUILD));

        let found = store.find(GUILD).await?.unwrap();
        assert_eq!(found, created);
        assert_eq!(store.all().await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_prefix_changes_are_all_kept() -> Result<()> {
        let store = setup_test_store().await?;

        let (first, second) = tokio::join!(
            store.add_prefix(GUILD, "!"),
            store.add_prefix(GUILD, "?")
        );
        first?;
        second?;
        let (language, removed) = tokio::join!(
            store.set_language(GUILD, "en_US", "pt_BR"),
            store.remove_prefix(GUILD, "!")
        );
        language?;
        removed?;

        let cached = store.find(GUILD).await?.unwrap();
        assert_eq!(cached.prefixes, vec!["?".to_string()]);
        assert_eq!(cached.language.as_deref(), Some("en_US"));
        let stored = store.all().await?;
        assert_eq!(stored, vec![cached]);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_replaces_cached_absence() -> Result<()> {
        let store = setup_test_store().await?;
        assert!(store.find(GUILD).await?.is_none());

        let mut settings = GuildSettings::template(GUILD);
        settings.language = Some("en_US".to_string());
        store.update(settings.clone()).await?;

        assert_eq!(store.find(GUILD).await?, Some(settings));
        Ok(())
    }

    #[tokio::test]
    async fn test_evicted_document_reloads_from_database() -> Result<()> {
        let store = setup_test_store_with_capacity(1).await?;
        store.set_language(1, "en_US", "pt_BR").await?;
        store.set_language(2, "en_US", "pt_BR").await?;

        assert!(!store.is_cached(1).await);
        let reloaded = store.find(1).await?.unwrap();
        assert_eq!(reloaded.language.as_deref(), Some("en_US"));
        assert!(store.is_cached(1).await);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_evicts() -> Result<()> {
        let store = setup_test_store().await?;
        store.create(GUILD).await?;

        assert!(store.delete(GUILD).await?);
        assert!(!store.is_cached(GUILD).await);
        assert!(store.find(GUILD).await?.is_none());
        assert!(!store.delete(GUILD).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_default_language_is_stored_as_none() -> Result<()> {
        let store = setup_test_store().await?;

        let settings = store.set_language(GUILD, "en_US", "pt_BR").await?;
        assert_eq!(settings.language.as_deref(), Some("en_US"));

        let settings = store.set_language(GUILD, "pt_BR", "pt_BR").await?;
        assert!(settings.language.is_none());
        assert!(store.language_for(GUILD).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_prefix_limits() -> Result<()> {
        let store = setup_test_store().await?;

        store.add_prefix(GUILD, "!").await?;
        store.add_prefix(GUILD, "?").await?;

        let duplicate = store.add_prefix(GUILD, "!").await;
        assert!(matches!(
            duplicate,
            Err(Error::InvalidPrefix {
                reason: PrefixRejection::Duplicate,
                ..
            })
        ));

        store.add_prefix(GUILD, "k!").await?;
        let fourth = store.add_prefix(GUILD, "$").await;
        assert!(matches!(
            fourth,
            Err(Error::InvalidPrefix {
                reason: PrefixRejection::LimitReached,
                ..
            })
        ));

        let defaults = vec!["k.".to_string()];
        assert_eq!(
            store.prefixes_for(GUILD, &defaults).await?,
            vec!["!", "?", "k!"]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_removing_last_prefix_restores_defaults() -> Result<()> {
        let store = setup_test_store().await?;
        let defaults = vec!["k.".to_string(), "kaibot ".to_string()];

        store.add_prefix(GUILD, "!").await?;
        assert_eq!(store.prefixes_for(GUILD, &defaults).await?, vec!["!"]);

        store.remove_prefix(GUILD, "!").await?;
        assert_eq!(store.prefixes_for(GUILD, &defaults).await?, defaults);

        let missing = store.remove_prefix(GUILD, "!").await;
        assert!(matches!(
            missing,
            Err(Error::InvalidPrefix {
                reason: PrefixRejection::NotInUse,
                ..
            })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_ping() -> Result<()> {
        let store = setup_test_store().await?;
        let elapsed = store.ping().await?;
        assert!(elapsed < Duration::from_secs(5));
        Ok(())
    }
}
