//! Shared test utilities for `KaiBot`.
//!
//! Helpers for setting up in-memory databases, settings stores and
//! translators with sensible defaults.

use crate::{
    config::AppConfig,
    core::{
        i18n::{Catalogs, Translator},
        settings::SettingsStore,
    },
    errors::Result,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Creates an in-memory `SQLite` database with all tables initialized.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a settings store over a fresh in-memory database.
pub async fn setup_test_store() -> Result<SettingsStore> {
    Ok(SettingsStore::new(setup_test_db().await?))
}

/// Creates a settings store with a custom cache capacity.
pub async fn setup_test_store_with_capacity(capacity: usize) -> Result<SettingsStore> {
    Ok(SettingsStore::with_capacity(setup_test_db().await?, capacity))
}

/// Loads the bundled catalogs with the default configuration.
pub fn test_catalogs() -> Arc<Catalogs> {
    #[allow(clippy::expect_used)]
    let catalogs = Catalogs::bundled(&AppConfig::default().default_language)
        .expect("bundled catalogs must parse");
    Arc::new(catalogs)
}

/// Creates a translator for `language` over the bundled catalogs.
pub fn test_translator(language: &str) -> Translator {
    Translator::new(test_catalogs(), language)
}
