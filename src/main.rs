use clap::Parser;
use dotenvy::dotenv;
use kaibot::{
    bot::{BotData, run_bot},
    config::{
        cli::Args,
        database::{create_connection, create_tables},
        load_config,
        logging::init_logging,
    },
    core::{i18n::Catalogs, redirects, settings::SettingsStore},
    errors::Result,
};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 1. Initialize tracing; the guard flushes the log file on exit
    let _log_guard = init_logging(&args.log_dir)?;

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load the application configuration
    let config = load_config(&args.config)
        .inspect_err(|e| error!("Failed to load configuration: {e}"))?;
    info!("Loaded configuration from {}", args.config.display());

    // 4. Connect to the database and make sure the tables exist
    let db = create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    create_tables(&db).await?;
    info!("Database initialized successfully.");

    // 5. Message catalogs and the link resolver client
    let catalogs = Catalogs::bundled(&config.default_language)?;
    info!("Loaded languages: {}", catalogs.languages().join(", "));
    let http_client = redirects::client()?;

    // 6. Run the bot
    let token = args
        .resolve_token()
        .inspect_err(|e| error!("{e}"))?;
    let data = BotData::new(
        SettingsStore::new(db),
        Arc::new(config),
        Arc::new(catalogs),
        http_client,
    );
    run_bot(token, data).await
}
