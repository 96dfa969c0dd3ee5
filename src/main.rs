use anyhow::Result;
use popup_translator::{
    client::TranslationClient,
    config::Config,
    server,
    session::{Session, SessionOptions},
    store::JsonFileStore,
};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored when absent)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("popup_translator=info".parse()?),
        )
        .init();

    info!("Starting popup translator");

    let config = Config::from_env()?;
    info!("Using store at {}", config.store_path);

    let store = Arc::new(JsonFileStore::new(&config.store_path));
    let client = TranslationClient::new(config.translate_api_url.clone());
    let session = Arc::new(Session::open(client, store, SessionOptions::from(&config)).await);

    server::serve(&config, session).await
}
