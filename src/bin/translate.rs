//! One-shot translation from the command line, sharing the popup's store.
//!
//! Usage:
//!   cargo run --bin translate -- "Hello world" pt-BR         # auto-detect source
//!   cargo run --bin translate -- "Hello world" pt-BR en-US   # explicit source
//!   cargo run --bin translate -- --history                   # print history
//!   cargo run --bin translate -- --clear-history
//!
//! Optional environment variables:
//! - TRANSLATE_API_URL (defaults to the MyMemory endpoint)
//! - STORE_PATH (defaults to data/store.json)

use anyhow::{bail, Result};
use popup_translator::{
    client::TranslationClient,
    config::Config,
    languages::AUTO_DETECT,
    session::{Session, SessionOptions},
    settings::LanguageSelection,
    store::JsonFileStore,
};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("popup_translator=warn".parse()?),
        )
        .init();

    let config = Config::from_env()?;
    let store = Arc::new(JsonFileStore::new(&config.store_path));
    let client = TranslationClient::new(config.translate_api_url.clone());
    let session = Session::open(client, store, SessionOptions::from(&config)).await;

    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|arg| arg == "--clear-history") {
        session.clear_history().await?;
        println!("History cleared.");
        return Ok(());
    }

    if args.iter().any(|arg| arg == "--history") {
        let entries = session.history_view().await?;
        if entries.is_empty() {
            println!("No history yet.");
        }
        for entry in entries {
            println!("{}\n  {}\n  {}", entry.languages, entry.original, entry.translated);
        }
        return Ok(());
    }

    let (text, target, source) = match args.as_slice() {
        [text, target] => (text, target.as_str(), AUTO_DETECT),
        [text, target, source] => (text, target.as_str(), source.as_str()),
        _ => bail!("Usage: translate <text> <target> [source] | --history | --clear-history"),
    };

    session.select_languages(LanguageSelection::new(source, target));
    session.set_source_text(text.as_str());

    match session.translate_current().await {
        Ok(outcome) => {
            info!("Detected source: {}", outcome.detected_source);
            println!("{}", outcome.translated_text);
            if outcome.show_review_prompt {
                println!("\nEnjoying the translator? Consider leaving a review.");
            }
            Ok(())
        }
        Err(e) => match e.user_message() {
            Some(message) => bail!(message),
            None => Ok(()),
        },
    }
}
