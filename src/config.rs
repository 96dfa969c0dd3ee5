use crate::client::DEFAULT_ENDPOINT;
use anyhow::{Context, Result};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    // Translation provider
    pub translate_api_url: String,

    // Persistence
    pub store_path: String,

    // Web server
    pub port: u16,

    // Popup behaviour
    pub auto_translate_delay_ms: u64,
    pub system_locale: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let port = match std::env::var("PORT") {
            Ok(value) => value
                .parse()
                .with_context(|| format!("PORT is not a valid port number: {}", value))?,
            Err(_) => 8080,
        };

        Ok(Self {
            // Translation provider
            translate_api_url: std::env::var("TRANSLATE_API_URL")
                .unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string()),

            // Persistence
            store_path: std::env::var("STORE_PATH")
                .unwrap_or_else(|_| "data/store.json".to_string()),

            // Web server
            port,

            // Popup behaviour
            auto_translate_delay_ms: std::env::var("AUTO_TRANSLATE_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(500),
            system_locale: std::env::var("SYSTEM_LOCALE")
                .ok()
                .or_else(|| std::env::var("LANG").ok().and_then(|lang| locale_from_lang(&lang)))
                .filter(|locale| !locale.is_empty()),
        })
    }

    pub fn auto_translate_delay(&self) -> Duration {
        Duration::from_millis(self.auto_translate_delay_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            translate_api_url: DEFAULT_ENDPOINT.to_string(),
            store_path: "data/store.json".to_string(),
            port: 8080,
            auto_translate_delay_ms: 500,
            system_locale: None,
        }
    }
}

/// Convert a POSIX `LANG` value ("pt_BR.UTF-8") into a language tag ("pt-BR").
fn locale_from_lang(lang: &str) -> Option<String> {
    let tag = lang.split(['.', '@']).next().unwrap_or_default();
    if tag.is_empty() || tag == "C" || tag == "POSIX" {
        return None;
    }
    Some(tag.replace('_', "-"))
}
