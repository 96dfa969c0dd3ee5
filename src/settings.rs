//! Last-used language pair.

use crate::error::StorageError;
use crate::languages::{AUTO_DETECT, DEFAULT_TARGET};
use crate::store::{keys, KeyValueStore};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Source and target selector values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageSelection {
    /// Language code or [`AUTO_DETECT`]
    pub source: String,
    pub target: String,
}

impl LanguageSelection {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// Swap source and target.
    ///
    /// Auto-detect cannot become a target, so in that case the old target
    /// becomes the source and the target falls back to [`DEFAULT_TARGET`].
    pub fn swapped(&self) -> Self {
        if self.source == AUTO_DETECT {
            Self::new(self.target.clone(), DEFAULT_TARGET)
        } else {
            Self::new(self.target.clone(), self.source.clone())
        }
    }
}

impl Default for LanguageSelection {
    fn default() -> Self {
        Self::new(AUTO_DETECT, DEFAULT_TARGET)
    }
}

pub struct SettingsStore {
    store: Arc<dyn KeyValueStore>,
}

impl SettingsStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Persist both codes in a single write.
    pub async fn save_last_pair(&self, selection: &LanguageSelection) -> Result<(), StorageError> {
        let mut values = Map::new();
        values.insert(
            keys::LAST_SOURCE.to_string(),
            Value::String(selection.source.clone()),
        );
        values.insert(
            keys::LAST_TARGET.to_string(),
            Value::String(selection.target.clone()),
        );
        self.store.set(values).await
    }

    /// Apply any stored codes over `defaults`. Empty or missing values keep the default.
    pub async fn load_last_pair(
        &self,
        defaults: LanguageSelection,
    ) -> Result<LanguageSelection, StorageError> {
        let values = self
            .store
            .get(&[keys::LAST_SOURCE, keys::LAST_TARGET])
            .await?;

        let pick = |key: &str, fallback: String| {
            values
                .get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .unwrap_or(fallback)
        };

        Ok(LanguageSelection {
            source: pick(keys::LAST_SOURCE, defaults.source),
            target: pick(keys::LAST_TARGET, defaults.target),
        })
    }
}
