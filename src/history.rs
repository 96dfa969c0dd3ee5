//! Translation history: the most recent translations, newest first.
//!
//! The list is bounded to [`MAX_HISTORY`] entries and never holds two records
//! with the same `(original, target)` pair.

use crate::error::StorageError;
use crate::languages::display_name;
use crate::store::{keys, read_key, write_key, KeyValueStore};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Maximum number of records kept in the history.
pub const MAX_HISTORY: usize = 20;

/// One completed translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRecord {
    pub original: String,
    pub translated: String,
    /// Language code, or the provider's auto-detect sentinel
    pub source: String,
    pub target: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl TranslationRecord {
    /// Create a record stamped with the current time.
    pub fn new(
        original: impl Into<String>,
        translated: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            original: original.into(),
            translated: translated.into(),
            source: source.into(),
            target: target.into(),
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    /// Whether `other` collides with this record on the dedup key.
    pub fn same_key(&self, other: &TranslationRecord) -> bool {
        self.original == other.original && self.target == other.target
    }
}

/// A history record prepared for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntryView {
    /// "<source name> → <target name>"
    pub languages: String,
    pub original: String,
    pub translated: String,
    pub timestamp: i64,
}

impl From<&TranslationRecord> for HistoryEntryView {
    fn from(record: &TranslationRecord) -> Self {
        Self {
            languages: format!(
                "{} → {}",
                display_name(&record.source),
                display_name(&record.target)
            ),
            original: record.original.clone(),
            translated: record.translated.clone(),
            timestamp: record.timestamp,
        }
    }
}

/// Insert `record` at the front of `history`.
///
/// Returns `false` (leaving `history` untouched) when a record with the same
/// `(original, target)` already exists. Evicts from the back past
/// [`MAX_HISTORY`].
pub fn insert_record(history: &mut Vec<TranslationRecord>, record: TranslationRecord) -> bool {
    if history.iter().any(|existing| existing.same_key(&record)) {
        return false;
    }
    history.insert(0, record);
    history.truncate(MAX_HISTORY);
    true
}

/// History backed by the persistent store.
///
/// Read-modify-write cycles are serialized through an internal lock so two
/// concurrent `record` calls can never overwrite each other.
pub struct HistoryManager {
    store: Arc<dyn KeyValueStore>,
    write_lock: Mutex<()>,
}

impl HistoryManager {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Load the stored history; a missing key is an empty history.
    pub async fn load(&self) -> Result<Vec<TranslationRecord>, StorageError> {
        Ok(read_key(self.store.as_ref(), keys::HISTORY)
            .await?
            .unwrap_or_default())
    }

    /// Record a translation. Returns whether the history changed.
    pub async fn record(&self, record: TranslationRecord) -> Result<bool, StorageError> {
        let _guard = self.write_lock.lock().await;

        let mut history = self.load().await?;
        if !insert_record(&mut history, record) {
            debug!("Duplicate history entry skipped");
            return Ok(false);
        }

        write_key(self.store.as_ref(), keys::HISTORY, &history).await?;
        debug!("History now holds {} entries", history.len());
        Ok(true)
    }

    /// Remove every record.
    pub async fn clear(&self) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        write_key(self.store.as_ref(), keys::HISTORY, &Vec::<TranslationRecord>::new()).await?;
        info!("History cleared");
        Ok(())
    }

    /// Load the history as display rows.
    pub async fn view(&self) -> Result<Vec<HistoryEntryView>, StorageError> {
        Ok(self.load().await?.iter().map(HistoryEntryView::from).collect())
    }
}
