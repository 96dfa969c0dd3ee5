//! Engagement counter: decides when to ask the user for a review.

use crate::error::StorageError;
use crate::store::{keys, write_key, KeyValueStore};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// Number of successful translations at which the review prompt appears.
pub const REVIEW_PROMPT_AT: u32 = 5;

pub struct EngagementCounter {
    store: Arc<dyn KeyValueStore>,
}

impl EngagementCounter {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Count one successful translation.
    ///
    /// Returns `true` only when the count lands exactly on
    /// [`REVIEW_PROMPT_AT`]. A count that skips past it never fires later.
    pub async fn record_success(&self) -> Result<bool, StorageError> {
        let values = self
            .store
            .get(&[keys::TRANSLATION_COUNT, keys::HAS_REVIEWED])
            .await?;

        if values
            .get(keys::HAS_REVIEWED)
            .and_then(Value::as_bool)
            .unwrap_or(false)
        {
            return Ok(false);
        }

        let count = stored_count(&values).saturating_add(1);

        write_key(self.store.as_ref(), keys::TRANSLATION_COUNT, &count).await?;
        debug!("Translation count is now {}", count);

        let prompt = count == REVIEW_PROMPT_AT;
        if prompt {
            info!("Review prompt threshold reached");
        }
        Ok(prompt)
    }

    /// Remember that the user rated or dismissed the prompt.
    pub async fn mark_reviewed(&self) -> Result<(), StorageError> {
        write_key(self.store.as_ref(), keys::HAS_REVIEWED, &true).await
    }

    pub async fn count(&self) -> Result<u32, StorageError> {
        let values = self.store.get(&[keys::TRANSLATION_COUNT]).await?;
        Ok(stored_count(&values))
    }
}

/// Stored count, clamped to `u32`. Missing or non-numeric values count as zero.
fn stored_count(values: &Map<String, Value>) -> u32 {
    values
        .get(keys::TRANSLATION_COUNT)
        .and_then(Value::as_u64)
        .map(|c| c.min(u32::MAX as u64) as u32)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn counter() -> (Arc<MemoryStore>, EngagementCounter) {
        let store = Arc::new(MemoryStore::new());
        let counter = EngagementCounter::new(store.clone());
        (store, counter)
    }

    #[tokio::test]
    async fn test_prompt_fires_on_fifth_success_only() {
        let (_store, counter) = counter();

        let mut signals = Vec::new();
        for _ in 0..8 {
            signals.push(counter.record_success().await.unwrap());
        }

        assert_eq!(
            signals,
            vec![false, false, false, false, true, false, false, false]
        );
        assert_eq!(counter.count().await.unwrap(), 8);
    }

    #[tokio::test]
    async fn test_mark_reviewed_freezes_counter() {
        let (_store, counter) = counter();
        counter.record_success().await.unwrap();
        counter.record_success().await.unwrap();
        counter.mark_reviewed().await.unwrap();

        for _ in 0..10 {
            assert!(!counter.record_success().await.unwrap());
        }
        assert_eq!(counter.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_count_already_past_threshold_never_fires() {
        let (store, counter) = counter();
        write_key(store.as_ref(), keys::TRANSLATION_COUNT, &7u32)
            .await
            .unwrap();

        for _ in 0..5 {
            assert!(!counter.record_success().await.unwrap());
        }
        assert_eq!(counter.count().await.unwrap(), 12);
    }

    #[tokio::test]
    async fn test_resumes_from_stored_count() {
        let (store, counter) = counter();
        write_key(store.as_ref(), keys::TRANSLATION_COUNT, &4u32)
            .await
            .unwrap();

        assert!(counter.record_success().await.unwrap());
    }

    #[tokio::test]
    async fn test_oversized_stored_count_is_clamped() {
        let (store, counter) = counter();
        write_key(store.as_ref(), keys::TRANSLATION_COUNT, &(u32::MAX as u64 + 5))
            .await
            .unwrap();

        assert_eq!(counter.count().await.unwrap(), u32::MAX);
        assert!(!counter.record_success().await.unwrap());
        assert_eq!(counter.count().await.unwrap(), u32::MAX);
    }

    #[tokio::test]
    async fn test_storage_unavailable() {
        let (store, counter) = counter();
        store.set_available(false);

        assert!(matches!(
            counter.record_success().await,
            Err(StorageError::Unavailable(_))
        ));
    }
}
