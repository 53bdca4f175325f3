//! Process-local transcript store, used when no database is configured.

use dashmap::DashMap;

use super::errors::StoreResult;
use super::transcript::Transcript;
use super::{ConversationStore, StoreFuture, validate_key};

/// In-memory transcript store. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    records: DashMap<String, Transcript>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the stored transcript, if any.
    #[must_use]
    pub fn get(&self, user_id: &str) -> Option<Transcript> {
        self.records.get(user_id).map(|entry| entry.clone())
    }

    /// Number of stored transcripts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ConversationStore for MemoryStore {
    fn load<'a>(&'a self, user_id: &'a str) -> StoreFuture<'a, StoreResult<Transcript>> {
        Box::pin(async move {
            validate_key(user_id)?;
            Ok(self.get(user_id).unwrap_or_default())
        })
    }

    fn save<'a>(
        &'a self,
        user_id: &'a str,
        transcript: &'a Transcript,
    ) -> StoreFuture<'a, StoreResult<()>> {
        Box::pin(async move {
            validate_key(user_id)?;
            self.records.insert(user_id.to_string(), transcript.clone());
            Ok(())
        })
    }
}
