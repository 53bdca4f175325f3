//! Conversation store: per-user transcripts kept in a remote key-value database.

pub mod errors;
pub mod firebase;
pub mod locks;
pub mod memory;
pub mod transcript;

use std::future::Future;
use std::pin::Pin;

pub use errors::{StoreError, StoreResult};
pub use firebase::FirebaseStore;
pub use locks::ConversationLocks;
pub use memory::MemoryStore;
pub use transcript::{Transcript, Turn, TurnRole};

/// Boxed future type for store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Transcript storage keyed by user identifier.
///
/// Records are read and written wholesale; there is no merge and no
/// concurrency control. Callers serialize per key with [`ConversationLocks`].
pub trait ConversationStore: Send + Sync {
    /// Load the transcript for `user_id`.
    ///
    /// A missing record yields an empty transcript.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn load<'a>(&'a self, user_id: &'a str) -> StoreFuture<'a, StoreResult<Transcript>>;

    /// Overwrite the transcript for `user_id`.
    ///
    /// # Errors
    /// Returns an error if storage access fails.
    fn save<'a>(
        &'a self,
        user_id: &'a str,
        transcript: &'a Transcript,
    ) -> StoreFuture<'a, StoreResult<()>>;
}

/// Characters the Realtime Database refuses in path segments.
const FORBIDDEN_KEY_CHARS: [char; 6] = ['.', '#', '$', '[', ']', '/'];

/// Check that `user_id` is usable as a single path segment.
///
/// # Errors
/// Returns [`StoreError::InvalidKey`] for empty keys or forbidden characters.
pub fn validate_key(user_id: &str) -> StoreResult<()> {
    if user_id.is_empty() || user_id.contains(FORBIDDEN_KEY_CHARS) {
        return Err(StoreError::InvalidKey(user_id.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        assert!(validate_key("15551234567").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("a/b").is_err());
        assert!(validate_key("user.name").is_err());
        assert!(validate_key("x[0]").is_err());
    }
}
