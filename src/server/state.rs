//! Application state shared across all request handlers.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::bot::BulkIntake;
use crate::chat::ChatSession;
use crate::config::AppConfig;

/// Shared application state.
pub struct AppState {
    /// The process-wide WhatsApp session.
    pub session: Arc<ChatSession>,
    /// Bulk outreach over the same session and store.
    pub intake: BulkIntake,
    /// Deadline for the pairing view.
    pub pairing_timeout: Duration,
    /// Where uploads are spooled while decoding.
    pub upload_dir: PathBuf,
    /// Directory served for `/`.
    pub static_dir: PathBuf,
}

impl AppState {
    /// Assemble the state from configuration and wired components.
    #[must_use]
    pub fn new(config: &AppConfig, session: Arc<ChatSession>, intake: BulkIntake) -> Arc<Self> {
        Arc::new(Self {
            session,
            intake,
            pairing_timeout: config.pairing_timeout,
            upload_dir: config.upload_dir.clone(),
            static_dir: config.static_dir.clone(),
        })
    }
}
