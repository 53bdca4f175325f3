//! Reply orchestration for inbound chat messages.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::chat::{ChatError, ChatSession, InboundMessage};
use crate::llm::{CompletionClient, CompletionError};
use crate::store::{ConversationLocks, ConversationStore, StoreError, Turn};

/// Lowercased phrase that ends a conversation.
pub const EXIT_PHRASE: &str = "i don't need your services";
/// Sent in place of a model reply when the contact opts out.
pub const CLOSING_MESSAGE: &str =
    "Thank you for your time. If you change your mind, feel free to reach out!";

/// Failure while answering one inbound message.
#[derive(Debug, Error)]
pub enum ReplyError {
    /// Loading or saving the transcript failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    /// The completion service failed.
    #[error("completion error: {0}")]
    Completion(#[from] CompletionError),
    /// Sending the reply failed.
    #[error("chat error: {0}")]
    Chat(#[from] ChatError),
}

/// How an inbound message was handled.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReplyOutcome {
    /// A model reply was sent and the transcript saved.
    Replied,
    /// The contact opted out; the closing text was sent, nothing saved.
    Closed,
}

/// Whether `text` asks to end the conversation.
#[must_use]
pub fn is_exit_request(text: &str) -> bool {
    text.to_lowercase().contains(EXIT_PHRASE)
}

/// Answers inbound messages from the stored conversation history.
pub struct ReplyOrchestrator {
    store: Arc<dyn ConversationStore>,
    completion: Arc<dyn CompletionClient>,
    session: Arc<ChatSession>,
    locks: Arc<ConversationLocks>,
}

impl ReplyOrchestrator {
    /// Wire an orchestrator over its collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn ConversationStore>,
        completion: Arc<dyn CompletionClient>,
        session: Arc<ChatSession>,
        locks: Arc<ConversationLocks>,
    ) -> Self {
        Self {
            store,
            completion,
            session,
            locks,
        }
    }

    /// Answer one inbound message.
    ///
    /// The transcript for the sender is held under its per-user lock from
    /// load to save.
    ///
    /// # Errors
    /// Returns the first store, completion or send failure. Nothing is rolled back.
    pub async fn handle(&self, message: &InboundMessage) -> Result<ReplyOutcome, ReplyError> {
        let user_id = message.user_id();
        let _guard = self.locks.lock(user_id).await;

        let mut transcript = self.store.load(user_id).await?;
        transcript.push(Turn::user(message.body.as_str()));

        if is_exit_request(&message.body) {
            info!(user_id, "Contact opted out");
            self.session.send(&message.chat_id, CLOSING_MESSAGE).await?;
            return Ok(ReplyOutcome::Closed);
        }

        let reply = self.completion.complete(&transcript).await?;
        self.session.send(&message.chat_id, &reply).await?;

        transcript.push(Turn::system(reply));
        self.store.save(user_id, &transcript).await?;
        debug!(user_id, turns = transcript.len(), "Reply sent");

        Ok(ReplyOutcome::Replied)
    }
}

/// Consume inbound messages until the channel closes, one task per message.
pub async fn run_inbound_loop(
    mut inbound: mpsc::Receiver<InboundMessage>,
    orchestrator: Arc<ReplyOrchestrator>,
) {
    while let Some(message) = inbound.recv().await {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move {
            if let Err(err) = orchestrator.handle(&message).await {
                error!(user_id = message.user_id(), %err, "Failed to answer message");
            }
        });
    }
    info!("Inbound message loop stopped");
}
