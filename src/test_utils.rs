//! Test doubles for the store, completion and chat network seams.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::mpsc;

use crate::chat::{ChatError, ChatFuture, ChatNetwork, NetworkEvent};
use crate::llm::{CompletionClient, CompletionError, CompletionFuture};
use crate::store::{
    ConversationStore, MemoryStore, StoreError, StoreFuture, StoreResult, Transcript,
};

/// Chat network that records sends and replays queued events.
pub struct MockNetwork {
    sent: Mutex<Vec<(String, String)>>,
    failing: Mutex<HashSet<String>>,
    events_tx: mpsc::UnboundedSender<Vec<NetworkEvent>>,
    events_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<Vec<NetworkEvent>>>,
}

impl MockNetwork {
    pub fn new() -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            sent: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
            events_tx,
            events_rx: tokio::sync::Mutex::new(events_rx),
        }
    }

    /// Queue a batch for the next `next_events` call.
    pub fn push_events(&self, events: Vec<NetworkEvent>) {
        self.events_tx.send(events).unwrap();
    }

    /// Make sends to `chat_id` fail.
    pub fn fail_for(&self, chat_id: &str) {
        self.failing.lock().unwrap().insert(chat_id.to_string());
    }

    /// Every `(chat_id, text)` sent so far.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

impl ChatNetwork for MockNetwork {
    fn send_text<'a>(&'a self, chat_id: &'a str, text: &'a str) -> ChatFuture<'a, Result<(), ChatError>> {
        Box::pin(async move {
            self.sent
                .lock()
                .unwrap()
                .push((chat_id.to_string(), text.to_string()));
            if self.failing.lock().unwrap().contains(chat_id) {
                return Err(ChatError::Status {
                    status: 503,
                    body: "not paired".to_string(),
                });
            }
            Ok(())
        })
    }

    fn next_events(&self) -> ChatFuture<'_, Result<Vec<NetworkEvent>, ChatError>> {
        Box::pin(async move {
            let mut rx = self.events_rx.lock().await;
            match rx.recv().await {
                Some(events) => Ok(events),
                None => std::future::pending().await,
            }
        })
    }
}

/// Completion backend returning a canned reply and recording its inputs.
pub struct MockCompletion {
    reply: Option<String>,
    requests: Mutex<Vec<Transcript>>,
}

impl MockCompletion {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<Transcript> {
        self.requests.lock().unwrap().clone()
    }
}

impl CompletionClient for MockCompletion {
    fn complete<'a>(
        &'a self,
        transcript: &'a Transcript,
    ) -> CompletionFuture<'a, Result<String, CompletionError>> {
        Box::pin(async move {
            self.requests.lock().unwrap().push(transcript.clone());
            self.reply.clone().ok_or(CompletionError::EmptyResponse)
        })
    }
}

/// Memory store that counts writes and can refuse writes for given keys.
#[derive(Default)]
pub struct RecordingStore {
    pub inner: MemoryStore,
    saves: AtomicUsize,
    failing: Mutex<HashSet<String>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_for(&self, user_id: &str) {
        self.failing.lock().unwrap().insert(user_id.to_string());
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl ConversationStore for RecordingStore {
    fn load<'a>(&'a self, user_id: &'a str) -> StoreFuture<'a, StoreResult<Transcript>> {
        self.inner.load(user_id)
    }

    fn save<'a>(
        &'a self,
        user_id: &'a str,
        transcript: &'a Transcript,
    ) -> StoreFuture<'a, StoreResult<()>> {
        Box::pin(async move {
            self.saves.fetch_add(1, Ordering::SeqCst);
            if self.failing.lock().unwrap().contains(user_id) {
                return Err(StoreError::Status {
                    status: 500,
                    body: "write refused".to_string(),
                });
            }
            self.inner.save(user_id, transcript).await
        })
    }
}
