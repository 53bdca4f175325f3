//! Long-lived WhatsApp session shared by the reply loop and the HTTP layer.
//!
//! Constructed once at startup. The event pump drains [`ChatNetwork`] events,
//! keeps the current pairing code and readiness flag, and forwards inbound
//! messages to a channel consumed by the reply orchestrator.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{Notify, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{ChatError, ChatNetwork, InboundMessage, NetworkEvent, qr};

/// Capacity of the inbound message channel.
const INBOUND_CAPACITY: usize = 256;
/// Pause before polling again after a failed poll.
const POLL_RETRY: Duration = Duration::from_secs(2);

/// Owned chat session.
pub struct ChatSession {
    network: Arc<dyn ChatNetwork>,
    inbound: mpsc::Sender<InboundMessage>,
    pairing: watch::Sender<Option<String>>,
    ready: AtomicBool,
    shutdown: Arc<Notify>,
}

impl ChatSession {
    /// Create a session over `network`.
    ///
    /// Returns the session and the receiving end of its inbound messages.
    #[must_use]
    pub fn new(network: Arc<dyn ChatNetwork>) -> (Arc<Self>, mpsc::Receiver<InboundMessage>) {
        let (inbound, receiver) = mpsc::channel(INBOUND_CAPACITY);
        let (pairing, _) = watch::channel(None);
        let session = Arc::new(Self {
            network,
            inbound,
            pairing,
            ready: AtomicBool::new(false),
            shutdown: Arc::new(Notify::new()),
        });
        (session, receiver)
    }

    /// Get a shutdown notifier to stop the event pump.
    #[must_use]
    pub fn shutdown_notifier(&self) -> Arc<Notify> {
        Arc::clone(&self.shutdown)
    }

    /// Spawn the event pump as a tokio task.
    #[must_use]
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let session = Arc::clone(self);
        tokio::spawn(async move {
            session.run().await;
        })
    }

    async fn run(&self) {
        info!("Connecting WhatsApp session");
        loop {
            tokio::select! {
                polled = self.network.next_events() => match polled {
                    Ok(events) => {
                        for event in events {
                            self.handle_event(event).await;
                        }
                    }
                    Err(err) => {
                        warn!(%err, "Polling chat network failed");
                        tokio::time::sleep(POLL_RETRY).await;
                    }
                },
                () = self.shutdown.notified() => {
                    info!("WhatsApp session shutting down");
                    break;
                }
            }
        }
    }

    /// Apply one network event to the session.
    pub async fn handle_event(&self, event: NetworkEvent) {
        match event {
            NetworkEvent::PairingCode { code } => {
                match qr::to_terminal(&code) {
                    Ok(rendered) => info!("Scan this code with WhatsApp to pair:\n{rendered}"),
                    Err(err) => warn!(%err, "Could not render pairing code"),
                }
                self.pairing.send_replace(Some(code));
            }
            NetworkEvent::Ready => {
                self.ready.store(true, Ordering::Release);
                self.pairing.send_replace(None);
                info!("WhatsApp client is ready!");
            }
            NetworkEvent::Disconnected { reason } => {
                self.ready.store(false, Ordering::Release);
                warn!(%reason, "WhatsApp client disconnected");
            }
            NetworkEvent::Message(message) => {
                debug!(chat_id = %message.chat_id, "Inbound message");
                if self.inbound.send(message).await.is_err() {
                    warn!("Inbound message dropped: no receiver");
                }
            }
        }
    }

    /// Send `text` to `recipient_id`.
    ///
    /// Not gated on readiness; an unpaired session fails per the network.
    ///
    /// # Errors
    /// Returns an error if the network fails to send.
    pub async fn send(&self, recipient_id: &str, text: &str) -> Result<(), ChatError> {
        self.network.send_text(recipient_id, text).await
    }

    /// Whether the network reported the session as paired and connected.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// The most recent unconsumed pairing code, if any.
    #[must_use]
    pub fn current_pairing_code(&self) -> Option<String> {
        self.pairing.borrow().clone()
    }

    /// Wait for a pairing code, at most `timeout`.
    ///
    /// Returns the current code immediately when one is pending.
    pub async fn wait_for_pairing_code(&self, timeout: Duration) -> Option<String> {
        let mut receiver = self.pairing.subscribe();
        let wait = async move {
            loop {
                let current = receiver.borrow_and_update().clone();
                if current.is_some() {
                    return current;
                }
                if receiver.changed().await.is_err() {
                    return None;
                }
            }
        };
        tokio::time::timeout(timeout, wait).await.ok().flatten()
    }
}
