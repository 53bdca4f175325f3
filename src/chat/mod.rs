//! WhatsApp session management.
//!
//! The chat network itself is reached through [`ChatNetwork`]; the session
//! object in [`session`] owns the connection for the lifetime of the process.

pub mod bridge;
pub mod qr;
pub mod session;

use std::future::Future;
use std::pin::Pin;

use serde::Deserialize;
use thiserror::Error;

pub use bridge::BridgeNetwork;
pub use session::ChatSession;

/// Suffix the network expects on individual chat ids.
pub const CHAT_SUFFIX: &str = "@c.us";

/// Boxed future type for network operations.
pub type ChatFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Chat network errors.
#[derive(Debug, Error)]
pub enum ChatError {
    /// HTTP client error.
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
    /// The bridge answered with a non-success status.
    #[error("bridge returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },
    /// URL construction failed.
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
}

/// A text message delivered by the network.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
pub struct InboundMessage {
    /// Originating chat, e.g. `15551234567@c.us`.
    #[serde(rename = "from")]
    pub chat_id: String,
    /// Message text.
    pub body: String,
}

impl InboundMessage {
    /// User part of the originating chat id.
    #[must_use]
    pub fn user_id(&self) -> &str {
        self.chat_id
            .split_once('@')
            .map_or(self.chat_id.as_str(), |(user, _)| user)
    }
}

/// Events emitted by the network connection.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NetworkEvent {
    /// A code to scan from the phone to pair this client.
    #[serde(rename = "qr")]
    PairingCode {
        /// Raw pairing payload.
        code: String,
    },
    /// The client is paired and connected.
    Ready,
    /// A message arrived.
    Message(InboundMessage),
    /// The connection dropped.
    Disconnected {
        /// Reason reported by the network.
        #[serde(default)]
        reason: String,
    },
}

/// Low-level chat network client.
pub trait ChatNetwork: Send + Sync {
    /// Send `text` to `chat_id`.
    ///
    /// # Errors
    /// Returns an error if the network rejects or fails to deliver the message.
    fn send_text<'a>(&'a self, chat_id: &'a str, text: &'a str) -> ChatFuture<'a, Result<(), ChatError>>;

    /// Wait for the next batch of events.
    ///
    /// # Errors
    /// Returns an error if the connection fails.
    fn next_events(&self) -> ChatFuture<'_, Result<Vec<NetworkEvent>, ChatError>>;
}

/// Network recipient id for a normalized phone number.
#[must_use]
pub fn recipient_id(phone: &str) -> String {
    format!("{phone}{CHAT_SUFFIX}")
}
