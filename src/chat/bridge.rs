//! HTTP client for a WhatsApp Web bridge process.
//!
//! The bridge keeps the actual WhatsApp Web session (and its local auth
//! state) and exposes it as:
//! - `POST /messages` with `{"chatId", "text"}` to send,
//! - `GET /events?after={cursor}` long-poll returning `{"cursor", "events"}`.

use std::sync::atomic::{AtomicU64, Ordering};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::{ChatError, ChatFuture, ChatNetwork, NetworkEvent};

/// Client id the bridge stores its auth state under.
const CLIENT_ID: &str = "bulk-sender";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendRequest<'a> {
    client_id: &'a str,
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct EventBatch {
    cursor: u64,
    #[serde(default)]
    events: Vec<NetworkEvent>,
}

/// [`ChatNetwork`] backed by a bridge sidecar.
pub struct BridgeNetwork {
    client: Client,
    base: Url,
    cursor: AtomicU64,
}

impl BridgeNetwork {
    /// Build a client for the bridge at `base_url`.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, ChatError> {
        let mut base = base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        Ok(Self {
            client: Client::builder().build()?,
            base: Url::parse(&base)?,
            cursor: AtomicU64::new(0),
        })
    }
}

async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response, ChatError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ChatError::Status {
        status: status.as_u16(),
        body,
    })
}

impl ChatNetwork for BridgeNetwork {
    fn send_text<'a>(&'a self, chat_id: &'a str, text: &'a str) -> ChatFuture<'a, Result<(), ChatError>> {
        Box::pin(async move {
            let url = self.base.join("messages")?;
            let response = self
                .client
                .post(url)
                .json(&SendRequest {
                    client_id: CLIENT_ID,
                    chat_id,
                    text,
                })
                .send()
                .await?;
            error_for_status(response).await?;
            debug!(chat_id, "Message handed to bridge");
            Ok(())
        })
    }

    fn next_events(&self) -> ChatFuture<'_, Result<Vec<NetworkEvent>, ChatError>> {
        Box::pin(async move {
            let mut url = self.base.join("events")?;
            url.query_pairs_mut()
                .append_pair("clientId", CLIENT_ID)
                .append_pair("after", &self.cursor.load(Ordering::Acquire).to_string());

            let response = self.client.get(url).send().await?;
            let batch: EventBatch = error_for_status(response).await?.json().await?;
            self.cursor.store(batch.cursor, Ordering::Release);
            Ok(batch.events)
        })
    }
}
