//! Firebase Realtime Database backend, spoken over its REST API.
//!
//! Each transcript lives at `{database_url}/{namespace}/{user_id}.json` as a
//! `{"messages": [...]}` document. A missing record reads back as JSON `null`.

use reqwest::Client;
use tracing::debug;
use url::Url;

use super::errors::{StoreError, StoreResult};
use super::transcript::Transcript;
use super::{ConversationStore, StoreFuture, validate_key};

/// Transcript store backed by a Firebase Realtime Database.
pub struct FirebaseStore {
    client: Client,
    base: Url,
    namespace: String,
}

impl FirebaseStore {
    /// Build a store for `database_url`, keeping records under `namespace`.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the HTTP client cannot be built.
    pub fn new(database_url: &str, namespace: &str) -> StoreResult<Self> {
        let client = Client::builder().build()?;
        Self::with_client(client, database_url, namespace)
    }

    /// Build a store on top of an existing HTTP client.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid.
    pub fn with_client(client: Client, database_url: &str, namespace: &str) -> StoreResult<Self> {
        let mut base = database_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        Ok(Self {
            client,
            base: Url::parse(&base)?,
            namespace: namespace.trim_matches('/').to_string(),
        })
    }

    fn record_url(&self, user_id: &str) -> StoreResult<Url> {
        validate_key(user_id)?;
        Ok(self.base.join(&format!("{}/{user_id}.json", self.namespace))?)
    }
}

async fn error_for_status(response: reqwest::Response) -> StoreResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Status {
        status: status.as_u16(),
        body,
    })
}

impl ConversationStore for FirebaseStore {
    fn load<'a>(&'a self, user_id: &'a str) -> StoreFuture<'a, StoreResult<Transcript>> {
        Box::pin(async move {
            let url = self.record_url(user_id)?;
            let response = self.client.get(url).send().await?;
            let body = error_for_status(response).await?.text().await?;
            let record: Option<Transcript> = serde_json::from_str(&body)?;
            debug!(user_id, found = record.is_some(), "Loaded transcript");
            Ok(record.unwrap_or_default())
        })
    }

    fn save<'a>(
        &'a self,
        user_id: &'a str,
        transcript: &'a Transcript,
    ) -> StoreFuture<'a, StoreResult<()>> {
        Box::pin(async move {
            let url = self.record_url(user_id)?;
            let response = self.client.put(url).json(transcript).send().await?;
            error_for_status(response).await?;
            debug!(user_id, turns = transcript.len(), "Saved transcript");
            Ok(())
        })
    }
}
