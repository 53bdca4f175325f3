//! OpenAI-compatible `/chat/completions` client.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::{CompletionClient, CompletionError, CompletionFuture};
use crate::config::OpenAiConfig;
use crate::store::Transcript;

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Chat completion client for the OpenAI API and compatible servers.
pub struct OpenAiChat {
    client: Client,
    endpoint: Url,
    api_key: String,
    model: String,
}

impl OpenAiChat {
    /// Build a client from configuration.
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the HTTP client cannot be built.
    pub fn new(config: &OpenAiConfig) -> Result<Self, CompletionError> {
        let client = Client::builder().build()?;
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let endpoint = Url::parse(&base)?.join("chat/completions")?;
        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    /// Model name sent with every request.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

impl CompletionClient for OpenAiChat {
    fn complete<'a>(
        &'a self,
        transcript: &'a Transcript,
    ) -> CompletionFuture<'a, Result<String, CompletionError>> {
        Box::pin(async move {
            let request = ChatRequest {
                model: &self.model,
                messages: transcript
                    .turns()
                    .iter()
                    .map(|turn| ChatMessage {
                        role: turn.role.as_str(),
                        content: &turn.content,
                    })
                    .collect(),
            };

            debug!(model = %self.model, turns = transcript.len(), "Requesting completion");
            let response = self
                .client
                .post(self.endpoint.clone())
                .bearer_auth(&self.api_key)
                .json(&request)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(CompletionError::Status {
                    status: status.as_u16(),
                    body,
                });
            }

            let parsed: ChatResponse = response.json().await?;
            parsed
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content)
                .ok_or(CompletionError::EmptyResponse)
        })
    }
}
