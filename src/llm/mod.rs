//! Chat completion service.

pub mod openai;

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::store::Transcript;

pub use openai::OpenAiChat;

/// Boxed future type for completion calls.
pub type CompletionFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Errors produced by a completion backend.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// HTTP client error.
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
    /// HTTP response was not a success.
    #[error("completion api returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },
    /// The response carried no usable choice.
    #[error("completion response contained no message")]
    EmptyResponse,
    /// URL construction failed.
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
}

/// Something that turns a transcript into one assistant reply.
pub trait CompletionClient: Send + Sync {
    /// Submit every turn of `transcript` and return the generated text.
    ///
    /// # Errors
    /// Returns an error if the request fails or the response is malformed.
    fn complete<'a>(
        &'a self,
        transcript: &'a Transcript,
    ) -> CompletionFuture<'a, Result<String, CompletionError>>;
}
