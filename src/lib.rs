//! WhatsApp to chat-completion bridge with bulk outreach.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(unused_must_use)]
#![deny(nonstandard_style)]
#![forbid(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![deny(clippy::panic)]
#![deny(clippy::print_stdout)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

/// Conversation logic: replies and bulk outreach.
pub mod bot;
/// WhatsApp session and network client.
pub mod chat;
/// Environment configuration.
pub mod config;
/// Chat completion clients.
pub mod llm;
/// HTTP server and routes.
#[allow(clippy::missing_errors_doc, clippy::unused_async)]
pub mod server;
/// Entry helpers to start the service.
pub mod start_whatsgpt;
/// Transcript storage.
pub mod store;

#[cfg(test)]
mod test_utils;
