//! Conversation logic: answering inbound messages and bulk outreach.

pub mod bulk;
pub mod reply;

pub use bulk::{BulkIntake, BulkReport, ContactRow, IntakeError, RowOutcome, RowStatus};
pub use reply::{ReplyError, ReplyOrchestrator, ReplyOutcome, run_inbound_loop};
