//! Bulk intake: seed a conversation and send an opening message per contact.

use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::chat::{ChatError, ChatSession, recipient_id};
use crate::store::{ConversationLocks, ConversationStore, StoreError, Transcript};

/// One row of an uploaded contact list, keyed by header name.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
pub struct ContactRow {
    /// Phone number in any human format.
    pub phone_number: String,
    /// First name.
    pub firstname: String,
    /// Last name.
    pub lastname: String,
    /// Company the contact works for.
    pub company_name: String,
}

/// Failure to turn an upload into contact rows.
#[derive(Debug, Error)]
pub enum IntakeError {
    /// The decoder rejected the file.
    #[error("could not read contact list: {0}")]
    Csv(#[from] csv::Error),
    /// Writing or reading the temporary upload failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
enum RowError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("chat error: {0}")]
    Chat(#[from] ChatError),
}

/// Result for one contact.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RowStatus {
    /// Transcript seeded and greeting handed to the network.
    Sent,
    /// Seeding or sending failed.
    Failed {
        /// Error text.
        reason: String,
    },
}

/// Outcome of one row.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct RowOutcome {
    /// Normalized phone number used as key and recipient.
    pub phone: String,
    /// What happened.
    #[serde(flatten)]
    pub status: RowStatus,
}

/// Outcome of a whole upload.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct BulkReport {
    /// Number of rows processed, whatever their outcome.
    pub attempted: usize,
    /// Per-row results, in row order.
    pub outcomes: Vec<RowOutcome>,
}

impl BulkReport {
    /// Rows that failed.
    pub fn failures(&self) -> impl Iterator<Item = &RowOutcome> {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome.status, RowStatus::Failed { .. }))
    }

    /// Number of rows that went through.
    #[must_use]
    pub fn sent(&self) -> usize {
        self.outcomes.len() - self.failures().count()
    }
}

/// Strip everything but ASCII digits.
#[must_use]
pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Personalized opening message for `contact`.
#[must_use]
pub fn compose_greeting(contact: &ContactRow, template: &str) -> String {
    format!(
        "Hello {} {} from {}, {template}",
        contact.firstname, contact.lastname, contact.company_name
    )
}

/// Decode a CSV contact list with a header row.
///
/// # Errors
/// Returns the decoder's error for the first malformed row.
pub fn decode_contacts<R: Read>(reader: R) -> Result<Vec<ContactRow>, IntakeError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);
    let rows = csv_reader
        .deserialize::<ContactRow>()
        .collect::<Result<Vec<_>, csv::Error>>()?;
    Ok(rows)
}

/// Spool an upload to a temporary file in `upload_dir`, decode it, delete it.
///
/// The file is removed once decoding finishes, whether or not it succeeded.
/// Blocking; run it off the async executor.
///
/// # Errors
/// Returns an error if the upload cannot be spooled or decoded.
pub fn decode_upload(upload_dir: &Path, bytes: &[u8]) -> Result<Vec<ContactRow>, IntakeError> {
    std::fs::create_dir_all(upload_dir)?;
    let mut spooled = tempfile::Builder::new()
        .prefix("contacts-")
        .suffix(".csv")
        .tempfile_in(upload_dir)?;
    spooled.write_all(bytes)?;
    spooled.flush()?;

    let decoded = std::fs::File::open(spooled.path())
        .map_err(IntakeError::from)
        .and_then(decode_contacts);

    let path = spooled.path().to_path_buf();
    if let Err(err) = spooled.close() {
        warn!(path = %path.display(), %err, "Could not remove uploaded file");
    }
    decoded
}

/// Fans an opening message out to many contacts.
pub struct BulkIntake {
    store: Arc<dyn ConversationStore>,
    session: Arc<ChatSession>,
    locks: Arc<ConversationLocks>,
}

impl BulkIntake {
    /// Wire the intake over its collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn ConversationStore>,
        session: Arc<ChatSession>,
        locks: Arc<ConversationLocks>,
    ) -> Self {
        Self {
            store,
            session,
            locks,
        }
    }

    /// Seed and greet every contact in order.
    ///
    /// A failing row is logged and recorded; later rows still run.
    pub async fn fan_out(&self, contacts: &[ContactRow], template: &str) -> BulkReport {
        let mut outcomes = Vec::with_capacity(contacts.len());

        for contact in contacts {
            let phone = normalize_phone(&contact.phone_number);
            let status = match self.seed_and_greet(&phone, contact, template).await {
                Ok(()) => {
                    debug!(%phone, "Opening message sent");
                    RowStatus::Sent
                }
                Err(err) => {
                    warn!(%phone, %err, "Error sending message");
                    RowStatus::Failed {
                        reason: err.to_string(),
                    }
                }
            };
            outcomes.push(RowOutcome { phone, status });
        }

        let report = BulkReport {
            attempted: contacts.len(),
            outcomes,
        };
        info!(
            attempted = report.attempted,
            sent = report.sent(),
            "Bulk send finished"
        );
        report
    }

    async fn seed_and_greet(
        &self,
        phone: &str,
        contact: &ContactRow,
        template: &str,
    ) -> Result<(), RowError> {
        {
            let _guard = self.locks.lock(phone).await;
            self.store.save(phone, &Transcript::seeded(template)).await?;
        }
        let greeting = compose_greeting(contact, template);
        self.session.send(&recipient_id(phone), &greeting).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ChatNetwork;
    use crate::store::Turn;
    use crate::test_utils::{MockNetwork, RecordingStore};

    const CSV: &str = "phone_number,firstname,lastname,company_name\n\
        +1 (555) 123-4567,Ada,Lovelace,Analytical Engines\n\
        555.000.1111,Grace,Hopper,Navy\n\
        44 20 7946 0000,Alan,Turing,Bletchley\n";

    fn intake() -> (BulkIntake, Arc<RecordingStore>, Arc<MockNetwork>) {
        let store = Arc::new(RecordingStore::new());
        let network = Arc::new(MockNetwork::new());
        let (session, _rx) = ChatSession::new(Arc::clone(&network) as Arc<dyn ChatNetwork>);
        let intake = BulkIntake::new(
            Arc::clone(&store) as Arc<dyn ConversationStore>,
            session,
            Arc::new(ConversationLocks::new()),
        );
        (intake, store, network)
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone("+1 (555) 123-4567"), "15551234567");
        assert_eq!(normalize_phone("n/a"), "");
    }

    #[test]
    fn test_compose_greeting() {
        let contact = ContactRow {
            phone_number: "1".to_string(),
            firstname: "Ada".to_string(),
            lastname: "Lovelace".to_string(),
            company_name: "Analytical Engines".to_string(),
        };
        assert_eq!(
            compose_greeting(&contact, "Hi there!"),
            "Hello Ada Lovelace from Analytical Engines, Hi there!"
        );
    }

    #[test]
    fn test_decode_contacts() {
        let rows = decode_contacts(CSV.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].firstname, "Grace");
        assert_eq!(rows[2].company_name, "Bletchley");
    }

    #[test]
    fn test_decode_rejects_missing_column() {
        let err = decode_contacts("phone_number,firstname\n1,Ada\n".as_bytes()).unwrap_err();
        assert!(matches!(err, IntakeError::Csv(_)));
    }

    #[test]
    fn test_decode_upload_removes_spooled_file() {
        let dir = tempfile::tempdir().unwrap();
        let rows = decode_upload(dir.path(), CSV.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_decode_upload_removes_file_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let result = decode_upload(dir.path(), b"phone_number\n\"unterminated");
        assert!(result.is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_fan_out_seeds_and_greets_each_row() {
        let (intake, store, network) = intake();
        let contacts = decode_contacts(CSV.as_bytes()).unwrap();

        let report = intake.fan_out(&contacts, "Hi there!").await;

        assert_eq!(report.attempted, 3);
        assert_eq!(report.sent(), 3);
        assert_eq!(store.save_count(), 3);
        assert_eq!(
            store.inner.get("15551234567").unwrap().turns(),
            &[Turn::system("Hi there!")]
        );

        let sent = network.sent();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0].0, "15551234567@c.us");
        assert!(sent[0].1.contains("Ada Lovelace from Analytical Engines"));
        assert!(sent[1].1.contains("Grace Hopper from Navy"));
        assert!(sent[2].1.ends_with("Hi there!"));
    }

    #[tokio::test]
    async fn test_fan_out_reports_row_without_digits_as_failed() {
        let (intake, store, network) = intake();
        let contacts = vec![ContactRow {
            phone_number: "n/a".to_string(),
            firstname: "Ada".to_string(),
            lastname: "Lovelace".to_string(),
            company_name: "Analytical Engines".to_string(),
        }];

        let report = intake.fan_out(&contacts, "Hi there!").await;

        assert_eq!(report.attempted, 1);
        assert_eq!(report.sent(), 0);
        assert_eq!(report.outcomes[0].phone, "");
        assert!(matches!(report.outcomes[0].status, RowStatus::Failed { .. }));
        assert!(store.inner.is_empty());
        assert!(network.sent().is_empty());
    }

    #[tokio::test]
    async fn test_fan_out_continues_after_failures() {
        let (intake, store, network) = intake();
        store.fail_for("15551234567");
        network.fail_for("5550001111@c.us");
        let contacts = decode_contacts(CSV.as_bytes()).unwrap();

        let report = intake.fan_out(&contacts, "Hi there!").await;

        assert_eq!(report.attempted, 3);
        assert_eq!(report.sent(), 1);
        let failed: Vec<_> = report.failures().map(|o| o.phone.as_str()).collect();
        assert_eq!(failed, vec!["15551234567", "5550001111"]);
        // first row never reached the network
        assert_eq!(network.sent().len(), 2);
    }
}
