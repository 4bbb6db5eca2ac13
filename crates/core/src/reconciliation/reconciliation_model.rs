//! Reconciliation domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result, ValidationError};

/// One message handed over by the mailbox reader.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundEmail {
    /// Mailbox-side message id, used to mark the message consumed.
    pub id: String,
    pub subject: String,
    pub sender: String,
    pub received_at: DateTime<Utc>,
    pub body: String,
}

/// Transfer details extracted from one notification email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferNotice {
    pub amount: Decimal,
    /// Explicit transaction id from the message, or a deterministic content
    /// fingerprint when the source provides none.
    pub transfer_id: String,
    /// Group code embedded in the message (`GROUP-<code>`), if any.
    pub group_code: Option<String>,
    pub transfer_time: Option<DateTime<Utc>>,
}

/// Terminal (and pending) processing states of a reconciliation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    Pending,
    Success,
    Failed,
    Unmatched,
    Duplicate,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Pending => "pending",
            ProcessingStatus::Success => "success",
            ProcessingStatus::Failed => "failed",
            ProcessingStatus::Unmatched => "unmatched",
            ProcessingStatus::Duplicate => "duplicate",
        }
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessingStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(ProcessingStatus::Pending),
            "success" => Ok(ProcessingStatus::Success),
            "failed" => Ok(ProcessingStatus::Failed),
            "unmatched" => Ok(ProcessingStatus::Unmatched),
            "duplicate" => Ok(ProcessingStatus::Duplicate),
            other => Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Unknown processing status: {}",
                other
            )))),
        }
    }
}

/// Durable record of one considered notification email.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailReconciliationRecord {
    pub id: String,
    /// Internal id of the resolved group; `None` until (unless) matched.
    pub group_id: Option<String>,
    pub subject: String,
    pub sender: String,
    pub transfer_amount: Decimal,
    /// Globally unique; a second email bearing the same id is a no-op.
    pub transfer_id: String,
    pub transfer_time: Option<DateTime<Utc>>,
    pub status: ProcessingStatus,
    pub tokens_credited: Decimal,
    pub error_message: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Input model for inserting a reconciliation record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReconciliationRecord {
    pub group_id: Option<String>,
    pub subject: String,
    pub sender: String,
    pub transfer_amount: Decimal,
    pub transfer_id: String,
    pub transfer_time: Option<DateTime<Utc>>,
    pub status: ProcessingStatus,
    pub error_message: Option<String>,
}

/// Result of settling a record's credit inside one storage transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "result")]
pub enum CreditResult {
    Credited { new_balance: Decimal },
    Duplicate,
    Failed { error: String },
}

/// Outcome of processing one inbound email.
#[derive(Debug, Clone, PartialEq)]
pub enum EmailOutcome {
    /// Parsed, matched, and credited.
    Credited {
        group_ref: String,
        new_balance: Decimal,
    },
    /// The transfer id was already processed; nothing changed.
    Duplicate,
    /// Parsed but no (or no unique) active group matched the code.
    Unmatched,
    /// Not a transfer notification; consumed without a record.
    Rejected,
    /// Credit attempted and the mutator reported a domain failure.
    Failed { error: String },
    /// A store failure interrupted processing; the email stays unconsumed
    /// and will be retried on the next poll.
    Deferred { error: String },
}

/// Summary of one polling pass over the mailbox.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationReport {
    pub fetched: usize,
    pub credited: usize,
    pub duplicates: usize,
    pub unmatched: usize,
    pub rejected: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

impl ReconciliationReport {
    /// Folds one email outcome into the summary.
    pub fn record(&mut self, outcome: &EmailOutcome) {
        match outcome {
            EmailOutcome::Credited { .. } => self.credited += 1,
            EmailOutcome::Duplicate => self.duplicates += 1,
            EmailOutcome::Unmatched => self.unmatched += 1,
            EmailOutcome::Rejected => self.rejected += 1,
            EmailOutcome::Failed { error } => {
                self.failed += 1;
                self.errors.push(error.clone());
            }
            EmailOutcome::Deferred { error } => {
                self.failed += 1;
                self.errors.push(error.clone());
            }
        }
    }
}
