//! Reconciliation repository, mailbox collaborator, and service traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::reconciliation_model::{
    CreditResult, EmailReconciliationRecord, InboundEmail, NewReconciliationRecord,
    ProcessingStatus, ReconciliationReport,
};
use crate::errors::Result;
use crate::ledger::BalanceMutation;

/// Collaborator interface over the mailbox. Protocol details (IMAP or
/// otherwise) belong to the implementation, not the pipeline.
#[async_trait]
pub trait MailboxReaderTrait: Send + Sync {
    /// Unread messages received after `since`.
    async fn fetch_unread(&self, since: DateTime<Utc>) -> Result<Vec<InboundEmail>>;

    /// Marks a message consumed so it is not served again.
    async fn mark_consumed(&self, email_id: &str) -> Result<()>;
}

/// Trait defining the contract for reconciliation-record persistence.
#[async_trait]
pub trait ReconciliationRepositoryTrait: Send + Sync {
    /// Looks up a record by its (globally unique) transfer id.
    fn find_by_transfer_id(&self, transfer_id: &str) -> Result<Option<EmailReconciliationRecord>>;

    /// Inserts a new record. Fails with a unique violation when the transfer
    /// id is already recorded.
    async fn insert(&self, record: NewReconciliationRecord) -> Result<EmailReconciliationRecord>;

    /// Applies the deposit mutation and flips the record to its terminal
    /// status in ONE transaction: `Success` (with tokens credited) when the
    /// mutation applied, `Duplicate` when its reference was already recorded,
    /// `Failed` when the mutator reported a domain error. Store failures
    /// roll the whole transaction back and leave the record pending.
    async fn settle_with_credit(
        &self,
        record_id: &str,
        mutation: BalanceMutation,
    ) -> Result<CreditResult>;

    /// Marks a record with a terminal status outside the credit path
    /// (unmatched / failed before any credit was attempted).
    async fn mark_processed(
        &self,
        record_id: &str,
        status: ProcessingStatus,
        error_message: Option<String>,
    ) -> Result<()>;

    /// Records awaiting manual follow-up.
    fn list_unmatched(&self) -> Result<Vec<EmailReconciliationRecord>>;
}

/// Trait defining the contract for the reconciliation pipeline.
#[async_trait]
pub trait ReconciliationServiceTrait: Send + Sync {
    /// One polling pass: fetch unread messages, process each, and summarize.
    async fn poll_once(&self) -> Result<ReconciliationReport>;

    /// Records awaiting manual follow-up.
    fn list_unmatched(&self) -> Result<Vec<EmailReconciliationRecord>>;
}
