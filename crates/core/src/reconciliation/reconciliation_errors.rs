//! Reconciliation error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconciliationError {
    #[error("Reconciliation record not found: {0}")]
    RecordNotFound(String),

    #[error("Mailbox error: {0}")]
    Mailbox(String),
}
