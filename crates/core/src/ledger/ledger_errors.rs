//! Ledger error types.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by the balance mutator.
///
/// A duplicate idempotency reference is NOT an error: it is reported as
/// [`crate::ledger::LedgerOutcome::Duplicate`] so callers can treat retries
/// as benign no-ops.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Group not found: {0}")]
    GroupNotFound(String),

    #[error("Group is deactivated: {0}")]
    GroupInactive(String),

    #[error(
        "Insufficient balance: have {balance}, requested {requested}, short {shortfall}"
    )]
    InsufficientBalance {
        balance: Decimal,
        requested: Decimal,
        shortfall: Decimal,
    },

    #[error("Invalid mutation amount: {0}")]
    InvalidAmount(String),

    #[error("Missing idempotency reference for {0}")]
    MissingReference(String),
}
