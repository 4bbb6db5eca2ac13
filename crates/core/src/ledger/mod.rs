//! Ledger module - the single choke point through which every group balance
//! mutation flows.

mod idempotency;
mod ledger_errors;
mod ledger_model;
mod ledger_service;
mod ledger_traits;


// Re-export the public interface
pub use idempotency::{
    content_fingerprint, deposit_reference, manual_reference, redemption_reference,
};
pub use ledger_errors::LedgerError;
pub use ledger_model::{BalanceMutation, LedgerEntry, LedgerOutcome, TransactionKind};
pub use ledger_service::LedgerService;
pub use ledger_traits::{LedgerRepositoryTrait, LedgerServiceTrait};
