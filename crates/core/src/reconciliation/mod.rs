//! Reconciliation module - matching inbound bank-transfer notification
//! emails to groups and crediting their balances.

mod parser;
mod reconciliation_errors;
mod reconciliation_model;
mod reconciliation_service;
mod reconciliation_traits;

#[cfg(test)]
mod reconciliation_service_tests;

// Re-export the public interface
pub use parser::{is_transfer_notification, parse_transfer_notice};
pub use reconciliation_errors::ReconciliationError;
pub use reconciliation_model::{
    CreditResult, EmailOutcome, EmailReconciliationRecord, InboundEmail, NewReconciliationRecord,
    ProcessingStatus, ReconciliationReport, TransferNotice,
};
pub use reconciliation_service::ReconciliationService;
pub use reconciliation_traits::{
    MailboxReaderTrait, ReconciliationRepositoryTrait, ReconciliationServiceTrait,
};
