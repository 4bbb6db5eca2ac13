//! Tokenbank core domain layer.
//!
//! Database-agnostic models, traits, and services for the group-shared token
//! ledger: balance mutation with idempotency guards, the email reconciliation
//! pipeline, and the redemption orchestrator. Storage implementations live in
//! `tokenbank-storage-sqlite`.

pub mod constants;
pub mod errors;

pub mod events;
pub mod groups;
pub mod ledger;
pub mod reconciliation;
pub mod redemption;
pub mod settings;

pub use errors::{DatabaseError, Error, Result, ValidationError};
