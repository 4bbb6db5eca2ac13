//! SQLite storage implementation for tokenbank.
//!
//! This crate provides all database-related functionality using Diesel ORM
//! with SQLite. It implements the repository traits defined in
//! `tokenbank-core` and contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - Repository implementations for all domain entities
//! - Database-specific model types (with Diesel derives)
//!
//! # Architecture
//!
//! This crate is the only place in the application where Diesel dependencies
//! exist. `tokenbank-core` is database-agnostic and works with traits.
//!
//! Every write goes through a single writer actor owning one connection; each
//! job runs inside an immediate transaction, which is what makes the ledger's
//! read-check-write-append sequence atomic and serialized.

pub mod db;
pub mod errors;
pub mod schema;
pub mod utils;

// Repository implementations
pub mod groups;
pub mod ledger;
pub mod reconciliation;
pub mod redemption;
pub mod settings;

// Re-export database utilities
pub use db::{create_pool, get_connection, init, run_migrations, DbConnection, DbPool, WriteHandle};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

// Re-export from tokenbank-core for convenience
pub use tokenbank_core::errors::{DatabaseError, Error, Result};
