//! Ledger repository and service traits.
//!
//! These traits define the contract for balance mutation without any
//! database-specific types, allowing for different storage implementations.

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::ledger_model::{BalanceMutation, LedgerEntry, LedgerOutcome};
use crate::errors::Result;

/// Trait defining the contract for ledger persistence.
///
/// `apply` is the single write path for balances. Implementations MUST run
/// the whole read-balance, reference check, non-negativity check, balance
/// write, and entry append as one atomic unit, serialized against every other
/// mutation of the same group. Either the balance update and the entry append
/// both happen, or neither does.
#[async_trait]
pub trait LedgerRepositoryTrait: Send + Sync {
    /// Atomically applies a balance mutation.
    ///
    /// Returns [`LedgerOutcome::Duplicate`] without touching the balance when
    /// the mutation's reference is already recorded. Fails with
    /// `LedgerError::InsufficientBalance` when the debit would take the
    /// balance below zero; nothing is written in that case.
    async fn apply(&self, mutation: BalanceMutation) -> Result<LedgerOutcome>;

    /// Current balance of a group, by external group id.
    fn get_balance(&self, group_ref: &str) -> Result<Decimal>;

    /// Entries for a group ordered newest first, by external group id.
    fn get_entries(&self, group_ref: &str, limit: Option<i64>) -> Result<Vec<LedgerEntry>>;

    /// Looks up an entry by its idempotency reference.
    fn find_by_reference(&self, reference: &str) -> Result<Option<LedgerEntry>>;
}

/// Trait defining the contract for ledger service operations.
///
/// The service layer validates mutations, derives idempotency references,
/// and emits domain events; it does not check chat-side privileges (manual
/// adjustments require the caller to have verified the admin flag).
#[async_trait]
pub trait LedgerServiceTrait: Send + Sync {
    /// Credits a group from a reconciled bank transfer.
    async fn credit_deposit(
        &self,
        group_ref: &str,
        amount: Decimal,
        transfer_id: &str,
        description: &str,
    ) -> Result<LedgerOutcome>;

    /// Commits the debit of a completed redemption.
    async fn debit_redemption(
        &self,
        group_ref: &str,
        member_ref: Option<&str>,
        token_cost: Decimal,
        redemption_id: &str,
        description: &str,
    ) -> Result<LedgerOutcome>;

    /// Administrative adjustment; positive credits, negative debits.
    async fn manual_adjust(
        &self,
        group_ref: &str,
        member_ref: Option<&str>,
        amount: Decimal,
        operator: &str,
        description: &str,
    ) -> Result<LedgerOutcome>;

    /// Current balance of a group.
    fn get_balance(&self, group_ref: &str) -> Result<Decimal>;

    /// Recent transaction history, newest first.
    fn get_history(&self, group_ref: &str, limit: Option<i64>) -> Result<Vec<LedgerEntry>>;
}
