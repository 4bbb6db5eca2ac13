//! Redemption repository, automation collaborator, and service traits.

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::redemption_model::{
    AutomationOutcome, NewRedemption, RedemptionRecord, RedemptionRequest,
};
use crate::errors::Result;
use crate::ledger::{BalanceMutation, LedgerOutcome};

/// Collaborator interface over the storefront automation.
///
/// Synchronous from the orchestrator's point of view but expected to take on
/// the order of minutes; its internal scripting against the third-party site
/// is a black box. The call is the single point of uncertainty in the whole
/// system: it may succeed, fail cleanly, or fail ambiguously.
#[async_trait]
pub trait AutomationExecutorTrait: Send + Sync {
    async fn run(
        &self,
        target_account: &str,
        token_cost: Decimal,
        params: &serde_json::Value,
    ) -> Result<AutomationOutcome>;
}

/// Trait defining the contract for redemption-record persistence.
#[async_trait]
pub trait RedemptionRepositoryTrait: Send + Sync {
    /// Inserts a new pending record, resolving the external refs.
    async fn insert(&self, new_redemption: NewRedemption) -> Result<RedemptionRecord>;

    /// Flips a record to in-progress before the automation run starts.
    async fn mark_in_progress(&self, redemption_id: &str) -> Result<()>;

    /// Terminal failure: records the reason and bumps the retry count. No
    /// ledger entry is involved.
    async fn mark_failed(&self, redemption_id: &str, error_message: &str) -> Result<()>;

    /// Applies the debit mutation and flips the record to completed in ONE
    /// transaction, so a debit entry exists iff the record is completed.
    /// A `Duplicate` outcome (crash-and-retry replaying the reference) still
    /// completes the record.
    async fn complete_with_debit(
        &self,
        redemption_id: &str,
        external_ref: Option<String>,
        mutation: BalanceMutation,
    ) -> Result<LedgerOutcome>;

    /// Retrieves a record by id.
    fn get(&self, redemption_id: &str) -> Result<RedemptionRecord>;

    /// Records stuck in-progress; these need manual reconciliation.
    fn list_in_progress(&self) -> Result<Vec<RedemptionRecord>>;
}

/// Trait defining the contract for the redemption orchestrator.
#[async_trait]
pub trait RedemptionServiceTrait: Send + Sync {
    /// Validates and accepts a redemption request. The caller gets the
    /// pending record back immediately; the debit and the automation run
    /// happen in a background task and the result arrives as a domain event.
    async fn request_redemption(&self, request: RedemptionRequest) -> Result<RedemptionRecord>;

    /// Retrieves a record by id.
    fn get_redemption(&self, redemption_id: &str) -> Result<RedemptionRecord>;

    /// Open records whose automation outcome is unknown.
    fn list_stalled(&self) -> Result<Vec<RedemptionRecord>>;
}
