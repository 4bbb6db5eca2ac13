//! Ledger service: validation, reference derivation, event emission.

use chrono::Utc;
use log::{info, warn};
use rust_decimal::Decimal;
use std::sync::Arc;

use super::idempotency;
use super::ledger_model::{BalanceMutation, LedgerEntry, LedgerOutcome, TransactionKind};
use super::ledger_traits::{LedgerRepositoryTrait, LedgerServiceTrait};
use crate::events::{DomainEvent, DomainEventSink};
use crate::ledger::LedgerError;
use crate::Result;

/// Service wrapping the balance mutator repository.
pub struct LedgerService {
    repository: Arc<dyn LedgerRepositoryTrait>,
    events: Arc<dyn DomainEventSink>,
}

impl LedgerService {
    pub fn new(repository: Arc<dyn LedgerRepositoryTrait>, events: Arc<dyn DomainEventSink>) -> Self {
        Self { repository, events }
    }

    async fn apply(&self, mutation: BalanceMutation) -> Result<LedgerOutcome> {
        mutation.validate()?;

        let group_ref = mutation.group_ref.clone();
        let kind = mutation.kind;
        let amount = mutation.amount;
        let reference = mutation.reference.clone();

        let outcome = self.repository.apply(mutation).await?;

        match &outcome {
            LedgerOutcome::Applied { new_balance, .. } => {
                info!(
                    "Applied {} of {} to group {}, new balance {}",
                    kind, amount, group_ref, new_balance
                );
                self.events.emit(DomainEvent::balance_changed(
                    group_ref,
                    kind,
                    amount,
                    *new_balance,
                    reference,
                ));
            }
            LedgerOutcome::Duplicate { reference } => {
                warn!(
                    "Skipped {} for group {}: reference {} already applied",
                    kind, group_ref, reference
                );
            }
        }

        Ok(outcome)
    }
}

#[async_trait::async_trait]
impl LedgerServiceTrait for LedgerService {
    async fn credit_deposit(
        &self,
        group_ref: &str,
        amount: Decimal,
        transfer_id: &str,
        description: &str,
    ) -> Result<LedgerOutcome> {
        if amount <= Decimal::ZERO {
            return Err(
                LedgerError::InvalidAmount(format!("deposit must be positive, got {}", amount))
                    .into(),
            );
        }

        self.apply(BalanceMutation {
            group_ref: group_ref.to_string(),
            amount,
            kind: TransactionKind::Deposit,
            reference: Some(idempotency::deposit_reference(transfer_id)),
            description: description.to_string(),
            operator: crate::constants::OPERATOR_EMAIL_RECONCILIATION.to_string(),
            member_ref: None,
        })
        .await
    }

    async fn debit_redemption(
        &self,
        group_ref: &str,
        member_ref: Option<&str>,
        token_cost: Decimal,
        redemption_id: &str,
        description: &str,
    ) -> Result<LedgerOutcome> {
        if token_cost <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount(format!(
                "redemption cost must be positive, got {}",
                token_cost
            ))
            .into());
        }

        self.apply(BalanceMutation {
            group_ref: group_ref.to_string(),
            amount: -token_cost,
            kind: TransactionKind::RedemptionDebit,
            reference: Some(idempotency::redemption_reference(redemption_id)),
            description: description.to_string(),
            operator: crate::constants::OPERATOR_REDEMPTION.to_string(),
            member_ref: member_ref.map(String::from),
        })
        .await
    }

    async fn manual_adjust(
        &self,
        group_ref: &str,
        member_ref: Option<&str>,
        amount: Decimal,
        operator: &str,
        description: &str,
    ) -> Result<LedgerOutcome> {
        let kind = if amount.is_sign_positive() {
            TransactionKind::ManualCredit
        } else {
            TransactionKind::ManualDebit
        };

        self.apply(BalanceMutation {
            group_ref: group_ref.to_string(),
            amount,
            kind,
            reference: Some(idempotency::manual_reference(operator, Utc::now())),
            description: description.to_string(),
            operator: operator.to_string(),
            member_ref: member_ref.map(String::from),
        })
        .await
    }

    fn get_balance(&self, group_ref: &str) -> Result<Decimal> {
        self.repository.get_balance(group_ref)
    }

    fn get_history(&self, group_ref: &str, limit: Option<i64>) -> Result<Vec<LedgerEntry>> {
        self.repository.get_entries(group_ref, limit)
    }
}
