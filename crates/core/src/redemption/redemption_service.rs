//! Redemption orchestrator and its background settlement worker.
//!
//! The interactive path only validates and enqueues; the worker owns the
//! automation run and the ledger settlement. Debit happens strictly after the
//! automation reports success, in the same transaction that completes the
//! record.

use log::{error, info, warn};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

use super::redemption_model::{NewRedemption, RedemptionRecord, RedemptionRequest};
use super::redemption_traits::{
    AutomationExecutorTrait, RedemptionRepositoryTrait, RedemptionServiceTrait,
};
use crate::constants::OPERATOR_REDEMPTION;
use crate::events::{DomainEvent, DomainEventSink};
use crate::groups::{GroupError, GroupRepositoryTrait};
use crate::ledger::{
    redemption_reference, BalanceMutation, LedgerError, LedgerOutcome, LedgerRepositoryTrait,
    TransactionKind,
};
use crate::{Error, Result};

/// Attempts at the settlement transaction after a successful automation run.
/// The debit reference makes every retry side-effect-free.
const SETTLEMENT_ATTEMPTS: u32 = 3;

/// Orchestrates redemption requests.
pub struct RedemptionService {
    repository: Arc<dyn RedemptionRepositoryTrait>,
    groups: Arc<dyn GroupRepositoryTrait>,
    ledger: Arc<dyn LedgerRepositoryTrait>,
    executor: Arc<dyn AutomationExecutorTrait>,
    events: Arc<dyn DomainEventSink>,
    automation_timeout: Duration,
}

impl RedemptionService {
    pub fn new(
        repository: Arc<dyn RedemptionRepositoryTrait>,
        groups: Arc<dyn GroupRepositoryTrait>,
        ledger: Arc<dyn LedgerRepositoryTrait>,
        executor: Arc<dyn AutomationExecutorTrait>,
        events: Arc<dyn DomainEventSink>,
        automation_timeout: Duration,
    ) -> Self {
        Self {
            repository,
            groups,
            ledger,
            executor,
            events,
            automation_timeout,
        }
    }

    fn worker(&self) -> RedemptionWorker {
        RedemptionWorker {
            repository: self.repository.clone(),
            ledger: self.ledger.clone(),
            executor: self.executor.clone(),
            events: self.events.clone(),
            automation_timeout: self.automation_timeout,
        }
    }
}

#[async_trait::async_trait]
impl RedemptionServiceTrait for RedemptionService {
    async fn request_redemption(&self, request: RedemptionRequest) -> Result<RedemptionRecord> {
        request.validate()?;

        let group = self.groups.get_by_external_id(&request.group_ref)?;
        if !group.is_active {
            return Err(GroupError::Inactive(request.group_ref).into());
        }

        // Read-only pre-check. The authoritative non-negativity check happens
        // again inside the debit transaction; this one keeps obviously
        // unfundable requests from ever dispatching a worker.
        let balance = self.ledger.get_balance(&request.group_ref)?;
        if balance < request.token_cost {
            return Err(LedgerError::InsufficientBalance {
                balance,
                requested: request.token_cost,
                shortfall: request.token_cost - balance,
            }
            .into());
        }

        self.groups.upsert_member(request.actor.clone()).await?;

        let record = self
            .repository
            .insert(NewRedemption {
                group_ref: request.group_ref.clone(),
                member_ref: request.actor.external_id.clone(),
                target_account: request.target_account.clone(),
                token_cost: request.token_cost,
                params: request.params.clone(),
            })
            .await?;

        info!(
            "Accepted redemption {} for group {}: {} tokens to {}",
            record.id, record.group_ref, record.token_cost, record.target_account
        );
        self.events.emit(DomainEvent::redemption_accepted(
            record.id.clone(),
            record.group_ref.clone(),
            record.token_cost,
        ));

        let worker = self.worker();
        let background_record = record.clone();
        tokio::spawn(async move {
            worker.settle(background_record).await;
        });

        Ok(record)
    }

    fn get_redemption(&self, redemption_id: &str) -> Result<RedemptionRecord> {
        self.repository.get(redemption_id)
    }

    fn list_stalled(&self) -> Result<Vec<RedemptionRecord>> {
        self.repository.list_in_progress()
    }
}

/// Background settlement worker for one redemption.
///
/// Once the executor has been invoked there is no cancellation path; a
/// timeout means the outcome is unknown, not failed.
#[derive(Clone)]
pub struct RedemptionWorker {
    repository: Arc<dyn RedemptionRepositoryTrait>,
    ledger: Arc<dyn LedgerRepositoryTrait>,
    executor: Arc<dyn AutomationExecutorTrait>,
    events: Arc<dyn DomainEventSink>,
    automation_timeout: Duration,
}

impl RedemptionWorker {
    pub fn new(
        repository: Arc<dyn RedemptionRepositoryTrait>,
        ledger: Arc<dyn LedgerRepositoryTrait>,
        executor: Arc<dyn AutomationExecutorTrait>,
        events: Arc<dyn DomainEventSink>,
        automation_timeout: Duration,
    ) -> Self {
        Self {
            repository,
            ledger,
            executor,
            events,
            automation_timeout,
        }
    }

    /// Runs the automation and reconciles the ledger with its outcome.
    pub async fn settle(&self, record: RedemptionRecord) {
        if let Err(err) = self.repository.mark_in_progress(&record.id).await {
            error!(
                "Could not mark redemption {} in progress: {}",
                record.id, err
            );
            return;
        }

        let run = tokio::time::timeout(
            self.automation_timeout,
            self.executor
                .run(&record.target_account, record.token_cost, &record.params),
        )
        .await;

        match run {
            Err(_elapsed) => {
                // The run may have completed on the remote side despite the
                // local timeout; the side effect cannot be assumed either way.
                self.stall(
                    &record,
                    format!(
                        "automation timed out after {}s",
                        self.automation_timeout.as_secs()
                    ),
                );
            }
            Ok(Err(err)) => {
                self.stall(&record, format!("automation transport error: {}", err));
            }
            Ok(Ok(outcome)) if outcome.success => {
                self.commit_debit(&record, outcome.external_ref).await;
            }
            Ok(Ok(outcome)) => {
                self.fail(&record, outcome.detail).await;
            }
        }
    }

    async fn commit_debit(&self, record: &RedemptionRecord, external_ref: Option<String>) {
        let mutation = BalanceMutation {
            group_ref: record.group_ref.clone(),
            amount: -record.token_cost,
            kind: TransactionKind::RedemptionDebit,
            reference: Some(redemption_reference(&record.id)),
            description: format!("Redemption for {}", record.target_account),
            operator: OPERATOR_REDEMPTION.to_string(),
            member_ref: Some(record.member_ref.clone()),
        };

        let mut last_error: Option<Error> = None;
        for attempt in 1..=SETTLEMENT_ATTEMPTS {
            match self
                .repository
                .complete_with_debit(&record.id, external_ref.clone(), mutation.clone())
                .await
            {
                Ok(outcome) => {
                    let new_balance = match outcome {
                        LedgerOutcome::Applied { new_balance, .. } => new_balance,
                        LedgerOutcome::Duplicate { .. } => self
                            .ledger
                            .get_balance(&record.group_ref)
                            .unwrap_or(Decimal::ZERO),
                    };
                    info!(
                        "Redemption {} completed, group {} balance {}",
                        record.id, record.group_ref, new_balance
                    );
                    self.events.emit(DomainEvent::redemption_completed(
                        record.id.clone(),
                        record.group_ref.clone(),
                        new_balance,
                        external_ref,
                    ));
                    return;
                }
                Err(err @ Error::Ledger(LedgerError::InsufficientBalance { .. })) => {
                    // Value was delivered but the balance raced below the
                    // pre-checked cost. The ledger must not go negative, so
                    // this is operator territory.
                    self.stall(record, format!("debit rejected after delivery: {}", err));
                    return;
                }
                Err(err) => {
                    warn!(
                        "Settlement attempt {}/{} for redemption {} failed: {}",
                        attempt, SETTLEMENT_ATTEMPTS, record.id, err
                    );
                    last_error = Some(err);
                }
            }
        }

        let detail = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "settlement failed".to_string());
        self.stall(record, format!("settlement exhausted retries: {}", detail));
    }

    async fn fail(&self, record: &RedemptionRecord, reason: String) {
        warn!("Redemption {} failed: {}", record.id, reason);
        if let Err(err) = self.repository.mark_failed(&record.id, &reason).await {
            // The record stays in-progress and will surface as stalled.
            error!(
                "Could not mark redemption {} failed: {}",
                record.id, err
            );
            self.stall(record, format!("failure bookkeeping error: {}", err));
            return;
        }
        self.events.emit(DomainEvent::redemption_failed(
            record.id.clone(),
            record.group_ref.clone(),
            reason,
        ));
    }

    fn stall(&self, record: &RedemptionRecord, detail: String) {
        error!(
            "Redemption {} is stalled and needs manual reconciliation: {}",
            record.id, detail
        );
        self.events.emit(DomainEvent::redemption_stalled(
            record.id.clone(),
            record.group_ref.clone(),
            detail,
        ));
    }
}
