//! Email reconciliation pipeline service.
//!
//! Per-email state machine: fetched -> parsed|rejected -> (unmatched |
//! matched) -> (success | failed | duplicate). Every considered notification
//! leaves a durable record; only an unexpected store failure leaves the
//! source email unconsumed for a later retry.

use chrono::{Duration, Utc};
use log::{error, info, warn};
use std::sync::Arc;

use super::reconciliation_model::{
    CreditResult, EmailOutcome, EmailReconciliationRecord, InboundEmail, NewReconciliationRecord,
    ProcessingStatus, ReconciliationReport, TransferNotice,
};
use super::reconciliation_traits::{
    MailboxReaderTrait, ReconciliationRepositoryTrait, ReconciliationServiceTrait,
};
use super::parser;
use crate::constants::OPERATOR_EMAIL_RECONCILIATION;
use crate::events::{DomainEvent, DomainEventSink};
use crate::groups::GroupRepositoryTrait;
use crate::ledger::{deposit_reference, BalanceMutation, TransactionKind};
use crate::{DatabaseError, Error, Result};

/// Longest slice of the subject carried into ledger descriptions.
const DESCRIPTION_SUBJECT_LIMIT: usize = 80;

/// Service running the email reconciliation pipeline.
pub struct ReconciliationService {
    mailbox: Arc<dyn MailboxReaderTrait>,
    repository: Arc<dyn ReconciliationRepositoryTrait>,
    groups: Arc<dyn GroupRepositoryTrait>,
    events: Arc<dyn DomainEventSink>,
    lookback_hours: i64,
}

impl ReconciliationService {
    pub fn new(
        mailbox: Arc<dyn MailboxReaderTrait>,
        repository: Arc<dyn ReconciliationRepositoryTrait>,
        groups: Arc<dyn GroupRepositoryTrait>,
        events: Arc<dyn DomainEventSink>,
        lookback_hours: i64,
    ) -> Self {
        Self {
            mailbox,
            repository,
            groups,
            events,
            lookback_hours,
        }
    }

    /// Processes one inbound email through the full state machine.
    pub async fn process_email(&self, email: &InboundEmail) -> EmailOutcome {
        let notice = match parser::parse_transfer_notice(&email.subject, &email.sender, &email.body)
        {
            Some(notice) => notice,
            None => {
                // Not a transfer notification; consume so it is not refetched
                // forever.
                self.consume(email).await;
                return EmailOutcome::Rejected;
            }
        };

        match self.reconcile(email, &notice).await {
            Ok(outcome) => {
                self.consume(email).await;
                outcome
            }
            Err(err) => {
                // Store failure: leave the email unconsumed; the unique
                // transfer id makes the retry safe.
                error!(
                    "Deferred email {} (transfer {}): {}",
                    email.id, notice.transfer_id, err
                );
                EmailOutcome::Deferred {
                    error: err.to_string(),
                }
            }
        }
    }

    /// Parse succeeded; dedupe, match, and credit. Errors bubbling out of
    /// here are store failures and defer the email.
    async fn reconcile(
        &self,
        email: &InboundEmail,
        notice: &TransferNotice,
    ) -> Result<EmailOutcome> {
        let existing = self.repository.find_by_transfer_id(&notice.transfer_id)?;
        if let Some(ref record) = existing {
            if record.status != ProcessingStatus::Pending {
                warn!("Transfer {} already processed", notice.transfer_id);
                return Ok(EmailOutcome::Duplicate);
            }
            // A pending record is a credit that a store failure interrupted
            // on an earlier pass; resume it instead of treating the refetch
            // as a duplicate.
        }

        let (group_id, group_ref) = match self.resolve_group(notice)? {
            GroupMatch::Unique(group_id, group_ref) => (group_id, group_ref),
            GroupMatch::None(reason) => {
                match existing {
                    // Matched on an earlier pass but not resolvable anymore.
                    Some(record) => {
                        self.repository
                            .mark_processed(
                                &record.id,
                                ProcessingStatus::Failed,
                                Some(reason.clone()),
                            )
                            .await?;
                        warn!(
                            "Pending transfer {} no longer resolves: {}",
                            notice.transfer_id, reason
                        );
                    }
                    None => self.record_unmatched(email, notice, reason).await?,
                }
                return Ok(EmailOutcome::Unmatched);
            }
        };

        let record = match existing {
            Some(record) => record,
            None => match self
                .repository
                .insert(NewReconciliationRecord {
                    group_id: Some(group_id),
                    subject: email.subject.clone(),
                    sender: email.sender.clone(),
                    transfer_amount: notice.amount,
                    transfer_id: notice.transfer_id.clone(),
                    transfer_time: notice.transfer_time,
                    status: ProcessingStatus::Pending,
                    error_message: None,
                })
                .await
            {
                Ok(record) => record,
                // Lost an insert race on the unique transfer id.
                Err(Error::Database(DatabaseError::UniqueViolation(_))) => {
                    return Ok(EmailOutcome::Duplicate);
                }
                Err(err) => return Err(err),
            },
        };

        let mutation = BalanceMutation {
            group_ref: group_ref.clone(),
            amount: notice.amount,
            kind: TransactionKind::Deposit,
            reference: Some(deposit_reference(&notice.transfer_id)),
            description: credit_description(&email.subject),
            operator: OPERATOR_EMAIL_RECONCILIATION.to_string(),
            member_ref: None,
        };

        match self
            .repository
            .settle_with_credit(&record.id, mutation)
            .await?
        {
            CreditResult::Credited { new_balance } => {
                info!(
                    "Reconciled transfer {} for group {}: +{} -> {}",
                    notice.transfer_id, group_ref, notice.amount, new_balance
                );
                self.events.emit(DomainEvent::deposit_reconciled(
                    group_ref.clone(),
                    notice.amount,
                    notice.transfer_id.clone(),
                    new_balance,
                ));
                Ok(EmailOutcome::Credited {
                    group_ref,
                    new_balance,
                })
            }
            CreditResult::Duplicate => Ok(EmailOutcome::Duplicate),
            CreditResult::Failed { error } => {
                warn!(
                    "Credit for transfer {} failed: {}",
                    notice.transfer_id, error
                );
                Ok(EmailOutcome::Failed { error })
            }
        }
    }

    fn resolve_group(&self, notice: &TransferNotice) -> Result<GroupMatch> {
        let code = match &notice.group_code {
            Some(code) => code,
            None => return Ok(GroupMatch::None("no group code in message".to_string())),
        };

        let mut candidates = self.groups.find_active_by_code(code)?;
        match candidates.len() {
            1 => {
                let group = candidates.remove(0);
                Ok(GroupMatch::Unique(group.id, group.external_id))
            }
            0 => Ok(GroupMatch::None(format!(
                "no active group matches code {}",
                code
            ))),
            n => Ok(GroupMatch::None(format!(
                "group code {} is ambiguous ({} candidates)",
                code, n
            ))),
        }
    }

    async fn record_unmatched(
        &self,
        email: &InboundEmail,
        notice: &TransferNotice,
        reason: String,
    ) -> Result<()> {
        warn!(
            "Unmatched transfer {}: {}",
            notice.transfer_id, reason
        );
        match self
            .repository
            .insert(NewReconciliationRecord {
                group_id: None,
                subject: email.subject.clone(),
                sender: email.sender.clone(),
                transfer_amount: notice.amount,
                transfer_id: notice.transfer_id.clone(),
                transfer_time: notice.transfer_time,
                status: ProcessingStatus::Unmatched,
                error_message: Some(reason),
            })
            .await
        {
            Ok(_) => {
                self.events.emit(DomainEvent::deposit_unmatched(
                    notice.transfer_id.clone(),
                    notice.amount,
                ));
                Ok(())
            }
            // Another poll already recorded it.
            Err(Error::Database(DatabaseError::UniqueViolation(_))) => Ok(()),
            Err(err) => Err(err),
        }
    }

    async fn consume(&self, email: &InboundEmail) {
        if let Err(err) = self.mailbox.mark_consumed(&email.id).await {
            // The durable record and the unique transfer id keep a refetch
            // harmless; just log it.
            warn!("Failed to mark email {} consumed: {}", email.id, err);
        }
    }
}

enum GroupMatch {
    Unique(String, String),
    None(String),
}

fn credit_description(subject: &str) -> String {
    let trimmed: String = subject.chars().take(DESCRIPTION_SUBJECT_LIMIT).collect();
    format!("Email reconciliation: {}", trimmed)
}

#[async_trait::async_trait]
impl ReconciliationServiceTrait for ReconciliationService {
    async fn poll_once(&self) -> Result<ReconciliationReport> {
        let since = Utc::now() - Duration::hours(self.lookback_hours);
        let emails = self.mailbox.fetch_unread(since).await?;

        let mut report = ReconciliationReport {
            fetched: emails.len(),
            ..Default::default()
        };

        for email in &emails {
            let outcome = self.process_email(email).await;
            report.record(&outcome);
        }

        info!(
            "Reconciliation pass: {} fetched, {} credited, {} duplicates, {} unmatched, {} rejected, {} failed",
            report.fetched,
            report.credited,
            report.duplicates,
            report.unmatched,
            report.rejected,
            report.failed
        );
        Ok(report)
    }

    fn list_unmatched(&self) -> Result<Vec<EmailReconciliationRecord>> {
        self.repository.list_unmatched()
    }
}
