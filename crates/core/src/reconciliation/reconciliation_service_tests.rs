use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::events::{DomainEvent, MockDomainEventSink};
use crate::groups::{Group, GroupInfo, GroupRepositoryTrait, NewGroup, NewMember};
use crate::ledger::BalanceMutation;
use crate::reconciliation::{
    CreditResult, EmailOutcome, EmailReconciliationRecord, InboundEmail, MailboxReaderTrait,
    NewReconciliationRecord, ProcessingStatus, ReconciliationRepositoryTrait,
    ReconciliationService, ReconciliationServiceTrait,
};
use crate::{DatabaseError, Result};

// --- Mock mailbox ---

#[derive(Default)]
struct MockMailbox {
    emails: Mutex<Vec<InboundEmail>>,
    consumed: Mutex<HashSet<String>>,
}

impl MockMailbox {
    fn push(&self, email: InboundEmail) {
        self.emails.lock().unwrap().push(email);
    }

    fn is_consumed(&self, email_id: &str) -> bool {
        self.consumed.lock().unwrap().contains(email_id)
    }
}

#[async_trait]
impl MailboxReaderTrait for MockMailbox {
    async fn fetch_unread(&self, _since: DateTime<Utc>) -> Result<Vec<InboundEmail>> {
        let consumed = self.consumed.lock().unwrap();
        Ok(self
            .emails
            .lock()
            .unwrap()
            .iter()
            .filter(|e| !consumed.contains(&e.id))
            .cloned()
            .collect())
    }

    async fn mark_consumed(&self, email_id: &str) -> Result<()> {
        self.consumed.lock().unwrap().insert(email_id.to_string());
        Ok(())
    }
}

// --- Mock repository with a miniature ledger behind it ---

#[derive(Default)]
struct MockReconciliationRepository {
    records: Mutex<Vec<EmailReconciliationRecord>>,
    balances: Mutex<HashMap<String, Decimal>>,
    references: Mutex<HashSet<String>>,
    fail_settle: AtomicBool,
}

impl MockReconciliationRepository {
    fn with_group_balance(group_ref: &str, balance: Decimal) -> Self {
        let repo = Self::default();
        repo.balances
            .lock()
            .unwrap()
            .insert(group_ref.to_string(), balance);
        repo
    }

    fn balance(&self, group_ref: &str) -> Decimal {
        *self.balances.lock().unwrap().get(group_ref).unwrap()
    }

    fn record_by_transfer(&self, transfer_id: &str) -> Option<EmailReconciliationRecord> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.transfer_id == transfer_id)
            .cloned()
    }
}

#[async_trait]
impl ReconciliationRepositoryTrait for MockReconciliationRepository {
    fn find_by_transfer_id(&self, transfer_id: &str) -> Result<Option<EmailReconciliationRecord>> {
        Ok(self.record_by_transfer(transfer_id))
    }

    async fn insert(&self, record: NewReconciliationRecord) -> Result<EmailReconciliationRecord> {
        let mut records = self.records.lock().unwrap();
        if records.iter().any(|r| r.transfer_id == record.transfer_id) {
            return Err(
                DatabaseError::UniqueViolation(format!("transfer_id {}", record.transfer_id))
                    .into(),
            );
        }
        let stored = EmailReconciliationRecord {
            id: format!("record-{}", records.len()),
            group_id: record.group_id,
            subject: record.subject,
            sender: record.sender,
            transfer_amount: record.transfer_amount,
            transfer_id: record.transfer_id,
            transfer_time: record.transfer_time,
            status: record.status,
            tokens_credited: Decimal::ZERO,
            error_message: record.error_message,
            processed_at: None,
            created_at: Utc::now(),
        };
        records.push(stored.clone());
        Ok(stored)
    }

    async fn settle_with_credit(
        &self,
        record_id: &str,
        mutation: BalanceMutation,
    ) -> Result<CreditResult> {
        if self.fail_settle.load(Ordering::SeqCst) {
            return Err(DatabaseError::TransactionFailed("disk full".to_string()).into());
        }

        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.id == record_id)
            .expect("record exists");

        let reference = mutation.reference.clone().expect("deposit has reference");
        if !self.references.lock().unwrap().insert(reference) {
            record.status = ProcessingStatus::Duplicate;
            record.processed_at = Some(Utc::now());
            return Ok(CreditResult::Duplicate);
        }

        let mut balances = self.balances.lock().unwrap();
        let balance = balances
            .get_mut(&mutation.group_ref)
            .expect("group balance exists");
        *balance += mutation.amount;

        record.status = ProcessingStatus::Success;
        record.tokens_credited = mutation.amount;
        record.processed_at = Some(Utc::now());
        Ok(CreditResult::Credited {
            new_balance: *balance,
        })
    }

    async fn mark_processed(
        &self,
        record_id: &str,
        status: ProcessingStatus,
        error_message: Option<String>,
    ) -> Result<()> {
        let mut records = self.records.lock().unwrap();
        if let Some(record) = records.iter_mut().find(|r| r.id == record_id) {
            record.status = status;
            record.error_message = error_message;
            record.processed_at = Some(Utc::now());
        }
        Ok(())
    }

    fn list_unmatched(&self) -> Result<Vec<EmailReconciliationRecord>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.status == ProcessingStatus::Unmatched)
            .cloned()
            .collect())
    }
}

// --- Mock group repository (only the matching path is exercised) ---

#[derive(Default)]
struct MockGroupRepository {
    groups: Mutex<Vec<Group>>,
}

impl MockGroupRepository {
    fn with_groups(external_ids: &[&str]) -> Self {
        let repo = Self::default();
        let now = Utc::now();
        let mut groups = repo.groups.lock().unwrap();
        for external_id in external_ids {
            groups.push(Group {
                id: format!("internal-{}", external_id),
                external_id: external_id.to_string(),
                name: external_id.to_string(),
                balance: Decimal::ZERO,
                is_active: true,
                created_at: now,
                updated_at: now,
            });
        }
        drop(groups);
        repo
    }
}

#[async_trait]
impl GroupRepositoryTrait for MockGroupRepository {
    async fn create_with_admin(&self, _new_group: NewGroup, _admin: NewMember) -> Result<Group> {
        unimplemented!()
    }

    fn get_by_external_id(&self, _external_id: &str) -> Result<Group> {
        unimplemented!()
    }

    fn find_by_external_id(&self, _external_id: &str) -> Result<Option<Group>> {
        unimplemented!()
    }

    fn find_active_by_code(&self, code: &str) -> Result<Vec<Group>> {
        Ok(self
            .groups
            .lock()
            .unwrap()
            .iter()
            .filter(|g| g.is_active && g.external_id.contains(code))
            .cloned()
            .collect())
    }

    async fn deactivate(&self, _external_id: &str) -> Result<()> {
        unimplemented!()
    }

    async fn upsert_member(&self, _member: NewMember) -> Result<crate::groups::Member> {
        unimplemented!()
    }

    async fn set_membership_admin(
        &self,
        _group_ref: &str,
        _member_ref: &str,
        _is_admin: bool,
    ) -> Result<()> {
        unimplemented!()
    }

    fn is_admin(&self, _group_ref: &str, _member_ref: &str) -> Result<bool> {
        unimplemented!()
    }

    fn get_group_info(&self, _external_id: &str) -> Result<GroupInfo> {
        unimplemented!()
    }
}

// --- Fixtures ---

fn email(id: &str, body: &str) -> InboundEmail {
    InboundEmail {
        id: id.to_string(),
        subject: "Deposit notification".to_string(),
        sender: "bank@example.com".to_string(),
        received_at: Utc::now(),
        body: body.to_string(),
    }
}

struct Harness {
    mailbox: Arc<MockMailbox>,
    repository: Arc<MockReconciliationRepository>,
    sink: MockDomainEventSink,
    service: ReconciliationService,
}

fn harness(groups: &[&str], repository: MockReconciliationRepository) -> Harness {
    let mailbox = Arc::new(MockMailbox::default());
    let repository = Arc::new(repository);
    let sink = MockDomainEventSink::new();
    let service = ReconciliationService::new(
        mailbox.clone(),
        repository.clone(),
        Arc::new(MockGroupRepository::with_groups(groups)),
        Arc::new(sink.clone()),
        24,
    );
    Harness {
        mailbox,
        repository,
        sink,
        service,
    }
}

const TRANSFER_BODY: &str = "Amount: NT$ 500\nTransaction ID: TX1\nMemo: GROUP-ALPHA";

#[tokio::test]
async fn test_credits_matched_transfer() {
    let h = harness(
        &["ALPHA"],
        MockReconciliationRepository::with_group_balance("ALPHA", dec!(0)),
    );
    let msg = email("m1", TRANSFER_BODY);

    let outcome = h.service.process_email(&msg).await;
    assert_eq!(
        outcome,
        EmailOutcome::Credited {
            group_ref: "ALPHA".to_string(),
            new_balance: dec!(500),
        }
    );
    assert_eq!(h.repository.balance("ALPHA"), dec!(500));
    assert!(h.mailbox.is_consumed("m1"));

    let record = h.repository.record_by_transfer("TX1").unwrap();
    assert_eq!(record.status, ProcessingStatus::Success);
    assert_eq!(record.tokens_credited, dec!(500));

    assert!(h
        .sink
        .events()
        .iter()
        .any(|e| matches!(e, DomainEvent::DepositReconciled { .. })));
}

#[tokio::test]
async fn test_second_email_with_same_transfer_id_is_duplicate() {
    let h = harness(
        &["ALPHA"],
        MockReconciliationRepository::with_group_balance("ALPHA", dec!(0)),
    );

    let first = h.service.process_email(&email("m1", TRANSFER_BODY)).await;
    assert!(matches!(first, EmailOutcome::Credited { .. }));

    let second = h.service.process_email(&email("m2", TRANSFER_BODY)).await;
    assert_eq!(second, EmailOutcome::Duplicate);

    // Credited exactly once.
    assert_eq!(h.repository.balance("ALPHA"), dec!(500));
    assert!(h.mailbox.is_consumed("m2"));
}

#[tokio::test]
async fn test_missing_group_code_is_unmatched() {
    let h = harness(
        &["ALPHA"],
        MockReconciliationRepository::with_group_balance("ALPHA", dec!(0)),
    );
    let msg = email("m1", "Amount: NT$ 500\nTransaction ID: TX2");

    let outcome = h.service.process_email(&msg).await;
    assert_eq!(outcome, EmailOutcome::Unmatched);
    assert_eq!(h.repository.balance("ALPHA"), dec!(0));

    let record = h.repository.record_by_transfer("TX2").unwrap();
    assert_eq!(record.status, ProcessingStatus::Unmatched);
    assert_eq!(record.group_id, None);

    assert!(h
        .sink
        .events()
        .iter()
        .any(|e| matches!(e, DomainEvent::DepositUnmatched { .. })));
}

#[tokio::test]
async fn test_ambiguous_group_code_is_unmatched_not_guessed() {
    let h = harness(
        &["ALPHA", "ALPHA2"],
        MockReconciliationRepository::with_group_balance("ALPHA", dec!(0)),
    );
    let msg = email("m1", TRANSFER_BODY);

    let outcome = h.service.process_email(&msg).await;
    assert_eq!(outcome, EmailOutcome::Unmatched);
    assert_eq!(h.repository.balance("ALPHA"), dec!(0));
}

#[tokio::test]
async fn test_non_notification_is_rejected_and_consumed() {
    let h = harness(&[], MockReconciliationRepository::default());
    let mut msg = email("m1", "see you at lunch?");
    msg.subject = "lunch".to_string();

    let outcome = h.service.process_email(&msg).await;
    assert_eq!(outcome, EmailOutcome::Rejected);
    assert!(h.mailbox.is_consumed("m1"));
    assert!(h.repository.records.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_store_failure_defers_email_for_retry() {
    let h = harness(
        &["ALPHA"],
        MockReconciliationRepository::with_group_balance("ALPHA", dec!(0)),
    );
    h.repository.fail_settle.store(true, Ordering::SeqCst);

    let msg = email("m1", TRANSFER_BODY);
    let outcome = h.service.process_email(&msg).await;
    assert!(matches!(outcome, EmailOutcome::Deferred { .. }));
    assert!(!h.mailbox.is_consumed("m1"));
    assert_eq!(h.repository.balance("ALPHA"), dec!(0));

    // Next poll retries and succeeds.
    h.repository.fail_settle.store(false, Ordering::SeqCst);
    let retry = h.service.process_email(&msg).await;
    assert!(matches!(retry, EmailOutcome::Credited { .. }));
    assert_eq!(h.repository.balance("ALPHA"), dec!(500));
}

#[tokio::test]
async fn test_poll_once_aggregates_outcomes() {
    let h = harness(
        &["ALPHA"],
        MockReconciliationRepository::with_group_balance("ALPHA", dec!(0)),
    );
    h.mailbox.push(email("m1", TRANSFER_BODY));
    h.mailbox
        .push(email("m2", "Amount: NT$ 100\nTransaction ID: TX9"));
    let mut newsletter = email("m3", "hello world");
    newsletter.subject = "newsletter".to_string();
    h.mailbox.push(newsletter);

    let report = h.service.poll_once().await.unwrap();
    assert_eq!(report.fetched, 3);
    assert_eq!(report.credited, 1);
    assert_eq!(report.unmatched, 1);
    assert_eq!(report.rejected, 1);
    assert_eq!(report.duplicates, 0);
    assert_eq!(report.failed, 0);

    // A second poll sees nothing unconsumed.
    let second = h.service.poll_once().await.unwrap();
    assert_eq!(second.fetched, 0);
}
