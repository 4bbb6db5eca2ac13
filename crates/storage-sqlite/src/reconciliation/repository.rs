//! Reconciliation-record repository backed by SQLite.

use async_trait::async_trait;
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use tokenbank_core::ledger::{BalanceMutation, LedgerOutcome};
use tokenbank_core::reconciliation::{
    CreditResult, EmailReconciliationRecord, NewReconciliationRecord, ProcessingStatus,
    ReconciliationError, ReconciliationRepositoryTrait,
};
use tokenbank_core::{Error, Result};

use super::model::EmailReconciliationRecordDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::ledger::repository::apply_mutation;
use crate::schema::email_reconciliation_records;
use crate::utils::{format_datetime, format_decimal, now_string};

pub struct ReconciliationRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl ReconciliationRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl ReconciliationRepositoryTrait for ReconciliationRepository {
    fn find_by_transfer_id(&self, transfer_id: &str) -> Result<Option<EmailReconciliationRecord>> {
        let mut conn = get_connection(&self.pool)?;
        let row = email_reconciliation_records::table
            .filter(email_reconciliation_records::transfer_id.eq(transfer_id))
            .select(EmailReconciliationRecordDB::as_select())
            .first::<EmailReconciliationRecordDB>(&mut conn)
            .optional()
            .into_core()?;
        Ok(row.map(EmailReconciliationRecord::from))
    }

    async fn insert(&self, record: NewReconciliationRecord) -> Result<EmailReconciliationRecord> {
        self.writer
            .exec(move |conn| {
                let row = EmailReconciliationRecordDB {
                    id: Uuid::new_v4().to_string(),
                    group_id: record.group_id.clone(),
                    subject: record.subject.clone(),
                    sender: record.sender.clone(),
                    transfer_amount: format_decimal(record.transfer_amount),
                    transfer_id: record.transfer_id.clone(),
                    transfer_time: record.transfer_time.map(format_datetime),
                    status: record.status.as_str().to_string(),
                    tokens_credited: "0".to_string(),
                    error_message: record.error_message.clone(),
                    processed_at: match record.status {
                        // Terminal on arrival (unmatched) is processed now.
                        ProcessingStatus::Pending => None,
                        _ => Some(now_string()),
                    },
                    created_at: now_string(),
                };
                diesel::insert_into(email_reconciliation_records::table)
                    .values(&row)
                    .execute(conn)
                    .into_core()?;
                Ok(EmailReconciliationRecord::from(row))
            })
            .await
    }

    async fn settle_with_credit(
        &self,
        record_id: &str,
        mutation: BalanceMutation,
    ) -> Result<CreditResult> {
        let record_id = record_id.to_string();
        self.writer
            .exec(move |conn| {
                // One transaction: the deposit and the record's terminal
                // status commit or roll back together.
                let (status, tokens_credited, error_message, result) =
                    match apply_mutation(conn, &mutation) {
                        Ok(LedgerOutcome::Applied { new_balance, .. }) => (
                            ProcessingStatus::Success,
                            Some(mutation.amount),
                            None,
                            CreditResult::Credited { new_balance },
                        ),
                        Ok(LedgerOutcome::Duplicate { .. }) => (
                            ProcessingStatus::Duplicate,
                            None,
                            None,
                            CreditResult::Duplicate,
                        ),
                        // Mutator-level rejections are terminal for the
                        // record; store failures roll everything back.
                        Err(Error::Ledger(err)) => {
                            let message = err.to_string();
                            (
                                ProcessingStatus::Failed,
                                None,
                                Some(message.clone()),
                                CreditResult::Failed { error: message },
                            )
                        }
                        Err(other) => return Err(other),
                    };

                let updated = diesel::update(email_reconciliation_records::table.find(&record_id))
                    .set((
                        email_reconciliation_records::status.eq(status.as_str()),
                        email_reconciliation_records::tokens_credited
                            .eq(format_decimal(tokens_credited.unwrap_or_default())),
                        email_reconciliation_records::error_message.eq(error_message),
                        email_reconciliation_records::processed_at.eq(Some(now_string())),
                    ))
                    .execute(conn)
                    .into_core()?;
                if updated == 0 {
                    return Err(ReconciliationError::RecordNotFound(record_id.clone()).into());
                }

                Ok(result)
            })
            .await
    }

    async fn mark_processed(
        &self,
        record_id: &str,
        status: ProcessingStatus,
        error_message: Option<String>,
    ) -> Result<()> {
        let record_id = record_id.to_string();
        self.writer
            .exec(move |conn| {
                let updated = diesel::update(email_reconciliation_records::table.find(&record_id))
                    .set((
                        email_reconciliation_records::status.eq(status.as_str()),
                        email_reconciliation_records::error_message.eq(error_message.clone()),
                        email_reconciliation_records::processed_at.eq(Some(now_string())),
                    ))
                    .execute(conn)
                    .into_core()?;
                if updated == 0 {
                    return Err(ReconciliationError::RecordNotFound(record_id.clone()).into());
                }
                Ok(())
            })
            .await
    }

    fn list_unmatched(&self) -> Result<Vec<EmailReconciliationRecord>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = email_reconciliation_records::table
            .filter(
                email_reconciliation_records::status.eq(ProcessingStatus::Unmatched.as_str()),
            )
            .select(EmailReconciliationRecordDB::as_select())
            .order(email_reconciliation_records::created_at.asc())
            .load::<EmailReconciliationRecordDB>(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(EmailReconciliationRecord::from).collect())
    }
}
