//! Database model for email reconciliation records.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use tokenbank_core::reconciliation::{EmailReconciliationRecord, ProcessingStatus};

use crate::utils::{parse_datetime_tolerant, parse_decimal_tolerant};

/// Database model for email reconciliation records
#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::email_reconciliation_records)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct EmailReconciliationRecordDB {
    pub id: String,
    pub group_id: Option<String>,
    pub subject: String,
    pub sender: String,
    pub transfer_amount: String,
    pub transfer_id: String,
    pub transfer_time: Option<String>,
    pub status: String,
    pub tokens_credited: String,
    pub error_message: Option<String>,
    pub processed_at: Option<String>,
    pub created_at: String,
}

impl From<EmailReconciliationRecordDB> for EmailReconciliationRecord {
    fn from(db: EmailReconciliationRecordDB) -> Self {
        let status = ProcessingStatus::from_str(&db.status).unwrap_or_else(|_| {
            log::error!(
                "Unknown processing status '{}' on record {}",
                db.status,
                db.id
            );
            ProcessingStatus::Pending
        });

        Self {
            id: db.id,
            group_id: db.group_id,
            subject: db.subject,
            sender: db.sender,
            transfer_amount: parse_decimal_tolerant(
                &db.transfer_amount,
                "email_reconciliation_records.transfer_amount",
            ),
            transfer_id: db.transfer_id,
            transfer_time: db
                .transfer_time
                .as_deref()
                .map(|t| parse_datetime_tolerant(t, "email_reconciliation_records.transfer_time")),
            status,
            tokens_credited: parse_decimal_tolerant(
                &db.tokens_credited,
                "email_reconciliation_records.tokens_credited",
            ),
            error_message: db.error_message,
            processed_at: db
                .processed_at
                .as_deref()
                .map(|t| parse_datetime_tolerant(t, "email_reconciliation_records.processed_at")),
            created_at: parse_datetime_tolerant(
                &db.created_at,
                "email_reconciliation_records.created_at",
            ),
        }
    }
}
