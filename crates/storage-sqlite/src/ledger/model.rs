//! Database model for ledger entries.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use tokenbank_core::ledger::{LedgerEntry, TransactionKind};

use crate::utils::{parse_datetime_tolerant, parse_decimal_tolerant};

/// Database model for ledger entries
#[derive(
    Queryable,
    Identifiable,
    Insertable,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::ledger_entries)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct LedgerEntryDB {
    pub id: String,
    pub group_id: String,
    pub member_id: Option<String>,
    pub kind: String,
    pub amount: String,
    pub balance_before: String,
    pub balance_after: String,
    pub reference: Option<String>,
    pub description: String,
    pub operator: String,
    pub created_at: String,
}

impl From<LedgerEntryDB> for LedgerEntry {
    fn from(db: LedgerEntryDB) -> Self {
        let kind = TransactionKind::from_str(&db.kind).unwrap_or_else(|_| {
            // An unknown kind in storage means the closed set drifted; treat
            // it as a manual adjustment rather than dropping the row.
            log::error!("Unknown transaction kind '{}' on entry {}", db.kind, db.id);
            if db.amount.starts_with('-') {
                TransactionKind::ManualDebit
            } else {
                TransactionKind::ManualCredit
            }
        });

        Self {
            id: db.id,
            group_id: db.group_id,
            member_id: db.member_id,
            kind,
            amount: parse_decimal_tolerant(&db.amount, "ledger_entries.amount"),
            balance_before: parse_decimal_tolerant(
                &db.balance_before,
                "ledger_entries.balance_before",
            ),
            balance_after: parse_decimal_tolerant(
                &db.balance_after,
                "ledger_entries.balance_after",
            ),
            reference: db.reference,
            description: db.description,
            operator: db.operator,
            created_at: parse_datetime_tolerant(&db.created_at, "ledger_entries.created_at"),
        }
    }
}
