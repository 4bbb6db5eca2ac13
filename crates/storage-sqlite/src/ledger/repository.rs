//! Ledger repository backed by SQLite.
//!
//! `apply_mutation` is the in-transaction primitive every balance change
//! funnels through; the reconciliation and redemption repositories call it
//! from their own writer jobs so a credit or debit commits atomically with
//! the record status it belongs to.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use tokenbank_core::ledger::{
    BalanceMutation, LedgerEntry, LedgerError, LedgerOutcome, LedgerRepositoryTrait,
};
use tokenbank_core::{Error, Result};

use super::model::LedgerEntryDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::groups::repository::{find_group_by_external_id, find_member_by_external_id};
use crate::schema::{groups, ledger_entries};
use crate::utils::{format_decimal, now_string, parse_decimal_tolerant};

pub struct LedgerRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl LedgerRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

/// Applies one balance mutation on the given connection.
///
/// Must run inside a transaction (the writer actor wraps every job in an
/// immediate transaction): the balance read, the reference check, the
/// non-negativity check, the balance write, and the entry append form one
/// atomic unit. Returning an error rolls the whole transaction back.
pub(crate) fn apply_mutation(
    conn: &mut SqliteConnection,
    mutation: &BalanceMutation,
) -> Result<LedgerOutcome> {
    let group = find_group_by_external_id(conn, &mutation.group_ref)?
        .ok_or_else(|| Error::from(LedgerError::GroupNotFound(mutation.group_ref.clone())))?;
    if !group.is_active {
        return Err(LedgerError::GroupInactive(mutation.group_ref.clone()).into());
    }

    if let Some(ref reference) = mutation.reference {
        let existing: Option<String> = ledger_entries::table
            .filter(ledger_entries::reference.eq(reference))
            .select(ledger_entries::id)
            .first::<String>(conn)
            .optional()
            .into_core()?;
        if existing.is_some() {
            return Ok(LedgerOutcome::Duplicate {
                reference: reference.clone(),
            });
        }
    }

    let balance_before = parse_decimal_tolerant(&group.balance, "groups.balance");
    let balance_after = balance_before + mutation.amount;
    if balance_after < Decimal::ZERO {
        return Err(LedgerError::InsufficientBalance {
            balance: balance_before,
            requested: mutation.amount.abs(),
            shortfall: -balance_after,
        }
        .into());
    }

    let member_id = match &mutation.member_ref {
        Some(member_ref) => {
            find_member_by_external_id(conn, member_ref)?.map(|member| member.id)
        }
        None => None,
    };

    let now = now_string();
    diesel::update(groups::table.find(&group.id))
        .set((
            groups::balance.eq(format_decimal(balance_after)),
            groups::updated_at.eq(&now),
        ))
        .execute(conn)
        .into_core()?;

    let entry_row = LedgerEntryDB {
        id: Uuid::new_v4().to_string(),
        group_id: group.id,
        member_id,
        kind: mutation.kind.as_str().to_string(),
        amount: format_decimal(mutation.amount),
        balance_before: format_decimal(balance_before),
        balance_after: format_decimal(balance_after),
        reference: mutation.reference.clone(),
        description: mutation.description.clone(),
        operator: mutation.operator.clone(),
        created_at: now,
    };
    diesel::insert_into(ledger_entries::table)
        .values(&entry_row)
        .execute(conn)
        .into_core()?;

    Ok(LedgerOutcome::Applied {
        entry: LedgerEntry::from(entry_row),
        new_balance: balance_after,
    })
}

#[async_trait]
impl LedgerRepositoryTrait for LedgerRepository {
    async fn apply(&self, mutation: BalanceMutation) -> Result<LedgerOutcome> {
        self.writer
            .exec(move |conn| apply_mutation(conn, &mutation))
            .await
    }

    fn get_balance(&self, group_ref: &str) -> Result<Decimal> {
        let mut conn = get_connection(&self.pool)?;
        let balance: String = groups::table
            .filter(groups::external_id.eq(group_ref))
            .select(groups::balance)
            .first::<String>(&mut conn)
            .optional()
            .into_core()?
            .ok_or_else(|| Error::from(LedgerError::GroupNotFound(group_ref.to_string())))?;
        Ok(parse_decimal_tolerant(&balance, "groups.balance"))
    }

    fn get_entries(&self, group_ref: &str, limit: Option<i64>) -> Result<Vec<LedgerEntry>> {
        let mut conn = get_connection(&self.pool)?;

        let mut query = ledger_entries::table
            .inner_join(groups::table.on(groups::id.eq(ledger_entries::group_id)))
            .filter(groups::external_id.eq(group_ref))
            .select(LedgerEntryDB::as_select())
            .order(ledger_entries::created_at.desc())
            .into_boxed();

        if let Some(limit) = limit {
            query = query.limit(limit);
        }

        let rows = query.load::<LedgerEntryDB>(&mut conn).into_core()?;
        Ok(rows.into_iter().map(LedgerEntry::from).collect())
    }

    fn find_by_reference(&self, reference: &str) -> Result<Option<LedgerEntry>> {
        let mut conn = get_connection(&self.pool)?;
        let row = ledger_entries::table
            .filter(ledger_entries::reference.eq(reference))
            .select(LedgerEntryDB::as_select())
            .first::<LedgerEntryDB>(&mut conn)
            .optional()
            .into_core()?;
        Ok(row.map(LedgerEntry::from))
    }
}
