//! Redemption-record repository backed by SQLite.

use async_trait::async_trait;
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use tokenbank_core::groups::GroupError;
use tokenbank_core::ledger::{BalanceMutation, LedgerOutcome};
use tokenbank_core::redemption::{
    NewRedemption, RedemptionError, RedemptionRecord, RedemptionRepositoryTrait, RedemptionStatus,
};
use tokenbank_core::{Error, Result};

use super::model::RedemptionRecordDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::groups::repository::{find_group_by_external_id, find_member_by_external_id};
use crate::ledger::repository::apply_mutation;
use crate::schema::{groups, members, redemption_records};
use crate::utils::{format_decimal, now_string};

pub struct RedemptionRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl RedemptionRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl RedemptionRepositoryTrait for RedemptionRepository {
    async fn insert(&self, new_redemption: NewRedemption) -> Result<RedemptionRecord> {
        self.writer
            .exec(move |conn| {
                let group = find_group_by_external_id(conn, &new_redemption.group_ref)?
                    .ok_or_else(|| {
                        Error::from(GroupError::NotFound(new_redemption.group_ref.clone()))
                    })?;
                let member = find_member_by_external_id(conn, &new_redemption.member_ref)?
                    .ok_or_else(|| {
                        Error::from(GroupError::MemberNotFound(new_redemption.member_ref.clone()))
                    })?;

                let row = RedemptionRecordDB {
                    id: Uuid::new_v4().to_string(),
                    group_id: group.id,
                    member_id: member.id,
                    target_account: new_redemption.target_account.clone(),
                    token_cost: format_decimal(new_redemption.token_cost),
                    status: RedemptionStatus::Pending.as_str().to_string(),
                    external_ref: None,
                    retry_count: 0,
                    error_message: None,
                    params: serde_json::to_string(&new_redemption.params)?,
                    created_at: now_string(),
                    completed_at: None,
                };
                diesel::insert_into(redemption_records::table)
                    .values(&row)
                    .execute(conn)
                    .into_core()?;

                Ok(row.into_domain(group.external_id, member.external_id))
            })
            .await
    }

    async fn mark_in_progress(&self, redemption_id: &str) -> Result<()> {
        let redemption_id = redemption_id.to_string();
        self.writer
            .exec(move |conn| {
                let updated = diesel::update(redemption_records::table.find(&redemption_id))
                    .set(redemption_records::status.eq(RedemptionStatus::InProgress.as_str()))
                    .execute(conn)
                    .into_core()?;
                if updated == 0 {
                    return Err(RedemptionError::NotFound(redemption_id.clone()).into());
                }
                Ok(())
            })
            .await
    }

    async fn mark_failed(&self, redemption_id: &str, error_message: &str) -> Result<()> {
        let redemption_id = redemption_id.to_string();
        let error_message = error_message.to_string();
        self.writer
            .exec(move |conn| {
                let updated = diesel::update(redemption_records::table.find(&redemption_id))
                    .set((
                        redemption_records::status.eq(RedemptionStatus::Failed.as_str()),
                        redemption_records::error_message.eq(Some(error_message.clone())),
                        redemption_records::retry_count
                            .eq(redemption_records::retry_count + 1),
                        redemption_records::completed_at.eq(Some(now_string())),
                    ))
                    .execute(conn)
                    .into_core()?;
                if updated == 0 {
                    return Err(RedemptionError::NotFound(redemption_id.clone()).into());
                }
                Ok(())
            })
            .await
    }

    async fn complete_with_debit(
        &self,
        redemption_id: &str,
        external_ref: Option<String>,
        mutation: BalanceMutation,
    ) -> Result<LedgerOutcome> {
        let redemption_id = redemption_id.to_string();
        self.writer
            .exec(move |conn| {
                // One transaction: the debit entry exists iff the record is
                // completed. Any error (including an insufficient balance
                // discovered here) rolls both back.
                let outcome = apply_mutation(conn, &mutation)?;

                let updated = diesel::update(redemption_records::table.find(&redemption_id))
                    .set((
                        redemption_records::status.eq(RedemptionStatus::Completed.as_str()),
                        redemption_records::external_ref.eq(external_ref.clone()),
                        redemption_records::completed_at.eq(Some(now_string())),
                    ))
                    .execute(conn)
                    .into_core()?;
                if updated == 0 {
                    return Err(RedemptionError::NotFound(redemption_id.clone()).into());
                }

                Ok(outcome)
            })
            .await
    }

    fn get(&self, redemption_id: &str) -> Result<RedemptionRecord> {
        let mut conn = get_connection(&self.pool)?;
        let row: Option<(RedemptionRecordDB, String, String)> = redemption_records::table
            .inner_join(groups::table.on(groups::id.eq(redemption_records::group_id)))
            .inner_join(members::table.on(members::id.eq(redemption_records::member_id)))
            .filter(redemption_records::id.eq(redemption_id))
            .select((
                RedemptionRecordDB::as_select(),
                groups::external_id,
                members::external_id,
            ))
            .first(&mut conn)
            .optional()
            .into_core()?;

        let (record, group_ref, member_ref) = row
            .ok_or_else(|| Error::from(RedemptionError::NotFound(redemption_id.to_string())))?;
        Ok(record.into_domain(group_ref, member_ref))
    }

    fn list_in_progress(&self) -> Result<Vec<RedemptionRecord>> {
        let mut conn = get_connection(&self.pool)?;
        let rows: Vec<(RedemptionRecordDB, String, String)> = redemption_records::table
            .inner_join(groups::table.on(groups::id.eq(redemption_records::group_id)))
            .inner_join(members::table.on(members::id.eq(redemption_records::member_id)))
            .filter(redemption_records::status.eq(RedemptionStatus::InProgress.as_str()))
            .select((
                RedemptionRecordDB::as_select(),
                groups::external_id,
                members::external_id,
            ))
            .order(redemption_records::created_at.asc())
            .load(&mut conn)
            .into_core()?;

        Ok(rows
            .into_iter()
            .map(|(record, group_ref, member_ref)| record.into_domain(group_ref, member_ref))
            .collect())
    }
}
