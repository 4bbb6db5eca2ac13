//! Database model for redemption records.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use tokenbank_core::redemption::{RedemptionRecord, RedemptionStatus};

use crate::utils::{parse_datetime_tolerant, parse_decimal_tolerant};

/// Database model for redemption records
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
#[diesel(table_name = crate::schema::redemption_records)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RedemptionRecordDB {
    pub id: String,
    pub group_id: String,
    pub member_id: String,
    pub target_account: String,
    pub token_cost: String,
    pub status: String,
    pub external_ref: Option<String>,
    pub retry_count: i32,
    pub error_message: Option<String>,
    pub params: String,
    pub created_at: String,
    pub completed_at: Option<String>,
}

impl RedemptionRecordDB {
    /// Builds the domain record; the external refs come from the joined
    /// groups/members rows.
    pub fn into_domain(self, group_ref: String, member_ref: String) -> RedemptionRecord {
        let status = RedemptionStatus::from_str(&self.status).unwrap_or_else(|_| {
            log::error!("Unknown redemption status '{}' on record {}", self.status, self.id);
            RedemptionStatus::Pending
        });

        let params = serde_json::from_str(&self.params).unwrap_or_else(|err| {
            log::error!("Malformed params JSON on redemption {}: {}", self.id, err);
            serde_json::Value::Null
        });

        RedemptionRecord {
            id: self.id,
            group_id: self.group_id,
            group_ref,
            member_id: self.member_id,
            member_ref,
            target_account: self.target_account,
            token_cost: parse_decimal_tolerant(&self.token_cost, "redemption_records.token_cost"),
            status,
            external_ref: self.external_ref,
            retry_count: self.retry_count,
            error_message: self.error_message,
            params,
            created_at: parse_datetime_tolerant(&self.created_at, "redemption_records.created_at"),
            completed_at: self
                .completed_at
                .as_deref()
                .map(|t| parse_datetime_tolerant(t, "redemption_records.completed_at")),
        }
    }
}
