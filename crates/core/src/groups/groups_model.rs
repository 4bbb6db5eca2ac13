//! Group domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{errors::ValidationError, Error, Result};

/// A chat group bound to one shared token balance.
///
/// `balance` is only ever written by the ledger's balance mutator. Groups are
/// soft-deactivated, never hard-deleted; their ledger history persists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// Internal id (UUID string).
    pub id: String,
    /// Opaque chat-platform group identifier; unique.
    pub external_id: String,
    pub name: String,
    pub balance: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A chat user, independent of any group.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    /// Opaque chat-platform user identifier; unique.
    pub external_id: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Join entity between a group and a member. At most one row per pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub group_id: String,
    pub member_id: String,
    pub is_admin: bool,
    pub joined_at: DateTime<Utc>,
}

/// Input model for binding a new group.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGroup {
    pub external_id: String,
    pub name: String,
}

impl NewGroup {
    pub fn validate(&self) -> Result<()> {
        if self.external_id.trim().is_empty() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Group external id cannot be empty".to_string(),
            )));
        }
        if self.name.trim().is_empty() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Group name cannot be empty".to_string(),
            )));
        }
        Ok(())
    }
}

/// Input model for creating or refreshing a member.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMember {
    pub external_id: String,
    pub display_name: String,
}

impl NewMember {
    pub fn validate(&self) -> Result<()> {
        if self.external_id.trim().is_empty() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Member external id cannot be empty".to_string(),
            )));
        }
        Ok(())
    }
}

/// A member with their role inside one group.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMemberInfo {
    pub member: Member,
    pub is_admin: bool,
    pub joined_at: DateTime<Utc>,
}

/// Aggregated view of a group and its membership.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupInfo {
    pub group: Group,
    pub members: Vec<GroupMemberInfo>,
}

impl GroupInfo {
    pub fn admin_count(&self) -> usize {
        self.members.iter().filter(|m| m.is_admin).count()
    }
}
