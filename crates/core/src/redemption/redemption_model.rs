//! Redemption domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::redemption::RedemptionError;
use crate::{Error, Result, ValidationError};

/// Lifecycle of one redemption attempt.
///
/// `InProgress` with no terminal transition is the ambiguous case (timeout,
/// transport loss): the automation may or may not have delivered, so the
/// record stays open for manual reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedemptionStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl RedemptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedemptionStatus::Pending => "pending",
            RedemptionStatus::InProgress => "in_progress",
            RedemptionStatus::Completed => "completed",
            RedemptionStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RedemptionStatus::Completed | RedemptionStatus::Failed)
    }
}

impl fmt::Display for RedemptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RedemptionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(RedemptionStatus::Pending),
            "in_progress" => Ok(RedemptionStatus::InProgress),
            "completed" => Ok(RedemptionStatus::Completed),
            "failed" => Ok(RedemptionStatus::Failed),
            other => Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Unknown redemption status: {}",
                other
            )))),
        }
    }
}

/// One redemption attempt.
///
/// Carries both internal ids (storage identity) and the external chat-side
/// refs the worker needs for the debit mutation and the result notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionRecord {
    pub id: String,
    pub group_id: String,
    pub group_ref: String,
    pub member_id: String,
    pub member_ref: String,
    pub target_account: String,
    pub token_cost: Decimal,
    pub status: RedemptionStatus,
    /// Transaction reference reported by the storefront, when available.
    pub external_ref: Option<String>,
    pub retry_count: i32,
    pub error_message: Option<String>,
    /// Opaque parameters handed through to the automation executor.
    pub params: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Input model for inserting a redemption record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRedemption {
    pub group_ref: String,
    pub member_ref: String,
    pub target_account: String,
    pub token_cost: Decimal,
    pub params: serde_json::Value,
}

/// A chat-triggered request to redeem tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionRequest {
    pub group_ref: String,
    pub actor: crate::groups::NewMember,
    pub target_account: String,
    pub token_cost: Decimal,
    pub params: serde_json::Value,
}

impl RedemptionRequest {
    pub fn validate(&self) -> Result<()> {
        if self.token_cost <= Decimal::ZERO {
            return Err(RedemptionError::InvalidCost(format!(
                "cost must be positive, got {}",
                self.token_cost
            ))
            .into());
        }
        if self.target_account.trim().is_empty() {
            return Err(RedemptionError::MissingTargetAccount.into());
        }
        self.actor.validate()
    }
}

/// What the automation executor reported back.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationOutcome {
    pub success: bool,
    pub detail: String,
    pub external_ref: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request(cost: Decimal, account: &str) -> RedemptionRequest {
        RedemptionRequest {
            group_ref: "C1".to_string(),
            actor: crate::groups::NewMember {
                external_id: "U1".to_string(),
                display_name: "user".to_string(),
            },
            target_account: account.to_string(),
            token_cost: cost,
            params: serde_json::json!({}),
        }
    }

    #[test]
    fn test_request_validation() {
        assert!(request(dec!(500), "player1").validate().is_ok());
        assert!(request(dec!(0), "player1").validate().is_err());
        assert!(request(dec!(-5), "player1").validate().is_err());
        assert!(request(dec!(500), "  ").validate().is_err());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            RedemptionStatus::Pending,
            RedemptionStatus::InProgress,
            RedemptionStatus::Completed,
            RedemptionStatus::Failed,
        ] {
            assert_eq!(
                status.as_str().parse::<RedemptionStatus>().unwrap(),
                status
            );
        }
        assert!(RedemptionStatus::Completed.is_terminal());
        assert!(!RedemptionStatus::InProgress.is_terminal());
    }
}
