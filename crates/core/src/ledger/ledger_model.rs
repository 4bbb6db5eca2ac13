//! Ledger domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ledger::LedgerError;
use crate::{Error, Result};

/// Closed set of balance mutation kinds.
///
/// Every consumer matches exhaustively; adding a variant is a deliberate
/// schema change, not a stringly-typed drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Credit from a reconciled bank transfer.
    Deposit,
    /// Debit committed after a successful redemption run.
    RedemptionDebit,
    /// Administrative credit.
    ManualCredit,
    /// Administrative debit.
    ManualDebit,
}

impl TransactionKind {
    /// Stable string form used in storage and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::RedemptionDebit => "redemption_debit",
            TransactionKind::ManualCredit => "manual_credit",
            TransactionKind::ManualDebit => "manual_debit",
        }
    }

    /// Whether this kind increases the balance.
    pub fn is_credit(&self) -> bool {
        match self {
            TransactionKind::Deposit | TransactionKind::ManualCredit => true,
            TransactionKind::RedemptionDebit | TransactionKind::ManualDebit => false,
        }
    }

    /// Whether the mutation is triggered by an external event and therefore
    /// must carry an idempotency reference.
    pub fn requires_reference(&self) -> bool {
        matches!(
            self,
            TransactionKind::Deposit | TransactionKind::RedemptionDebit
        )
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "deposit" => Ok(TransactionKind::Deposit),
            "redemption_debit" => Ok(TransactionKind::RedemptionDebit),
            "manual_credit" => Ok(TransactionKind::ManualCredit),
            "manual_debit" => Ok(TransactionKind::ManualDebit),
            other => Err(Error::Validation(crate::ValidationError::InvalidInput(
                format!("Unknown transaction kind: {}", other),
            ))),
        }
    }
}

/// One immutable row of the append-only transaction log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: String,
    /// Internal group id (not the chat-platform external id).
    pub group_id: String,
    /// Acting member, when the mutation was triggered by a person.
    pub member_id: Option<String>,
    pub kind: TransactionKind,
    /// Signed amount; positive credits, negative debits.
    pub amount: Decimal,
    pub balance_before: Decimal,
    pub balance_after: Decimal,
    /// Idempotency reference; unique across all entries when present.
    pub reference: Option<String>,
    pub description: String,
    pub operator: String,
    pub created_at: DateTime<Utc>,
}

/// A request to mutate one group balance.
///
/// `group_ref` and `member_ref` are the opaque external identifiers the chat
/// platform hands us; the storage layer resolves them inside the mutation
/// transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceMutation {
    pub group_ref: String,
    pub amount: Decimal,
    pub kind: TransactionKind,
    pub reference: Option<String>,
    pub description: String,
    pub operator: String,
    pub member_ref: Option<String>,
}

impl BalanceMutation {
    /// Validates amount sign against kind and the reference requirement for
    /// externally-keyed kinds.
    pub fn validate(&self) -> Result<()> {
        if self.amount.is_zero() {
            return Err(LedgerError::InvalidAmount("amount must be non-zero".to_string()).into());
        }
        if self.kind.is_credit() && self.amount.is_sign_negative() {
            return Err(LedgerError::InvalidAmount(format!(
                "{} requires a positive amount, got {}",
                self.kind, self.amount
            ))
            .into());
        }
        if !self.kind.is_credit() && self.amount.is_sign_positive() {
            return Err(LedgerError::InvalidAmount(format!(
                "{} requires a negative amount, got {}",
                self.kind, self.amount
            ))
            .into());
        }
        if self.kind.requires_reference() && self.reference.is_none() {
            return Err(LedgerError::MissingReference(self.kind.to_string()).into());
        }
        Ok(())
    }
}

/// Result of applying a [`BalanceMutation`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "outcome")]
pub enum LedgerOutcome {
    /// The mutation was applied; the entry and the new balance are returned.
    Applied {
        entry: LedgerEntry,
        new_balance: Decimal,
    },
    /// The reference was already recorded; nothing changed. Callers treat
    /// this as success so retries are side-effect-free.
    Duplicate { reference: String },
}

impl LedgerOutcome {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, LedgerOutcome::Duplicate { .. })
    }

    /// New balance for applied mutations, `None` for duplicates.
    pub fn new_balance(&self) -> Option<Decimal> {
        match self {
            LedgerOutcome::Applied { new_balance, .. } => Some(*new_balance),
            LedgerOutcome::Duplicate { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn mutation(kind: TransactionKind, amount: Decimal, reference: Option<&str>) -> BalanceMutation {
        BalanceMutation {
            group_ref: "g-ext".to_string(),
            amount,
            kind,
            reference: reference.map(String::from),
            description: "test".to_string(),
            operator: "test".to_string(),
            member_ref: None,
        }
    }

    #[test]
    fn test_kind_round_trip() {
        for kind in [
            TransactionKind::Deposit,
            TransactionKind::RedemptionDebit,
            TransactionKind::ManualCredit,
            TransactionKind::ManualDebit,
        ] {
            assert_eq!(kind.as_str().parse::<TransactionKind>().unwrap(), kind);
        }
        assert!("withdraw".parse::<TransactionKind>().is_err());
    }

    #[test]
    fn test_validate_sign_matches_kind() {
        assert!(mutation(TransactionKind::Deposit, dec!(100), Some("transfer:TX1"))
            .validate()
            .is_ok());
        assert!(mutation(TransactionKind::Deposit, dec!(-100), Some("transfer:TX1"))
            .validate()
            .is_err());
        assert!(
            mutation(TransactionKind::RedemptionDebit, dec!(-100), Some("redemption:r1"))
                .validate()
                .is_ok()
        );
        assert!(
            mutation(TransactionKind::RedemptionDebit, dec!(100), Some("redemption:r1"))
                .validate()
                .is_err()
        );
        assert!(mutation(TransactionKind::ManualDebit, dec!(0), None)
            .validate()
            .is_err());
    }

    #[test]
    fn test_validate_requires_reference_for_external_kinds() {
        assert!(mutation(TransactionKind::Deposit, dec!(100), None)
            .validate()
            .is_err());
        assert!(mutation(TransactionKind::RedemptionDebit, dec!(-100), None)
            .validate()
            .is_err());
        // Manual kinds get their reference derived by the service.
        assert!(mutation(TransactionKind::ManualCredit, dec!(100), None)
            .validate()
            .is_ok());
    }
}
