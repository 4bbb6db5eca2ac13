//! Domain event types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::TransactionKind;

/// Domain events emitted by core services after successful mutations.
///
/// These events represent facts about domain data changes. Runtime adapters
/// translate them into platform-specific actions (chat replies, out-of-band
/// push messages, operator alerts). Redemption results in particular arrive
/// after the originating request/response cycle has ended, so the chat
/// gateway delivers them as push messages.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A chat group was bound to a fresh token account.
    GroupBound {
        group_id: String,
        admin_member_id: String,
    },

    /// A group balance was mutated by the ledger.
    BalanceChanged {
        group_id: String,
        kind: TransactionKind,
        amount: Decimal,
        new_balance: Decimal,
        reference: Option<String>,
    },

    /// A transfer notification email was matched and credited.
    DepositReconciled {
        group_id: String,
        amount: Decimal,
        transfer_id: String,
        new_balance: Decimal,
    },

    /// A transfer notification could not be resolved to a group and awaits
    /// manual follow-up.
    DepositUnmatched {
        transfer_id: String,
        amount: Decimal,
    },

    /// A redemption request was accepted and handed to the background worker.
    RedemptionAccepted {
        redemption_id: String,
        group_id: String,
        token_cost: Decimal,
    },

    /// The automation run succeeded and the debit was committed.
    RedemptionCompleted {
        redemption_id: String,
        group_id: String,
        new_balance: Decimal,
        external_ref: Option<String>,
    },

    /// The automation run reported a clean failure; the balance is untouched.
    RedemptionFailed {
        redemption_id: String,
        group_id: String,
        reason: String,
    },

    /// The automation outcome is unknown (timeout or transport loss). The
    /// record stays open and an operator must reconcile it by hand.
    RedemptionStalled {
        redemption_id: String,
        group_id: String,
        detail: String,
    },
}

impl DomainEvent {
    /// Creates a GroupBound event.
    pub fn group_bound(group_id: String, admin_member_id: String) -> Self {
        Self::GroupBound {
            group_id,
            admin_member_id,
        }
    }

    /// Creates a BalanceChanged event.
    pub fn balance_changed(
        group_id: String,
        kind: TransactionKind,
        amount: Decimal,
        new_balance: Decimal,
        reference: Option<String>,
    ) -> Self {
        Self::BalanceChanged {
            group_id,
            kind,
            amount,
            new_balance,
            reference,
        }
    }

    /// Creates a DepositReconciled event.
    pub fn deposit_reconciled(
        group_id: String,
        amount: Decimal,
        transfer_id: String,
        new_balance: Decimal,
    ) -> Self {
        Self::DepositReconciled {
            group_id,
            amount,
            transfer_id,
            new_balance,
        }
    }

    /// Creates a DepositUnmatched event.
    pub fn deposit_unmatched(transfer_id: String, amount: Decimal) -> Self {
        Self::DepositUnmatched {
            transfer_id,
            amount,
        }
    }

    /// Creates a RedemptionAccepted event.
    pub fn redemption_accepted(
        redemption_id: String,
        group_id: String,
        token_cost: Decimal,
    ) -> Self {
        Self::RedemptionAccepted {
            redemption_id,
            group_id,
            token_cost,
        }
    }

    /// Creates a RedemptionCompleted event.
    pub fn redemption_completed(
        redemption_id: String,
        group_id: String,
        new_balance: Decimal,
        external_ref: Option<String>,
    ) -> Self {
        Self::RedemptionCompleted {
            redemption_id,
            group_id,
            new_balance,
            external_ref,
        }
    }

    /// Creates a RedemptionFailed event.
    pub fn redemption_failed(redemption_id: String, group_id: String, reason: String) -> Self {
        Self::RedemptionFailed {
            redemption_id,
            group_id,
            reason,
        }
    }

    /// Creates a RedemptionStalled event.
    pub fn redemption_stalled(redemption_id: String, group_id: String, detail: String) -> Self {
        Self::RedemptionStalled {
            redemption_id,
            group_id,
            detail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_domain_event_serialization() {
        let event = DomainEvent::deposit_reconciled(
            "group-1".to_string(),
            dec!(500),
            "TX1".to_string(),
            dec!(500),
        );

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("deposit_reconciled"));

        let deserialized: DomainEvent = serde_json::from_str(&json).unwrap();
        match deserialized {
            DomainEvent::DepositReconciled {
                group_id,
                amount,
                transfer_id,
                new_balance,
            } => {
                assert_eq!(group_id, "group-1");
                assert_eq!(amount, dec!(500));
                assert_eq!(transfer_id, "TX1");
                assert_eq!(new_balance, dec!(500));
            }
            _ => panic!("Expected DepositReconciled"),
        }
    }

    #[test]
    fn test_balance_changed_round_trip() {
        let event = DomainEvent::balance_changed(
            "group-1".to_string(),
            TransactionKind::RedemptionDebit,
            dec!(-500),
            dec!(0),
            Some("redemption:abc".to_string()),
        );

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: DomainEvent = serde_json::from_str(&json).unwrap();

        match deserialized {
            DomainEvent::BalanceChanged {
                kind,
                amount,
                new_balance,
                ..
            } => {
                assert_eq!(kind, TransactionKind::RedemptionDebit);
                assert_eq!(amount, dec!(-500));
                assert_eq!(new_balance, dec!(0));
            }
            _ => panic!("Expected BalanceChanged"),
        }
    }
}
