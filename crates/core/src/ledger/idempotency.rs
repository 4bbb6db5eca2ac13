//! Idempotency reference derivation.
//!
//! Every externally-triggered mutation carries a reference so re-applying the
//! same event is a detectable no-op instead of a second credit or debit.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::constants::{
    REFERENCE_PREFIX_AUTO, REFERENCE_PREFIX_MANUAL, REFERENCE_PREFIX_REDEMPTION,
    REFERENCE_PREFIX_TRANSFER,
};

/// Reference for a deposit credited from a bank transfer notification.
pub fn deposit_reference(transfer_id: &str) -> String {
    format!("{}:{}", REFERENCE_PREFIX_TRANSFER, transfer_id)
}

/// Reference for the debit of one redemption attempt. Keyed by the record id
/// so a crash-and-retry of the settlement step cannot double-debit.
pub fn redemption_reference(redemption_id: &str) -> String {
    format!("{}:{}", REFERENCE_PREFIX_REDEMPTION, redemption_id)
}

/// Reference for a manual adjustment, derived from operator and submission
/// time to catch accidental double-submission.
pub fn manual_reference(operator: &str, at: DateTime<Utc>) -> String {
    format!("{}:{}:{}", REFERENCE_PREFIX_MANUAL, operator, at.timestamp())
}

/// Deterministic transfer id for notification emails that carry no explicit
/// transaction identifier. Hashing the normalized content means refetching
/// the same email yields the same id, turning reprocessing into a duplicate
/// rather than a fresh credit.
pub fn content_fingerprint(text: &str) -> String {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("{}:{}", REFERENCE_PREFIX_AUTO, &digest[..16])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_deposit_reference_format() {
        assert_eq!(deposit_reference("TX123"), "transfer:TX123");
    }

    #[test]
    fn test_redemption_reference_format() {
        assert_eq!(redemption_reference("abc-def"), "redemption:abc-def");
    }

    #[test]
    fn test_manual_reference_includes_operator_and_time() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let reference = manual_reference("admin-1", at);
        assert!(reference.starts_with("manual:admin-1:"));
        assert_eq!(reference, manual_reference("admin-1", at));
        assert_ne!(
            reference,
            manual_reference("admin-1", at + chrono::Duration::seconds(1))
        );
    }

    #[test]
    fn test_content_fingerprint_is_stable() {
        let a = content_fingerprint("Transfer received  NT$ 500\nref A1");
        let b = content_fingerprint("Transfer received NT$ 500 ref A1");
        assert_eq!(a, b, "whitespace differences must not change the id");
        assert!(a.starts_with("auto:"));
        assert_eq!(a.len(), "auto:".len() + 16);
    }

    #[test]
    fn test_content_fingerprint_differs_on_content() {
        assert_ne!(
            content_fingerprint("amount: 500"),
            content_fingerprint("amount: 501")
        );
    }
}
