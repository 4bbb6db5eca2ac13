//! Application-wide constants.

/// Operator label for ledger entries written by the email pipeline.
pub const OPERATOR_EMAIL_RECONCILIATION: &str = "email-reconciliation";

/// Operator label for ledger entries written by the redemption worker.
pub const OPERATOR_REDEMPTION: &str = "redemption";

/// Operator label for entries written without an identified actor.
pub const OPERATOR_SYSTEM: &str = "system";

/// Reference prefix for deposits credited from transfer notifications.
pub const REFERENCE_PREFIX_TRANSFER: &str = "transfer";

/// Reference prefix for redemption debits.
pub const REFERENCE_PREFIX_REDEMPTION: &str = "redemption";

/// Reference prefix for manual adjustments.
pub const REFERENCE_PREFIX_MANUAL: &str = "manual";

/// Reference prefix for transfer ids derived from message content when the
/// source email carries no explicit transaction identifier.
pub const REFERENCE_PREFIX_AUTO: &str = "auto";

// System configuration keys (read-only to the core).
pub const CONFIG_KEY_BANK_ACCOUNT_INFO: &str = "bank_account_info";
pub const CONFIG_KEY_MIN_DEPOSIT_AMOUNT: &str = "min_deposit_amount";
pub const CONFIG_KEY_EXCHANGE_RATE: &str = "exchange_rate";
pub const CONFIG_KEY_AUTOMATION_TIMEOUT_SECS: &str = "automation_timeout_secs";
pub const CONFIG_KEY_MAILBOX_LOOKBACK_HOURS: &str = "mailbox_lookback_hours";

/// Default minimum deposit when `min_deposit_amount` is unset.
pub const DEFAULT_MIN_DEPOSIT_AMOUNT: &str = "100";

/// Default currency-to-token exchange rate when `exchange_rate` is unset.
pub const DEFAULT_EXCHANGE_RATE: &str = "1";

/// Default wall-clock bound for one automation run, in seconds.
pub const DEFAULT_AUTOMATION_TIMEOUT_SECS: &str = "300";

/// Default mailbox polling lookback window, in hours.
pub const DEFAULT_MAILBOX_LOOKBACK_HOURS: &str = "24";
