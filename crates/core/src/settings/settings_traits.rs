//! Settings repository and service traits.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::time::Duration;

use super::settings_model::SystemSetting;
use crate::errors::Result;

/// Trait defining the contract for settings persistence.
#[async_trait]
pub trait SettingsRepositoryTrait: Send + Sync {
    /// Value for a key. Known keys fall back to their documented defaults;
    /// unknown absent keys fail with `MissingConfigKey`.
    fn get_setting(&self, key: &str) -> Result<String>;

    /// All configuration rows.
    fn get_all(&self) -> Result<Vec<SystemSetting>>;

    /// Operator-side write path.
    async fn update_setting(&self, key: &str, value: &str) -> Result<()>;
}

/// Trait defining typed accessors over the system configuration.
#[async_trait]
pub trait SettingsServiceTrait: Send + Sync {
    /// Bank transfer instructions shown to depositors.
    fn bank_account_info(&self) -> Result<String>;

    /// Smallest accepted deposit.
    fn min_deposit_amount(&self) -> Result<Decimal>;

    /// Currency-to-token exchange rate.
    fn exchange_rate(&self) -> Result<Decimal>;

    /// Wall-clock bound for one automation run.
    fn automation_timeout(&self) -> Result<Duration>;

    /// Mailbox polling lookback window, in hours.
    fn mailbox_lookback_hours(&self) -> Result<i64>;

    /// Operator-side write path.
    async fn update_setting(&self, key: &str, value: &str) -> Result<()>;
}
