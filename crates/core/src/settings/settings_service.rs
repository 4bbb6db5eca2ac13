//! Settings service: typed accessors with parse validation.

use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use super::settings_traits::{SettingsRepositoryTrait, SettingsServiceTrait};
use crate::constants::{
    CONFIG_KEY_AUTOMATION_TIMEOUT_SECS, CONFIG_KEY_BANK_ACCOUNT_INFO, CONFIG_KEY_EXCHANGE_RATE,
    CONFIG_KEY_MAILBOX_LOOKBACK_HOURS, CONFIG_KEY_MIN_DEPOSIT_AMOUNT,
};
use crate::{Error, Result};

/// Service exposing system configuration to the pipelines.
pub struct SettingsService {
    repository: Arc<dyn SettingsRepositoryTrait>,
}

impl SettingsService {
    pub fn new(repository: Arc<dyn SettingsRepositoryTrait>) -> Self {
        Self { repository }
    }

    fn decimal_setting(&self, key: &str) -> Result<Decimal> {
        let raw = self.repository.get_setting(key)?;
        Decimal::from_str(&raw)
            .map_err(|e| Error::InvalidConfigValue(format!("{}={}: {}", key, raw, e)))
    }

    fn integer_setting(&self, key: &str) -> Result<i64> {
        let raw = self.repository.get_setting(key)?;
        raw.parse::<i64>()
            .map_err(|e| Error::InvalidConfigValue(format!("{}={}: {}", key, raw, e)))
    }
}

#[async_trait::async_trait]
impl SettingsServiceTrait for SettingsService {
    fn bank_account_info(&self) -> Result<String> {
        self.repository.get_setting(CONFIG_KEY_BANK_ACCOUNT_INFO)
    }

    fn min_deposit_amount(&self) -> Result<Decimal> {
        self.decimal_setting(CONFIG_KEY_MIN_DEPOSIT_AMOUNT)
    }

    fn exchange_rate(&self) -> Result<Decimal> {
        self.decimal_setting(CONFIG_KEY_EXCHANGE_RATE)
    }

    fn automation_timeout(&self) -> Result<Duration> {
        let secs = self.integer_setting(CONFIG_KEY_AUTOMATION_TIMEOUT_SECS)?;
        if secs <= 0 {
            return Err(Error::InvalidConfigValue(format!(
                "{} must be positive, got {}",
                CONFIG_KEY_AUTOMATION_TIMEOUT_SECS, secs
            )));
        }
        Ok(Duration::from_secs(secs as u64))
    }

    fn mailbox_lookback_hours(&self) -> Result<i64> {
        let hours = self.integer_setting(CONFIG_KEY_MAILBOX_LOOKBACK_HOURS)?;
        if hours <= 0 {
            return Err(Error::InvalidConfigValue(format!(
                "{} must be positive, got {}",
                CONFIG_KEY_MAILBOX_LOOKBACK_HOURS, hours
            )));
        }
        Ok(hours)
    }

    async fn update_setting(&self, key: &str, value: &str) -> Result<()> {
        self.repository.update_setting(key, value).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use crate::settings::SystemSetting;

    #[derive(Default)]
    struct MockSettingsRepository {
        values: Mutex<HashMap<String, String>>,
    }

    impl MockSettingsRepository {
        fn with(values: &[(&str, &str)]) -> Self {
            let repo = Self::default();
            let mut map = repo.values.lock().unwrap();
            for (key, value) in values {
                map.insert(key.to_string(), value.to_string());
            }
            drop(map);
            repo
        }
    }

    #[async_trait]
    impl SettingsRepositoryTrait for MockSettingsRepository {
        fn get_setting(&self, key: &str) -> Result<String> {
            if let Some(value) = self.values.lock().unwrap().get(key) {
                return Ok(value.clone());
            }
            let default_value = match key {
                CONFIG_KEY_MIN_DEPOSIT_AMOUNT => crate::constants::DEFAULT_MIN_DEPOSIT_AMOUNT,
                CONFIG_KEY_EXCHANGE_RATE => crate::constants::DEFAULT_EXCHANGE_RATE,
                CONFIG_KEY_AUTOMATION_TIMEOUT_SECS => {
                    crate::constants::DEFAULT_AUTOMATION_TIMEOUT_SECS
                }
                CONFIG_KEY_MAILBOX_LOOKBACK_HOURS => {
                    crate::constants::DEFAULT_MAILBOX_LOOKBACK_HOURS
                }
                _ => return Err(Error::MissingConfigKey(key.to_string())),
            };
            Ok(default_value.to_string())
        }

        fn get_all(&self) -> Result<Vec<SystemSetting>> {
            Ok(self
                .values
                .lock()
                .unwrap()
                .iter()
                .map(|(key, value)| SystemSetting {
                    key: key.clone(),
                    value: value.clone(),
                    description: None,
                    updated_at: Utc::now(),
                })
                .collect())
        }

        async fn update_setting(&self, key: &str, value: &str) -> Result<()> {
            self.values
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_typed_accessors() {
        let svc = SettingsService::new(Arc::new(MockSettingsRepository::with(&[
            (CONFIG_KEY_MIN_DEPOSIT_AMOUNT, "250"),
            (CONFIG_KEY_EXCHANGE_RATE, "1.5"),
            (CONFIG_KEY_AUTOMATION_TIMEOUT_SECS, "120"),
        ])));

        assert_eq!(svc.min_deposit_amount().unwrap(), dec!(250));
        assert_eq!(svc.exchange_rate().unwrap(), dec!(1.5));
        assert_eq!(svc.automation_timeout().unwrap(), Duration::from_secs(120));
        // Unset key falls back to the documented default.
        assert_eq!(svc.mailbox_lookback_hours().unwrap(), 24);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let svc = SettingsService::new(Arc::new(MockSettingsRepository::with(&[
            (CONFIG_KEY_MIN_DEPOSIT_AMOUNT, "not-a-number"),
            (CONFIG_KEY_AUTOMATION_TIMEOUT_SECS, "-5"),
        ])));

        assert!(matches!(
            svc.min_deposit_amount().unwrap_err(),
            Error::InvalidConfigValue(_)
        ));
        assert!(matches!(
            svc.automation_timeout().unwrap_err(),
            Error::InvalidConfigValue(_)
        ));
    }

    #[test]
    fn test_missing_bank_info_is_missing_key() {
        let svc = SettingsService::new(Arc::new(MockSettingsRepository::default()));
        assert!(matches!(
            svc.bank_account_info().unwrap_err(),
            Error::MissingConfigKey(_)
        ));
    }
}
