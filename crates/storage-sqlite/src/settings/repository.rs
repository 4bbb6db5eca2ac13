//! System configuration repository backed by SQLite.

use async_trait::async_trait;
use diesel::prelude::*;
use std::sync::Arc;

use tokenbank_core::constants::{
    CONFIG_KEY_AUTOMATION_TIMEOUT_SECS, CONFIG_KEY_EXCHANGE_RATE, CONFIG_KEY_MAILBOX_LOOKBACK_HOURS,
    CONFIG_KEY_MIN_DEPOSIT_AMOUNT, DEFAULT_AUTOMATION_TIMEOUT_SECS, DEFAULT_EXCHANGE_RATE,
    DEFAULT_MAILBOX_LOOKBACK_HOURS, DEFAULT_MIN_DEPOSIT_AMOUNT,
};
use tokenbank_core::settings::{SettingsRepositoryTrait, SystemSetting};
use tokenbank_core::{Error, Result};

use super::model::SystemConfigDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::system_config::dsl::*;
use crate::utils::now_string;

pub struct SettingsRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SettingsRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        SettingsRepository { pool, writer }
    }
}

#[async_trait]
impl SettingsRepositoryTrait for SettingsRepository {
    fn get_setting(&self, key: &str) -> Result<String> {
        let mut conn = get_connection(&self.pool)?;
        let result = system_config
            .filter(config_key.eq(key))
            .select(config_value)
            .first::<String>(&mut conn);

        match result {
            Ok(value) => Ok(value),
            Err(diesel::result::Error::NotFound) => {
                // Known keys fall back to their documented defaults.
                let default_value = match key {
                    CONFIG_KEY_MIN_DEPOSIT_AMOUNT => DEFAULT_MIN_DEPOSIT_AMOUNT,
                    CONFIG_KEY_EXCHANGE_RATE => DEFAULT_EXCHANGE_RATE,
                    CONFIG_KEY_AUTOMATION_TIMEOUT_SECS => DEFAULT_AUTOMATION_TIMEOUT_SECS,
                    CONFIG_KEY_MAILBOX_LOOKBACK_HOURS => DEFAULT_MAILBOX_LOOKBACK_HOURS,
                    _ => return Err(Error::MissingConfigKey(key.to_string())),
                };
                Ok(default_value.to_string())
            }
            Err(e) => Err(crate::errors::StorageError::from(e).into()),
        }
    }

    fn get_all(&self) -> Result<Vec<SystemSetting>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = system_config
            .select(SystemConfigDB::as_select())
            .order(config_key.asc())
            .load::<SystemConfigDB>(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(SystemSetting::from).collect())
    }

    async fn update_setting(&self, key: &str, value: &str) -> Result<()> {
        let key = key.to_string();
        let value = value.to_string();
        self.writer
            .exec(move |conn| {
                diesel::replace_into(system_config)
                    .values(&SystemConfigDB {
                        config_key: key.clone(),
                        config_value: value.clone(),
                        description: None,
                        updated_at: now_string(),
                    })
                    .execute(conn)
                    .into_core()?;
                Ok(())
            })
            .await
    }
}
