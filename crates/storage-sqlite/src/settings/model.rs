//! Database model for system configuration.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use tokenbank_core::settings::SystemSetting;

use crate::utils::parse_datetime_tolerant;

/// Database model for system configuration rows
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
#[diesel(table_name = crate::schema::system_config)]
#[diesel(primary_key(config_key))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SystemConfigDB {
    pub config_key: String,
    pub config_value: String,
    pub description: Option<String>,
    pub updated_at: String,
}

impl From<SystemConfigDB> for SystemSetting {
    fn from(db: SystemConfigDB) -> Self {
        Self {
            key: db.config_key,
            value: db.config_value,
            description: db.description,
            updated_at: parse_datetime_tolerant(&db.updated_at, "system_config.updated_at"),
        }
    }
}
