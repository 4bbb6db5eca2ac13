//! Settings domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One key-value row of the system configuration table. The core reads these;
/// schema evolution of the table belongs to the operators.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemSetting {
    pub key: String,
    pub value: String,
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
}
