//! Redemption error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RedemptionError {
    #[error("Redemption record not found: {0}")]
    NotFound(String),

    #[error("Invalid redemption cost: {0}")]
    InvalidCost(String),

    #[error("Target account cannot be empty")]
    MissingTargetAccount,
}
