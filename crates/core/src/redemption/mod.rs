//! Redemption module - spending tokens through an external automation run,
//! debiting only after value was actually delivered.

mod redemption_errors;
mod redemption_model;
mod redemption_service;
mod redemption_traits;


// Re-export the public interface
pub use redemption_errors::RedemptionError;
pub use redemption_model::{
    AutomationOutcome, NewRedemption, RedemptionRecord, RedemptionRequest, RedemptionStatus,
};
pub use redemption_service::{RedemptionService, RedemptionWorker};
pub use redemption_traits::{
    AutomationExecutorTrait, RedemptionRepositoryTrait, RedemptionServiceTrait,
};
