//! Settings module - read-only system configuration for the core.

mod settings_model;
mod settings_service;
mod settings_traits;

// Re-export the public interface
pub use settings_model::SystemSetting;
pub use settings_service::SettingsService;
pub use settings_traits::{SettingsRepositoryTrait, SettingsServiceTrait};
