//! Groups module - chat-group bindings, members, and admin management.

mod groups_errors;
mod groups_model;
mod groups_service;
mod groups_traits;

#[cfg(test)]
mod groups_service_tests;

// Re-export the public interface
pub use groups_errors::GroupError;
pub use groups_model::{Group, GroupInfo, GroupMemberInfo, Member, Membership, NewGroup, NewMember};
pub use groups_service::GroupService;
pub use groups_traits::{GroupRepositoryTrait, GroupServiceTrait};
