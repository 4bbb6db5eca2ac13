//! Group repository and service traits.
//!
//! These traits define the contract for group operations without any
//! database-specific types, allowing for different storage implementations.

use async_trait::async_trait;

use super::groups_model::{Group, GroupInfo, Member, NewGroup, NewMember};
use crate::errors::Result;

/// Trait defining the contract for group persistence.
#[async_trait]
pub trait GroupRepositoryTrait: Send + Sync {
    /// Creates a group, the binding member, and their admin membership in one
    /// transaction. The first binder becomes admin.
    async fn create_with_admin(&self, new_group: NewGroup, admin: NewMember) -> Result<Group>;

    /// Retrieves a group by its external id; `GroupError::NotFound` if absent.
    fn get_by_external_id(&self, external_id: &str) -> Result<Group>;

    /// Looks up a group by its external id.
    fn find_by_external_id(&self, external_id: &str) -> Result<Option<Group>>;

    /// Active groups whose external id contains the given code. Used by the
    /// email matching stage; the caller decides what to do with zero or
    /// multiple candidates.
    fn find_active_by_code(&self, code: &str) -> Result<Vec<Group>>;

    /// Soft-deactivates a group. Ledger history is untouched.
    async fn deactivate(&self, external_id: &str) -> Result<()>;

    /// Creates the member if unknown, refreshes the display name otherwise.
    async fn upsert_member(&self, member: NewMember) -> Result<Member>;

    /// Sets the admin flag on a membership, creating the membership row if
    /// the member has none in this group.
    async fn set_membership_admin(
        &self,
        group_ref: &str,
        member_ref: &str,
        is_admin: bool,
    ) -> Result<()>;

    /// Whether the member holds the admin flag in the group.
    fn is_admin(&self, group_ref: &str, member_ref: &str) -> Result<bool>;

    /// Group plus members and their roles.
    fn get_group_info(&self, external_id: &str) -> Result<GroupInfo>;
}

/// Trait defining the contract for group service operations.
#[async_trait]
pub trait GroupServiceTrait: Send + Sync {
    /// Binds a chat group to a fresh token account. Fails with
    /// `GroupError::AlreadyBound` when a binding exists (active or not).
    async fn bind_group(&self, new_group: NewGroup, admin: NewMember) -> Result<Group>;

    /// Retrieves a group by external id.
    fn get_group(&self, external_id: &str) -> Result<Group>;

    /// Group plus members and their roles.
    fn get_group_info(&self, external_id: &str) -> Result<GroupInfo>;

    /// Soft-deactivates a group; the actor must be an admin.
    async fn deactivate_group(&self, external_id: &str, actor_ref: &str) -> Result<()>;

    /// Grants the admin flag; the actor must be an admin.
    async fn grant_admin(&self, group_ref: &str, actor_ref: &str, member: NewMember) -> Result<()>;

    /// Revokes the admin flag; the actor must be an admin.
    async fn revoke_admin(&self, group_ref: &str, actor_ref: &str, member_ref: &str) -> Result<()>;

    /// Whether the member holds the admin flag in the group.
    fn is_admin(&self, group_ref: &str, member_ref: &str) -> Result<bool>;

    /// Fails with `GroupError::NotAdmin` unless the member is an admin.
    /// Callers of privileged ledger operations (manual adjustments) go
    /// through this before invoking the mutator.
    fn require_admin(&self, group_ref: &str, member_ref: &str) -> Result<()>;
}
