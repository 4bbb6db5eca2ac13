//! Group service: binding lifecycle and admin management.

use log::info;
use std::sync::Arc;

use super::groups_model::{Group, GroupInfo, NewGroup, NewMember};
use super::groups_traits::{GroupRepositoryTrait, GroupServiceTrait};
use crate::events::{DomainEvent, DomainEventSink};
use crate::groups::GroupError;
use crate::Result;

/// Service for managing group bindings.
pub struct GroupService {
    repository: Arc<dyn GroupRepositoryTrait>,
    events: Arc<dyn DomainEventSink>,
}

impl GroupService {
    pub fn new(repository: Arc<dyn GroupRepositoryTrait>, events: Arc<dyn DomainEventSink>) -> Self {
        Self { repository, events }
    }
}

#[async_trait::async_trait]
impl GroupServiceTrait for GroupService {
    async fn bind_group(&self, new_group: NewGroup, admin: NewMember) -> Result<Group> {
        new_group.validate()?;
        admin.validate()?;

        if self
            .repository
            .find_by_external_id(&new_group.external_id)?
            .is_some()
        {
            return Err(GroupError::AlreadyBound(new_group.external_id).into());
        }

        let admin_external_id = admin.external_id.clone();
        let group = self.repository.create_with_admin(new_group, admin).await?;

        info!(
            "Bound group {} ({}), admin {}",
            group.external_id, group.name, admin_external_id
        );
        self.events.emit(DomainEvent::group_bound(
            group.external_id.clone(),
            admin_external_id,
        ));

        Ok(group)
    }

    fn get_group(&self, external_id: &str) -> Result<Group> {
        self.repository.get_by_external_id(external_id)
    }

    fn get_group_info(&self, external_id: &str) -> Result<GroupInfo> {
        self.repository.get_group_info(external_id)
    }

    async fn deactivate_group(&self, external_id: &str, actor_ref: &str) -> Result<()> {
        self.require_admin(external_id, actor_ref)?;
        self.repository.deactivate(external_id).await?;
        info!("Deactivated group {}", external_id);
        Ok(())
    }

    async fn grant_admin(&self, group_ref: &str, actor_ref: &str, member: NewMember) -> Result<()> {
        self.require_admin(group_ref, actor_ref)?;
        member.validate()?;
        let member = self.repository.upsert_member(member).await?;
        self.repository
            .set_membership_admin(group_ref, &member.external_id, true)
            .await
    }

    async fn revoke_admin(&self, group_ref: &str, actor_ref: &str, member_ref: &str) -> Result<()> {
        self.require_admin(group_ref, actor_ref)?;
        self.repository
            .set_membership_admin(group_ref, member_ref, false)
            .await
    }

    fn is_admin(&self, group_ref: &str, member_ref: &str) -> Result<bool> {
        self.repository.is_admin(group_ref, member_ref)
    }

    fn require_admin(&self, group_ref: &str, member_ref: &str) -> Result<()> {
        if self.repository.is_admin(group_ref, member_ref)? {
            Ok(())
        } else {
            Err(GroupError::NotAdmin {
                group: group_ref.to_string(),
                member: member_ref.to_string(),
            }
            .into())
        }
    }
}
