use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::events::{DomainEvent, MockDomainEventSink};
use crate::groups::{
    Group, GroupError, GroupInfo, GroupMemberInfo, GroupRepositoryTrait, GroupService,
    GroupServiceTrait, Member, NewGroup, NewMember,
};
use crate::{Error, Result};

// --- In-memory mock repository ---

#[derive(Default)]
struct MockGroupRepository {
    groups: Mutex<HashMap<String, Group>>,
    members: Mutex<HashMap<String, Member>>,
    // (group external id, member external id) -> is_admin
    memberships: Mutex<HashMap<(String, String), bool>>,
}

impl MockGroupRepository {
    fn make_group(new_group: &NewGroup) -> Group {
        let now = Utc::now();
        Group {
            id: format!("internal-{}", new_group.external_id),
            external_id: new_group.external_id.clone(),
            name: new_group.name.clone(),
            balance: Decimal::ZERO,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn make_member(new_member: &NewMember) -> Member {
        let now = Utc::now();
        Member {
            id: format!("internal-{}", new_member.external_id),
            external_id: new_member.external_id.clone(),
            display_name: new_member.display_name.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[async_trait]
impl GroupRepositoryTrait for MockGroupRepository {
    async fn create_with_admin(&self, new_group: NewGroup, admin: NewMember) -> Result<Group> {
        let group = Self::make_group(&new_group);
        self.groups
            .lock()
            .unwrap()
            .insert(group.external_id.clone(), group.clone());
        self.members
            .lock()
            .unwrap()
            .insert(admin.external_id.clone(), Self::make_member(&admin));
        self.memberships
            .lock()
            .unwrap()
            .insert((group.external_id.clone(), admin.external_id), true);
        Ok(group)
    }

    fn get_by_external_id(&self, external_id: &str) -> Result<Group> {
        self.find_by_external_id(external_id)?
            .ok_or_else(|| GroupError::NotFound(external_id.to_string()).into())
    }

    fn find_by_external_id(&self, external_id: &str) -> Result<Option<Group>> {
        Ok(self.groups.lock().unwrap().get(external_id).cloned())
    }

    fn find_active_by_code(&self, code: &str) -> Result<Vec<Group>> {
        Ok(self
            .groups
            .lock()
            .unwrap()
            .values()
            .filter(|g| g.is_active && g.external_id.contains(code))
            .cloned()
            .collect())
    }

    async fn deactivate(&self, external_id: &str) -> Result<()> {
        let mut groups = self.groups.lock().unwrap();
        let group = groups
            .get_mut(external_id)
            .ok_or_else(|| Error::from(GroupError::NotFound(external_id.to_string())))?;
        group.is_active = false;
        Ok(())
    }

    async fn upsert_member(&self, member: NewMember) -> Result<Member> {
        let made = Self::make_member(&member);
        self.members
            .lock()
            .unwrap()
            .insert(member.external_id.clone(), made.clone());
        Ok(made)
    }

    async fn set_membership_admin(
        &self,
        group_ref: &str,
        member_ref: &str,
        is_admin: bool,
    ) -> Result<()> {
        self.memberships
            .lock()
            .unwrap()
            .insert((group_ref.to_string(), member_ref.to_string()), is_admin);
        Ok(())
    }

    fn is_admin(&self, group_ref: &str, member_ref: &str) -> Result<bool> {
        Ok(*self
            .memberships
            .lock()
            .unwrap()
            .get(&(group_ref.to_string(), member_ref.to_string()))
            .unwrap_or(&false))
    }

    fn get_group_info(&self, external_id: &str) -> Result<GroupInfo> {
        let group = self.get_by_external_id(external_id)?;
        let members = self.members.lock().unwrap();
        let memberships = self.memberships.lock().unwrap();
        let infos = memberships
            .iter()
            .filter(|((g, _), _)| g == external_id)
            .filter_map(|((_, m), is_admin)| {
                members.get(m).map(|member| GroupMemberInfo {
                    member: member.clone(),
                    is_admin: *is_admin,
                    joined_at: member.created_at,
                })
            })
            .collect();
        Ok(GroupInfo {
            group,
            members: infos,
        })
    }
}

fn service() -> (GroupService, Arc<MockGroupRepository>, MockDomainEventSink) {
    let repo = Arc::new(MockGroupRepository::default());
    let sink = MockDomainEventSink::new();
    (
        GroupService::new(repo.clone(), Arc::new(sink.clone())),
        repo,
        sink,
    )
}

fn new_group(external_id: &str) -> NewGroup {
    NewGroup {
        external_id: external_id.to_string(),
        name: format!("group {}", external_id),
    }
}

fn new_member(external_id: &str) -> NewMember {
    NewMember {
        external_id: external_id.to_string(),
        display_name: format!("member {}", external_id),
    }
}

#[tokio::test]
async fn test_bind_makes_first_member_admin() {
    let (svc, _repo, sink) = service();

    let group = svc
        .bind_group(new_group("C1"), new_member("U1"))
        .await
        .unwrap();
    assert_eq!(group.balance, Decimal::ZERO);
    assert!(group.is_active);
    assert!(svc.is_admin("C1", "U1").unwrap());

    match &sink.events()[0] {
        DomainEvent::GroupBound {
            group_id,
            admin_member_id,
        } => {
            assert_eq!(group_id, "C1");
            assert_eq!(admin_member_id, "U1");
        }
        other => panic!("Expected GroupBound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_bind_rejects_already_bound() {
    let (svc, _repo, _sink) = service();

    svc.bind_group(new_group("C1"), new_member("U1"))
        .await
        .unwrap();
    let err = svc
        .bind_group(new_group("C1"), new_member("U2"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Group(GroupError::AlreadyBound(_))));
}

#[tokio::test]
async fn test_admin_management_requires_admin() {
    let (svc, _repo, _sink) = service();

    svc.bind_group(new_group("C1"), new_member("U1"))
        .await
        .unwrap();

    // A non-admin cannot grant.
    let err = svc
        .grant_admin("C1", "U2", new_member("U3"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Group(GroupError::NotAdmin { .. })));

    // The binder can.
    svc.grant_admin("C1", "U1", new_member("U2")).await.unwrap();
    assert!(svc.is_admin("C1", "U2").unwrap());

    svc.revoke_admin("C1", "U1", "U2").await.unwrap();
    assert!(!svc.is_admin("C1", "U2").unwrap());
}

#[tokio::test]
async fn test_deactivate_keeps_group_row() {
    let (svc, repo, _sink) = service();

    svc.bind_group(new_group("C1"), new_member("U1"))
        .await
        .unwrap();
    svc.deactivate_group("C1", "U1").await.unwrap();

    let group = repo.find_by_external_id("C1").unwrap().unwrap();
    assert!(!group.is_active);
}

#[tokio::test]
async fn test_group_info_counts_admins() {
    let (svc, _repo, _sink) = service();

    svc.bind_group(new_group("C1"), new_member("U1"))
        .await
        .unwrap();
    svc.grant_admin("C1", "U1", new_member("U2")).await.unwrap();

    let info = svc.get_group_info("C1").unwrap();
    assert_eq!(info.members.len(), 2);
    assert_eq!(info.admin_count(), 2);
}
