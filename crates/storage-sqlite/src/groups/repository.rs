//! Group repository backed by SQLite.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;
use uuid::Uuid;

use tokenbank_core::groups::{
    Group, GroupError, GroupInfo, GroupMemberInfo, GroupRepositoryTrait, Member, Membership,
    NewGroup, NewMember,
};
use tokenbank_core::{Error, Result};

use super::model::{GroupDB, MemberDB, MembershipDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::{groups, members, memberships};
use crate::utils::now_string;

pub struct GroupRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl GroupRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

/// Looks up a group row by external id, shared with the other repositories
/// that resolve refs inside a write transaction.
pub(crate) fn find_group_by_external_id(
    conn: &mut SqliteConnection,
    external_ref: &str,
) -> Result<Option<GroupDB>> {
    groups::table
        .filter(groups::external_id.eq(external_ref))
        .select(GroupDB::as_select())
        .first::<GroupDB>(conn)
        .optional()
        .into_core()
}

pub(crate) fn find_member_by_external_id(
    conn: &mut SqliteConnection,
    external_ref: &str,
) -> Result<Option<MemberDB>> {
    members::table
        .filter(members::external_id.eq(external_ref))
        .select(MemberDB::as_select())
        .first::<MemberDB>(conn)
        .optional()
        .into_core()
}

/// Creates the member row if unknown, refreshes the display name otherwise.
pub(crate) fn upsert_member_in_tx(
    conn: &mut SqliteConnection,
    new_member: &NewMember,
) -> Result<MemberDB> {
    if let Some(existing) = find_member_by_external_id(conn, &new_member.external_id)? {
        if !new_member.display_name.is_empty() && new_member.display_name != existing.display_name
        {
            diesel::update(members::table.find(&existing.id))
                .set((
                    members::display_name.eq(&new_member.display_name),
                    members::updated_at.eq(now_string()),
                ))
                .execute(conn)
                .into_core()?;
            return find_member_by_external_id(conn, &new_member.external_id)?
                .ok_or_else(|| GroupError::MemberNotFound(new_member.external_id.clone()).into());
        }
        return Ok(existing);
    }

    let now = now_string();
    let row = MemberDB {
        id: Uuid::new_v4().to_string(),
        external_id: new_member.external_id.clone(),
        display_name: new_member.display_name.clone(),
        created_at: now.clone(),
        updated_at: now,
    };
    diesel::insert_into(members::table)
        .values(&row)
        .execute(conn)
        .into_core()?;
    Ok(row)
}

#[async_trait]
impl GroupRepositoryTrait for GroupRepository {
    async fn create_with_admin(&self, new_group: NewGroup, admin: NewMember) -> Result<Group> {
        self.writer
            .exec(move |conn| {
                let now = now_string();
                let group_row = GroupDB {
                    id: Uuid::new_v4().to_string(),
                    external_id: new_group.external_id.clone(),
                    name: new_group.name.clone(),
                    balance: "0".to_string(),
                    is_active: true,
                    created_at: now.clone(),
                    updated_at: now.clone(),
                };
                diesel::insert_into(groups::table)
                    .values(&group_row)
                    .execute(conn)
                    .into_core()?;

                let member_row = upsert_member_in_tx(conn, &admin)?;

                diesel::insert_into(memberships::table)
                    .values(&MembershipDB {
                        id: Uuid::new_v4().to_string(),
                        group_id: group_row.id.clone(),
                        member_id: member_row.id,
                        is_admin: true,
                        joined_at: now,
                    })
                    .execute(conn)
                    .into_core()?;

                Ok(Group::from(group_row))
            })
            .await
    }

    fn get_by_external_id(&self, external_id: &str) -> Result<Group> {
        self.find_by_external_id(external_id)?
            .ok_or_else(|| GroupError::NotFound(external_id.to_string()).into())
    }

    fn find_by_external_id(&self, external_id: &str) -> Result<Option<Group>> {
        let mut conn = get_connection(&self.pool)?;
        Ok(find_group_by_external_id(&mut conn, external_id)?.map(Group::from))
    }

    fn find_active_by_code(&self, code: &str) -> Result<Vec<Group>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = groups::table
            .filter(groups::is_active.eq(true))
            .filter(groups::external_id.like(format!("%{}%", code)))
            .select(GroupDB::as_select())
            .order(groups::created_at.asc())
            .load::<GroupDB>(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(Group::from).collect())
    }

    async fn deactivate(&self, external_id: &str) -> Result<()> {
        let external_id = external_id.to_string();
        self.writer
            .exec(move |conn| {
                let updated = diesel::update(
                    groups::table.filter(groups::external_id.eq(&external_id)),
                )
                .set((
                    groups::is_active.eq(false),
                    groups::updated_at.eq(now_string()),
                ))
                .execute(conn)
                .into_core()?;
                if updated == 0 {
                    return Err(GroupError::NotFound(external_id.clone()).into());
                }
                Ok(())
            })
            .await
    }

    async fn upsert_member(&self, member: NewMember) -> Result<Member> {
        self.writer
            .exec(move |conn| upsert_member_in_tx(conn, &member).map(Member::from))
            .await
    }

    async fn set_membership_admin(
        &self,
        group_ref: &str,
        member_ref: &str,
        is_admin: bool,
    ) -> Result<()> {
        let group_ref = group_ref.to_string();
        let member_ref = member_ref.to_string();
        self.writer
            .exec(move |conn| {
                let group = find_group_by_external_id(conn, &group_ref)?
                    .ok_or_else(|| Error::from(GroupError::NotFound(group_ref.clone())))?;
                let member = find_member_by_external_id(conn, &member_ref)?
                    .ok_or_else(|| Error::from(GroupError::MemberNotFound(member_ref.clone())))?;

                let updated = diesel::update(
                    memberships::table
                        .filter(memberships::group_id.eq(&group.id))
                        .filter(memberships::member_id.eq(&member.id)),
                )
                .set(memberships::is_admin.eq(is_admin))
                .execute(conn)
                .into_core()?;

                if updated == 0 {
                    diesel::insert_into(memberships::table)
                        .values(&MembershipDB {
                            id: Uuid::new_v4().to_string(),
                            group_id: group.id,
                            member_id: member.id,
                            is_admin,
                            joined_at: now_string(),
                        })
                        .execute(conn)
                        .into_core()?;
                }
                Ok(())
            })
            .await
    }

    fn is_admin(&self, group_ref: &str, member_ref: &str) -> Result<bool> {
        let mut conn = get_connection(&self.pool)?;
        let count: i64 = memberships::table
            .inner_join(groups::table.on(groups::id.eq(memberships::group_id)))
            .inner_join(members::table.on(members::id.eq(memberships::member_id)))
            .filter(groups::external_id.eq(group_ref))
            .filter(members::external_id.eq(member_ref))
            .filter(memberships::is_admin.eq(true))
            .count()
            .get_result(&mut conn)
            .into_core()?;
        Ok(count > 0)
    }

    fn get_group_info(&self, external_id: &str) -> Result<GroupInfo> {
        let mut conn = get_connection(&self.pool)?;
        let group_row = find_group_by_external_id(&mut conn, external_id)?
            .ok_or_else(|| Error::from(GroupError::NotFound(external_id.to_string())))?;

        let rows: Vec<(MembershipDB, MemberDB)> = memberships::table
            .inner_join(members::table.on(members::id.eq(memberships::member_id)))
            .filter(memberships::group_id.eq(&group_row.id))
            .select((MembershipDB::as_select(), MemberDB::as_select()))
            .order(memberships::joined_at.asc())
            .load(&mut conn)
            .into_core()?;

        let members_info = rows
            .into_iter()
            .map(|(membership, member)| {
                let membership = Membership::from(membership);
                GroupMemberInfo {
                    member: Member::from(member),
                    is_admin: membership.is_admin,
                    joined_at: membership.joined_at,
                }
            })
            .collect();

        Ok(GroupInfo {
            group: Group::from(group_row),
            members: members_info,
        })
    }
}
