//! Database models for groups, members, and memberships.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use tokenbank_core::groups::{Group, Member, Membership};

use crate::utils::{parse_datetime_tolerant, parse_decimal_tolerant};

/// Database model for groups
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
#[diesel(table_name = crate::schema::groups)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct GroupDB {
    pub id: String,
    pub external_id: String,
    pub name: String,
    pub balance: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<GroupDB> for Group {
    fn from(db: GroupDB) -> Self {
        Self {
            id: db.id,
            external_id: db.external_id,
            name: db.name,
            balance: parse_decimal_tolerant(&db.balance, "groups.balance"),
            is_active: db.is_active,
            created_at: parse_datetime_tolerant(&db.created_at, "groups.created_at"),
            updated_at: parse_datetime_tolerant(&db.updated_at, "groups.updated_at"),
        }
    }
}

/// Database model for members
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
#[diesel(table_name = crate::schema::members)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MemberDB {
    pub id: String,
    pub external_id: String,
    pub display_name: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<MemberDB> for Member {
    fn from(db: MemberDB) -> Self {
        Self {
            id: db.id,
            external_id: db.external_id,
            display_name: db.display_name,
            created_at: parse_datetime_tolerant(&db.created_at, "members.created_at"),
            updated_at: parse_datetime_tolerant(&db.updated_at, "members.updated_at"),
        }
    }
}

/// Database model for memberships
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
#[diesel(table_name = crate::schema::memberships)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MembershipDB {
    pub id: String,
    pub group_id: String,
    pub member_id: String,
    pub is_admin: bool,
    pub joined_at: String,
}

impl From<MembershipDB> for Membership {
    fn from(db: MembershipDB) -> Self {
        Self {
            group_id: db.group_id,
            member_id: db.member_id,
            is_admin: db.is_admin,
            joined_at: parse_datetime_tolerant(&db.joined_at, "memberships.joined_at"),
        }
    }
}
