//! Group error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GroupError {
    #[error("Group not found: {0}")]
    NotFound(String),

    #[error("Group already bound: {0}")]
    AlreadyBound(String),

    #[error("Group is deactivated: {0}")]
    Inactive(String),

    #[error("Member not found: {0}")]
    MemberNotFound(String),

    #[error("Member {member} is not an admin of group {group}")]
    NotAdmin { group: String, member: String },
}
