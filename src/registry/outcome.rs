//! Ordinary results of mutating operations

use crate::model::Member;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// Members actually removed, possibly none
    Removed(Vec<Member>),
    RoleNotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    RoleNotFound,
}
