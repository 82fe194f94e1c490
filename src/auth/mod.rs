//! Authorization for mutating commands
//!
//! The registry performs no authorization. The command layer asks an
//! `Authorizer` once per mutating command, before touching the registry.

mod static_list;

pub use static_list::StaticAuthorizer;

use std::fmt;

use async_trait::async_trait;

use crate::model::GroupId;

#[async_trait]
pub trait Authorizer: Send + Sync + fmt::Debug {
    /// Whether `user_id` may manage roles in `group`
    async fn is_privileged(&self, group: &GroupId, user_id: &str) -> bool;
}

/// Grants everyone. For trusted transports and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait]
impl Authorizer for AllowAll {
    async fn is_privileged(&self, _group: &GroupId, _user_id: &str) -> bool {
        true
    }
}
