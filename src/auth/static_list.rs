//! Configured admin lists

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use super::Authorizer;
use crate::model::GroupId;

/// Admins listed per group, plus global admins privileged everywhere.
///
/// User ids are compared exactly after trimming; an `@` prefix is ignored
/// so that handles and ids can be listed the same way.
#[derive(Debug, Clone, Default)]
pub struct StaticAuthorizer {
    global: HashSet<String>,
    per_group: HashMap<GroupId, HashSet<String>>,
}

fn normalize(user_id: &str) -> String {
    let trimmed = user_id.trim();
    trimmed.strip_prefix('@').unwrap_or(trimmed).to_string()
}

impl StaticAuthorizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from config maps. Entries with an empty group id are skipped.
    pub fn from_lists(global: &[String], per_group: &HashMap<String, Vec<String>>) -> Self {
        let mut auth = Self::new();
        for user in global {
            auth.grant_global(user);
        }
        for (group, users) in per_group {
            if let Ok(group) = GroupId::parse(group) {
                for user in users {
                    auth.grant(&group, user);
                }
            }
        }
        auth
    }

    pub fn grant(&mut self, group: &GroupId, user_id: &str) {
        self.per_group
            .entry(group.clone())
            .or_default()
            .insert(normalize(user_id));
    }

    pub fn grant_global(&mut self, user_id: &str) {
        self.global.insert(normalize(user_id));
    }
}

#[async_trait]
impl Authorizer for StaticAuthorizer {
    async fn is_privileged(&self, group: &GroupId, user_id: &str) -> bool {
        let user = normalize(user_id);
        if user.is_empty() {
            return false;
        }
        self.global.contains(&user)
            || self
                .per_group
                .get(group)
                .map_or(false, |admins| admins.contains(&user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_group_admin_scoped_to_group() {
        let mut auth = StaticAuthorizer::new();
        let g1 = GroupId::parse("g1").unwrap();
        let g2 = GroupId::parse("g2").unwrap();
        auth.grant(&g1, "@alice");

        assert!(auth.is_privileged(&g1, "alice").await);
        assert!(!auth.is_privileged(&g2, "alice").await);
        assert!(!auth.is_privileged(&g1, "bob").await);
    }

    #[tokio::test]
    async fn test_global_admin_and_case() {
        let mut per_group = HashMap::new();
        per_group.insert("g1".to_string(), vec!["42".to_string()]);
        let auth = StaticAuthorizer::from_lists(&["root".to_string()], &per_group);
        let g1 = GroupId::parse("g1").unwrap();

        assert!(auth.is_privileged(&GroupId::parse("any").unwrap(), "root").await);
        assert!(auth.is_privileged(&g1, " 42 ").await);
        assert!(!auth.is_privileged(&g1, "Root").await);
        assert!(!auth.is_privileged(&g1, "").await);
    }
}
