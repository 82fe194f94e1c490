use std::sync::Arc;

use uuid::Uuid;

use super::parser::{parse, ChatCommand, Parsed};
use super::replies;
use crate::auth::Authorizer;
use crate::model::{GroupId, Member};
use crate::observability::{Event, Logger};
use crate::registry::{DeleteOutcome, RegistryError, RemoveOutcome, RoleRegistry};

/// Runs chat commands against the registry.
#[derive(Debug, Clone)]
pub struct CommandFacade {
    registry: RoleRegistry,
    authorizer: Arc<dyn Authorizer>,
    bot_name: Option<String>,
}

impl CommandFacade {
    pub fn new(registry: RoleRegistry, authorizer: Arc<dyn Authorizer>) -> Self {
        Self {
            registry,
            authorizer,
            bot_name: None,
        }
    }

    /// Only accept `/command@name` suffixes naming this bot.
    pub fn with_bot_name(mut self, name: impl Into<String>) -> Self {
        self.bot_name = Some(name.into());
        self
    }

    pub fn registry(&self) -> &RoleRegistry {
        &self.registry
    }

    /// Handle one message from `user_id` in `group`. `None` means stay silent.
    pub async fn execute(&self, group: &GroupId, user_id: &str, text: &str) -> Option<String> {
        let command = match parse(text, self.bot_name.as_deref()) {
            Parsed::Command(command) => command,
            Parsed::Usage(usage) => return Some(usage.to_string()),
            Parsed::Ignored => return None,
        };

        let request_id = Uuid::new_v4().to_string();
        Logger::trace(
            Event::CommandReceived,
            &[
                ("command", command.name()),
                ("group", group.as_str()),
                ("request_id", request_id.as_str()),
                ("user", user_id),
            ],
        );

        if command.is_mutating() && !self.authorizer.is_privileged(group, user_id).await {
            self.registry.metrics().increment_commands_denied();
            Logger::warn(
                Event::CommandDenied,
                &[
                    ("command", command.name()),
                    ("group", group.as_str()),
                    ("request_id", request_id.as_str()),
                    ("user", user_id),
                ],
            );
            return Some(replies::DENIED.to_string());
        }

        let name = command.name();
        match self.run(group, command).await {
            Ok(reply) => Some(reply),
            Err(err) => {
                let detail = err.to_string();
                Logger::error(
                    Event::CommandFailed,
                    &[
                        ("code", err.code()),
                        ("command", name),
                        ("error", detail.as_str()),
                        ("group", group.as_str()),
                        ("request_id", request_id.as_str()),
                    ],
                );
                Some(replies::STORE_FAILED.to_string())
            }
        }
    }

    async fn run(&self, group: &GroupId, command: ChatCommand) -> Result<String, RegistryError> {
        let reply = match command {
            ChatCommand::Start => replies::START.to_string(),
            ChatCommand::Help => replies::HELP.to_string(),
            ChatCommand::SetRole { members, role } => {
                let requested = dedup(members);
                let added = self
                    .registry
                    .add_members(group, &role, requested.clone())
                    .await?;
                let present = difference(&requested, &added);
                replies::added(&role, &added, &present)
            }
            ChatCommand::UnsetRole { members, role } => {
                let requested = dedup(members);
                match self
                    .registry
                    .remove_members(group, &role, requested.clone())
                    .await?
                {
                    RemoveOutcome::Removed(removed) => {
                        let absent = difference(&requested, &removed);
                        replies::removed(&role, &removed, &absent)
                    }
                    RemoveOutcome::RoleNotFound => replies::role_not_found(&role),
                }
            }
            ChatCommand::DelRole { role } => match self.registry.delete_role(group, &role).await? {
                DeleteOutcome::Deleted => replies::deleted(&role),
                DeleteOutcome::RoleNotFound => replies::role_not_found(&role),
            },
            ChatCommand::Mention { role } => match self.registry.members_of(group, &role).await {
                Some(members) => replies::mention(&role, &members),
                None => replies::role_not_found(&role),
            },
            ChatCommand::Roles => replies::roles(&self.registry.list_roles(group).await),
        };
        Ok(reply)
    }
}

fn dedup(members: Vec<Member>) -> Vec<Member> {
    let mut unique: Vec<Member> = Vec::with_capacity(members.len());
    for member in members {
        if !unique.contains(&member) {
            unique.push(member);
        }
    }
    unique
}

fn difference(all: &[Member], taken: &[Member]) -> Vec<Member> {
    all.iter().filter(|m| !taken.contains(m)).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AllowAll, StaticAuthorizer};
    use crate::registry::RegistryOptions;
    use crate::store::MemorySnapshotStore;

    async fn facade(authorizer: Arc<dyn Authorizer>) -> (CommandFacade, Arc<MemorySnapshotStore>) {
        let store = Arc::new(MemorySnapshotStore::new());
        let registry = RoleRegistry::open(store.clone(), RegistryOptions::default())
            .await
            .unwrap();
        (CommandFacade::new(registry, authorizer), store)
    }

    #[tokio::test]
    async fn test_setrole_then_mention() {
        let (facade, _) = facade(Arc::new(AllowAll)).await;
        let g = GroupId::parse("g1").unwrap();

        let reply = facade.execute(&g, "1", "/setrole @alice @bob eng").await.unwrap();
        assert_eq!(reply, "✅ @alice, @bob added to role *eng*");

        let reply = facade.execute(&g, "1", "/mention ENG").await.unwrap();
        assert_eq!(reply, "📢 Members with *eng* role:\n@alice @bob");
    }

    #[tokio::test]
    async fn test_non_admin_denied() {
        let mut auth = StaticAuthorizer::new();
        let g = GroupId::parse("g1").unwrap();
        auth.grant(&g, "admin");
        let (facade, store) = facade(Arc::new(auth)).await;

        let reply = facade.execute(&g, "mallory", "/setrole @m eng").await.unwrap();
        assert_eq!(reply, replies::DENIED);
        assert_eq!(store.save_count(), 0);
        assert_eq!(facade.registry().metrics().snapshot().commands_denied, 1);

        // Reads need no privilege
        let reply = facade.execute(&g, "mallory", "/roles").await.unwrap();
        assert_eq!(reply, replies::NO_ROLES);
    }

    #[tokio::test]
    async fn test_store_failure_reply() {
        let (facade, store) = facade(Arc::new(AllowAll)).await;
        let g = GroupId::parse("g1").unwrap();
        store.fail_saves(true);

        let reply = facade.execute(&g, "1", "/setrole @alice eng").await.unwrap();
        assert_eq!(reply, replies::STORE_FAILED);
        assert_eq!(
            facade.execute(&g, "1", "/roles").await.unwrap(),
            replies::NO_ROLES
        );
    }

    #[tokio::test]
    async fn test_silence_for_plain_text() {
        let (facade, _) = facade(Arc::new(AllowAll)).await;
        let g = GroupId::parse("g1").unwrap();
        assert!(facade.execute(&g, "1", "just chatting").await.is_none());
        assert!(facade.execute(&g, "1", "/frobnicate").await.is_none());
    }
}
