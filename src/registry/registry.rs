use std::sync::Arc;

use tokio::sync::Mutex;

use super::errors::{RegistryError, RegistryResult};
use super::outcome::{DeleteOutcome, RemoveOutcome};
use crate::model::{GroupId, Member, RoleName, Snapshot};
use crate::observability::{Event, Logger, MetricsRegistry};
use crate::replication::ReplicationHandle;
use crate::store::SnapshotStore;

/// Startup policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryOptions {
    /// Start empty instead of failing when the stored snapshot is corrupt
    pub tolerate_corrupt: bool,
}

/// Result of applying an operation to the working copy
struct Applied<T> {
    value: T,
    changed: bool,
}

/// Shared handle to the registry. Cheap to clone.
#[derive(Debug, Clone)]
pub struct RoleRegistry {
    state: Arc<Mutex<Snapshot>>,
    store: Arc<dyn SnapshotStore>,
    replication: Option<ReplicationHandle>,
    metrics: Arc<MetricsRegistry>,
}

impl RoleRegistry {
    /// Load the stored snapshot and open the registry over it.
    ///
    /// A corrupt snapshot fails startup unless `options.tolerate_corrupt`
    /// is set, in which case the registry starts empty and the next commit
    /// overwrites the damaged copy.
    pub async fn open(
        store: Arc<dyn SnapshotStore>,
        options: RegistryOptions,
    ) -> RegistryResult<Self> {
        let location = store.location();
        let snapshot = match store.load().await {
            Ok(snapshot) => {
                let groups = snapshot.group_count().to_string();
                let roles = snapshot.role_count().to_string();
                Logger::info(
                    Event::SnapshotLoaded,
                    &[
                        ("location", location.as_str()),
                        ("groups", groups.as_str()),
                        ("roles", roles.as_str()),
                    ],
                );
                snapshot
            }
            Err(err) if err.is_corrupt() && options.tolerate_corrupt => {
                let detail = err.to_string();
                Logger::warn(
                    Event::SnapshotCorruptIgnored,
                    &[("location", location.as_str()), ("error", detail.as_str())],
                );
                Snapshot::new()
            }
            Err(err) => {
                if err.is_corrupt() {
                    let detail = err.to_string();
                    Logger::fatal(
                        Event::SnapshotCorrupt,
                        &[("location", location.as_str()), ("error", detail.as_str())],
                    );
                }
                return Err(err.into());
            }
        };

        Ok(Self {
            state: Arc::new(Mutex::new(snapshot)),
            store,
            replication: None,
            metrics: Arc::new(MetricsRegistry::new()),
        })
    }

    /// Publish every committed snapshot to a replication worker.
    pub fn with_replication(mut self, handle: ReplicationHandle) -> Self {
        self.replication = Some(handle);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    pub fn store_location(&self) -> String {
        self.store.location()
    }

    /// Add members to a role, creating it if absent.
    ///
    /// Returns the members actually added; already-present members are
    /// skipped. If none are new, nothing is saved.
    pub async fn add_members(
        &self,
        group: &GroupId,
        role: &RoleName,
        members: Vec<Member>,
    ) -> RegistryResult<Vec<Member>> {
        if members.is_empty() {
            return Err(RegistryError::EmptyMemberSet);
        }
        let (g, r) = (group.clone(), role.clone());
        self.commit("add_members", group, role, move |snapshot| {
            let added = snapshot.add_members(&g, &r, members);
            let changed = !added.is_empty();
            Applied {
                value: added,
                changed,
            }
        })
        .await
    }

    /// Remove members from a role, pruning it once empty.
    pub async fn remove_members(
        &self,
        group: &GroupId,
        role: &RoleName,
        members: Vec<Member>,
    ) -> RegistryResult<RemoveOutcome> {
        if members.is_empty() {
            return Err(RegistryError::EmptyMemberSet);
        }
        let (g, r) = (group.clone(), role.clone());
        self.commit("remove_members", group, role, move |snapshot| {
            match snapshot.remove_members(&g, &r, members) {
                Some(removed) => {
                    let changed = !removed.is_empty();
                    Applied {
                        value: RemoveOutcome::Removed(removed),
                        changed,
                    }
                }
                None => Applied {
                    value: RemoveOutcome::RoleNotFound,
                    changed: false,
                },
            }
        })
        .await
    }

    /// Delete a role regardless of membership.
    pub async fn delete_role(
        &self,
        group: &GroupId,
        role: &RoleName,
    ) -> RegistryResult<DeleteOutcome> {
        let (g, r) = (group.clone(), role.clone());
        self.commit("delete_role", group, role, move |snapshot| {
            if snapshot.delete_role(&g, &r) {
                Applied {
                    value: DeleteOutcome::Deleted,
                    changed: true,
                }
            } else {
                Applied {
                    value: DeleteOutcome::RoleNotFound,
                    changed: false,
                }
            }
        })
        .await
    }

    /// Roles of a group with their members, in role creation order.
    pub async fn list_roles(&self, group: &GroupId) -> Vec<(RoleName, Vec<Member>)> {
        self.state.lock().await.list_roles(group)
    }

    /// Members of a role in insertion order. `None` if the role does not exist.
    pub async fn members_of(&self, group: &GroupId, role: &RoleName) -> Option<Vec<Member>> {
        self.state
            .lock()
            .await
            .members_of(group, role)
            .map(|set| set.to_vec())
    }

    /// Copy of the full committed state
    pub async fn snapshot(&self) -> Snapshot {
        self.state.lock().await.clone()
    }

    async fn commit<T, F>(
        &self,
        operation: &'static str,
        group: &GroupId,
        role: &RoleName,
        apply: F,
    ) -> RegistryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Snapshot) -> Applied<T> + Send + 'static,
    {
        // Dropping the caller while queued here leaves no trace
        let mut guard = Arc::clone(&self.state).lock_owned().await;

        let store = Arc::clone(&self.store);
        let replication = self.replication.clone();
        let metrics = Arc::clone(&self.metrics);
        let group = group.to_string();
        let role = role.to_string();

        let task = tokio::spawn(async move {
            let mut working = guard.clone();
            let Applied { value, changed } = apply(&mut working);
            let fields = [
                ("operation", operation),
                ("group", group.as_str()),
                ("role", role.as_str()),
            ];

            if !changed {
                metrics.increment_noops();
                Logger::trace(Event::RoleNoop, &fields);
                return Ok(value);
            }

            if let Err(err) = store.save(&working).await {
                metrics.increment_commit_failures();
                let detail = err.to_string();
                Logger::error(
                    Event::RoleCommitFailed,
                    &[
                        ("operation", operation),
                        ("group", group.as_str()),
                        ("role", role.as_str()),
                        ("code", err.code()),
                        ("error", detail.as_str()),
                    ],
                );
                return Err(RegistryError::Store(err));
            }

            if let Some(handle) = &replication {
                handle.publish(working.clone());
            }
            *guard = working;
            metrics.increment_commits();
            Logger::info(Event::RoleCommit, &fields);
            Ok(value)
        });

        task.await
            .map_err(|e| RegistryError::Internal(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemorySnapshotStore;

    fn g() -> GroupId {
        GroupId::parse("g1").unwrap()
    }

    fn role(name: &str) -> RoleName {
        RoleName::parse(name).unwrap()
    }

    fn members(names: &[&str]) -> Vec<Member> {
        names.iter().map(|n| Member::parse(n).unwrap()).collect()
    }

    async fn open(store: Arc<MemorySnapshotStore>) -> RoleRegistry {
        RoleRegistry::open(store, RegistryOptions::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_add_saves_once_per_change() {
        let store = Arc::new(MemorySnapshotStore::new());
        let registry = open(store.clone()).await;

        let added = registry
            .add_members(&g(), &role("eng"), members(&["alice", "bob"]))
            .await
            .unwrap();
        assert_eq!(added, members(&["alice", "bob"]));
        assert_eq!(store.save_count(), 1);

        let again = registry
            .add_members(&g(), &role("eng"), members(&["alice"]))
            .await
            .unwrap();
        assert!(again.is_empty());
        assert_eq!(store.save_count(), 1);
        assert_eq!(registry.metrics().snapshot().noops, 1);
    }

    #[tokio::test]
    async fn test_empty_member_set_rejected() {
        let registry = open(Arc::new(MemorySnapshotStore::new())).await;
        let err = registry
            .add_members(&g(), &role("eng"), Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::EmptyMemberSet));
    }

    #[tokio::test]
    async fn test_remove_from_missing_role() {
        let store = Arc::new(MemorySnapshotStore::new());
        let registry = open(store.clone()).await;
        let outcome = registry
            .remove_members(&g(), &role("ghost"), members(&["alice"]))
            .await
            .unwrap();
        assert_eq!(outcome, RemoveOutcome::RoleNotFound);
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_role() {
        let registry = open(Arc::new(MemorySnapshotStore::new())).await;
        registry
            .add_members(&g(), &role("eng"), members(&["alice"]))
            .await
            .unwrap();
        assert_eq!(
            registry.delete_role(&g(), &role("ENG")).await.unwrap(),
            DeleteOutcome::Deleted
        );
        assert_eq!(
            registry.delete_role(&g(), &role("eng")).await.unwrap(),
            DeleteOutcome::RoleNotFound
        );
        assert!(registry.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_save_rolls_back() {
        let store = Arc::new(MemorySnapshotStore::new());
        let registry = open(store.clone()).await;
        registry
            .add_members(&g(), &role("eng"), members(&["alice"]))
            .await
            .unwrap();
        let before = registry.snapshot().await;

        store.fail_saves(true);
        let err = registry
            .add_members(&g(), &role("eng"), members(&["bob", "carol"]))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "ROLECALL_STORE_IO");
        assert_eq!(registry.snapshot().await, before);
        assert_eq!(registry.metrics().snapshot().commit_failures, 1);
    }

    #[tokio::test]
    async fn test_corrupt_store_policy() {
        let strict = RoleRegistry::open(
            Arc::new(MemorySnapshotStore::with_bytes("{\"g\": [")),
            RegistryOptions::default(),
        )
        .await;
        assert_eq!(strict.unwrap_err().code(), "ROLECALL_STORE_CORRUPT");

        let tolerant = RoleRegistry::open(
            Arc::new(MemorySnapshotStore::with_bytes("{\"g\": [")),
            RegistryOptions {
                tolerate_corrupt: true,
            },
        )
        .await
        .unwrap();
        assert!(tolerant.snapshot().await.is_empty());
    }
}
