//! Metrics registry
//!
//! - Counters only, monotonic, reset on process start
//! - Relaxed atomics: exactness across threads is not required

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Mutations that saved and swapped in
    commits: AtomicU64,
    /// Mutations rolled back because the save failed or timed out
    commit_failures: AtomicU64,
    /// Mutations that changed nothing and skipped the save
    noops: AtomicU64,
    /// Pushes accepted by the remote
    replicated: AtomicU64,
    /// Pushes skipped (no remote or unchanged)
    replication_skipped: AtomicU64,
    /// Pushes that failed
    replication_failed: AtomicU64,
    /// Chat commands rejected by authorization
    commands_denied: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_commits(&self) {
        self.commits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_commit_failures(&self) {
        self.commit_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_noops(&self) {
        self.noops.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_replicated(&self) {
        self.replicated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_replication_skipped(&self) {
        self.replication_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_replication_failed(&self) {
        self.replication_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_commands_denied(&self) {
        self.commands_denied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            commits: self.commits.load(Ordering::Relaxed),
            commit_failures: self.commit_failures.load(Ordering::Relaxed),
            noops: self.noops.load(Ordering::Relaxed),
            replicated: self.replicated.load(Ordering::Relaxed),
            replication_skipped: self.replication_skipped.load(Ordering::Relaxed),
            replication_failed: self.replication_failed.load(Ordering::Relaxed),
            commands_denied: self.commands_denied.load(Ordering::Relaxed),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self.snapshot()).unwrap_or_default()
    }
}

/// Point-in-time copy of all counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub commits: u64,
    pub commit_failures: u64,
    pub noops: u64,
    pub replicated: u64,
    pub replication_skipped: u64,
    pub replication_failed: u64,
    pub commands_denied: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_has_zero_values() {
        let snapshot = MetricsRegistry::new().snapshot();
        assert_eq!(snapshot.commits, 0);
        assert_eq!(snapshot.replication_failed, 0);
    }

    #[test]
    fn test_to_json() {
        let registry = MetricsRegistry::new();
        registry.increment_commits();
        registry.increment_commits();
        registry.increment_replication_failed();

        let json = registry.to_json();
        assert_eq!(json["commits"], 2);
        assert_eq!(json["replication_failed"], 1);
        assert_eq!(json["noops"], 0);
    }

    #[test]
    fn test_thread_safety() {
        use std::sync::Arc;
        use std::thread;

        let registry = Arc::new(MetricsRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let reg = Arc::clone(&registry);
                thread::spawn(move || {
                    for _ in 0..100 {
                        reg.increment_commits();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.snapshot().commits, 800);
    }
}
