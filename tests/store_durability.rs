//! Snapshot Durability Tests
//!
//! The registry over a real file:
//! - Every acknowledged change survives a reopen
//! - The stored file is the plain JSON layout operators read
//! - Leftover temp files from an interrupted save are never read
//! - A failed save keeps the previous file byte for byte

use std::fs;
use std::sync::Arc;

use rolecall::model::{GroupId, Member, RoleName};
use rolecall::registry::{RegistryError, RegistryOptions, RoleRegistry};
use rolecall::store::{FileSnapshotStore, SnapshotStore};
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

fn create_temp_data_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

async fn open_at(path: &std::path::Path) -> RoleRegistry {
    let store: Arc<dyn SnapshotStore> = Arc::new(FileSnapshotStore::new(path));
    RoleRegistry::open(store, RegistryOptions::default())
        .await
        .expect("Failed to open registry")
}

fn members(raw: &[&str]) -> Vec<Member> {
    raw.iter().map(|m| Member::parse(m).unwrap()).collect()
}

// =============================================================================
// Durability
// =============================================================================

#[tokio::test]
async fn test_acknowledged_changes_survive_reopen() {
    let dir = create_temp_data_dir();
    let path = dir.path().join("data/roles.json");
    let g = GroupId::parse("-1001").unwrap();

    {
        let registry = open_at(&path).await;
        for (role, who) in [("eng", "alice"), ("eng", "bob"), ("ops", "carol")] {
            registry
                .add_members(&g, &RoleName::parse(role).unwrap(), members(&[who]))
                .await
                .unwrap();
        }
        registry
            .remove_members(&g, &RoleName::parse("eng").unwrap(), members(&["alice"]))
            .await
            .unwrap();
    }

    let reopened = open_at(&path).await;
    let roles = reopened.list_roles(&g).await;
    assert_eq!(roles.len(), 2);
    assert_eq!(roles[0].0.as_str(), "eng");
    assert_eq!(roles[0].1, members(&["bob"]));
    assert_eq!(roles[1].0.as_str(), "ops");
    assert_eq!(roles[1].1, members(&["carol"]));
}

/// What a reopened process reads back matches what the live registry held.
#[tokio::test]
async fn test_unusual_handles_survive_reopen() {
    let dir = create_temp_data_dir();
    let path = dir.path().join("roles.json");
    let g = GroupId::parse("g").unwrap();
    let r = RoleName::parse("eng").unwrap();

    let before = {
        let registry = open_at(&path).await;
        registry
            .add_members(&g, &r, members(&["@carol", "Zoë", "quote\"d", "x@y"]))
            .await
            .unwrap();
        assert!(Member::parse("@@erin").is_err());
        registry.members_of(&g, &r).await.unwrap()
    };

    let reopened = open_at(&path).await;
    assert_eq!(reopened.members_of(&g, &r).await.unwrap(), before);
}

#[tokio::test]
async fn test_file_is_plain_json() {
    let dir = create_temp_data_dir();
    let path = dir.path().join("roles.json");
    let registry = open_at(&path).await;

    registry
        .add_members(
            &GroupId::parse("g").unwrap(),
            &RoleName::parse("Eng").unwrap(),
            members(&["@zed", "amy"]),
        )
        .await
        .unwrap();

    let stored: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    assert_eq!(stored, serde_json::json!({"g": {"eng": ["zed", "amy"]}}));
}

#[tokio::test]
async fn test_hand_written_file_is_accepted() {
    let dir = create_temp_data_dir();
    let path = dir.path().join("roles.json");
    fs::write(&path, r#"{"g": {"QA": ["@ann", "ben"]}}"#).unwrap();

    let registry = open_at(&path).await;
    let listed = registry
        .members_of(&GroupId::parse("g").unwrap(), &RoleName::parse("qa").unwrap())
        .await
        .unwrap();
    assert_eq!(listed, members(&["ann", "ben"]));
}

// =============================================================================
// Crash Leftovers
// =============================================================================

/// A save interrupted before its rename leaves only a temp file behind.
/// The next start reads the previous snapshot and ignores the leftover.
#[tokio::test]
async fn test_stray_temp_file_is_ignored() {
    let dir = create_temp_data_dir();
    let path = dir.path().join("roles.json");
    fs::write(&path, r#"{"g": {"eng": ["alice"]}}"#).unwrap();
    fs::write(dir.path().join(".roles.json.deadbeef.tmp"), "{half").unwrap();

    let registry = open_at(&path).await;
    let listed = registry
        .members_of(&GroupId::parse("g").unwrap(), &RoleName::parse("eng").unwrap())
        .await
        .unwrap();
    assert_eq!(listed, members(&["alice"]));
}

#[tokio::test]
async fn test_truncated_file_stops_startup() {
    let dir = create_temp_data_dir();
    let path = dir.path().join("roles.json");
    fs::write(&path, r#"{"g": {"eng": ["ali"#).unwrap();

    let store: Arc<dyn SnapshotStore> = Arc::new(FileSnapshotStore::new(&path));
    let err = RoleRegistry::open(store, RegistryOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "ROLECALL_STORE_CORRUPT");
    // Startup failure never rewrites the damaged file
    assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"g": {"eng": ["ali"#);
}

// =============================================================================
// Failed Saves
// =============================================================================

#[tokio::test]
async fn test_unwritable_location_rolls_back() {
    let dir = create_temp_data_dir();
    let blocker = dir.path().join("blocker");
    let registry = open_at(&blocker.join("roles.json")).await;
    // A regular file where the data directory should be created
    fs::write(&blocker, b"x").unwrap();

    let g = GroupId::parse("g").unwrap();
    let err = registry
        .add_members(&g, &RoleName::parse("eng").unwrap(), members(&["alice"]))
        .await
        .unwrap_err();

    assert!(matches!(err, RegistryError::Store(_)));
    assert_eq!(err.code(), "ROLECALL_STORE_IO");
    assert!(registry.list_roles(&g).await.is_empty());
    assert_eq!(fs::read(&blocker).unwrap(), b"x");
}
