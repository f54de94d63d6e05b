mod common;

use std::collections::HashSet;
use std::sync::{Arc, Barrier};

use common::{file_options, read_pools, temp_pool_file, TWO_MEMBER_POOL};
use vmpool::config::FileStoreOptions;
use vmpool::{PoolStore, ReleaseStatus, StoreError, StoreKind};
use vmpool::store::FileStore;

/// Test the lease, return and retire cycle against a real file.
#[test]
fn test_lease_return_retire_cycle() {
    let (_dir, path) = temp_pool_file(TWO_MEMBER_POOL);
    let mut store = FileStore::open(&file_options(&path)).unwrap();
    assert_eq!(store.kind(), StoreKind::File);

    let first = store.acquire("pool1").unwrap();
    assert!(first.as_str() == "vmA" || first.as_str() == "vmB");

    let pools = read_pools(&path);
    let pool = pools.get("pool1").unwrap();
    assert_eq!(pool.available.len(), 1);
    assert_eq!(pool.leased, vec![first.to_string()]);

    let status = store.release(first.as_str(), "pool1", true).unwrap();
    assert_eq!(status, ReleaseStatus::Returned);

    let pools = read_pools(&path);
    let pool = pools.get("pool1").unwrap();
    assert_eq!(pool.available.len(), 2);
    assert!(pool.available.contains(&first.to_string()));
    assert!(pool.leased.is_empty());

    let second = store.acquire("pool1").unwrap();
    let status = store.release(second.as_str(), "pool1", false).unwrap();
    assert_eq!(status, ReleaseStatus::Retired);

    let pools = read_pools(&path);
    let pool = pools.get("pool1").unwrap();
    assert_eq!(pool.available.len(), 1);
    assert!(!pool.available.contains(&second.to_string()));
    assert!(pool.leased.is_empty());
    assert_eq!(pool.garbage, vec![second.to_string()]);
}

/// Test that draining a pool yields every member exactly once, then EmptyPool.
#[test]
fn test_drain_pool_then_empty() {
    let (_dir, path) = temp_pool_file(TWO_MEMBER_POOL);
    let mut store = FileStore::open(&file_options(&path)).unwrap();

    let a = store.acquire("pool1").unwrap();
    let b = store.acquire("pool1").unwrap();
    assert_ne!(a, b);

    let err = store.acquire("pool1").unwrap_err();
    assert!(matches!(err, StoreError::EmptyPool { ref pool } if pool == "pool1"));
    assert!(err.is_retryable());

    let pools = read_pools(&path);
    assert_eq!(pools.get("pool1").unwrap().leased.len(), 2);
}

/// Test that releasing twice with reuse leaves a single available entry.
#[test]
fn test_release_with_reuse_is_idempotent() {
    let (_dir, path) = temp_pool_file(TWO_MEMBER_POOL);
    let mut store = FileStore::open(&file_options(&path)).unwrap();

    let member = store.acquire("pool1").unwrap();
    assert_eq!(
        store.release(member.as_str(), "pool1", true).unwrap(),
        ReleaseStatus::Returned
    );
    assert_eq!(
        store.release(member.as_str(), "pool1", true).unwrap(),
        ReleaseStatus::Unchanged
    );

    let pools = read_pools(&path);
    let pool = pools.get("pool1").unwrap();
    let count = pool
        .available
        .iter()
        .filter(|m| m.as_str() == member.as_str())
        .count();
    assert_eq!(count, 1);
}

/// Test that retiring twice records the member in garbage only once.
#[test]
fn test_retire_is_idempotent() {
    let (_dir, path) = temp_pool_file(TWO_MEMBER_POOL);
    let mut store = FileStore::open(&file_options(&path)).unwrap();

    let member = store.acquire("pool1").unwrap();
    store.release(member.as_str(), "pool1", false).unwrap();
    assert_eq!(
        store.release(member.as_str(), "pool1", false).unwrap(),
        ReleaseStatus::Unchanged
    );

    let pools = read_pools(&path);
    assert_eq!(pools.get("pool1").unwrap().garbage, vec![member.to_string()]);
}

/// Test that an unknown pool is reported and not created.
#[test]
fn test_unknown_pool_is_not_created() {
    let (_dir, path) = temp_pool_file(TWO_MEMBER_POOL);
    let mut store = FileStore::open(&file_options(&path)).unwrap();

    let err = store.acquire("pool9").unwrap_err();
    assert!(matches!(err, StoreError::PoolNotFound { ref pool } if pool == "pool9"));

    let err = store.release("vmA", "pool9", true).unwrap_err();
    assert_eq!(err.kind(), "pool_not_found");

    assert!(read_pools(&path).get("pool9").is_none());
}

/// Test that a missing pool file fails at construction.
#[test]
fn test_missing_file_fails_open() {
    let dir = tempfile::TempDir::new().unwrap();
    let options = FileStoreOptions {
        pool_file: dir.path().join("absent.yaml"),
        lock: true,
    };

    let err = FileStore::open(&options).err().unwrap();
    assert!(matches!(err, StoreError::Io { .. }));
}

/// Test that a document breaking the pool invariants is rejected.
#[test]
fn test_malformed_document_is_rejected() {
    let (_dir, path) = temp_pool_file(
        "pool1:\n  pool_instances: [vmA]\n  used_instances: [vmA]\n",
    );

    let err = FileStore::open(&file_options(&path)).err().unwrap();
    assert_eq!(err.kind(), "malformed_document");
    assert!(err.to_string().contains("vmA"));
}

/// Test that an empty file is an empty collection.
#[test]
fn test_empty_file_has_no_pools() {
    let (_dir, path) = temp_pool_file("");
    let mut store = FileStore::open(&file_options(&path)).unwrap();

    assert!(store.current_state(false).unwrap().is_empty());
    assert!(matches!(
        store.acquire("pool1"),
        Err(StoreError::PoolNotFound { .. })
    ));
}

/// Test that current_state only sees external edits after a refresh.
#[test]
fn test_refresh_picks_up_external_changes() {
    let (_dir, path) = temp_pool_file(TWO_MEMBER_POOL);
    let options = FileStoreOptions {
        pool_file: path.clone(),
        lock: false,
    };
    let mut store = FileStore::open(&options).unwrap();

    std::fs::write(
        &path,
        "pool1:\n  pool_instances: [vmA, vmB, vmC]\n  used_instances: []\n",
    )
    .unwrap();

    let cached = store.current_state(false).unwrap();
    assert_eq!(cached.get("pool1").unwrap().available.len(), 2);

    let fresh = store.current_state(true).unwrap();
    assert_eq!(fresh.get("pool1").unwrap().available.len(), 3);
}

/// Test that locked mutations re-read the file and see other writers.
#[test]
fn test_locked_store_sees_other_writers() {
    let (_dir, path) = temp_pool_file(TWO_MEMBER_POOL);
    let mut first = FileStore::open(&file_options(&path)).unwrap();
    let mut second = FileStore::open(&file_options(&path)).unwrap();

    let a = first.acquire("pool1").unwrap();
    let b = second.acquire("pool1").unwrap();
    assert_ne!(a, b);

    assert!(matches!(
        first.acquire("pool1"),
        Err(StoreError::EmptyPool { .. })
    ));
    assert!(path.with_file_name("vmpool.yaml.lock").exists());
}

/// Test that concurrent acquirers on one host never share a member.
#[test]
fn test_concurrent_acquire_hands_out_distinct_members() {
    let members: Vec<String> = (0..8).map(|i| format!("vm{}", i)).collect();
    let (_dir, path) = temp_pool_file(&format!(
        "pool1:\n  pool_instances: [{}]\n  used_instances: []\n",
        members.join(", ")
    ));

    let barrier = Arc::new(Barrier::new(members.len()));
    let handles: Vec<_> = (0..members.len())
        .map(|_| {
            let barrier = Arc::clone(&barrier);
            let options = file_options(&path);
            std::thread::spawn(move || {
                let mut store = FileStore::open(&options).unwrap();
                barrier.wait();
                store.acquire("pool1").unwrap().into_string()
            })
        })
        .collect();

    let leased: HashSet<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(leased.len(), members.len());

    let pools = read_pools(&path);
    let pool = pools.get("pool1").unwrap();
    assert!(pool.available.is_empty());
    assert_eq!(pool.leased.len(), members.len());
}

/// Test that unknown keys in a pool entry survive a rewrite.
#[test]
fn test_extra_pool_keys_are_preserved() {
    let (_dir, path) = temp_pool_file(
        "pool1:\n  pool_instances: [vmA]\n  used_instances: []\n  owner: qa-team\n",
    );
    let mut store = FileStore::open(&file_options(&path)).unwrap();
    store.acquire("pool1").unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("owner: qa-team"));
}
