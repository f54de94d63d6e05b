//! Shared test utilities and mock infrastructure.

#![allow(dead_code, unused_imports)]

pub mod mock_service;

use std::path::PathBuf;

use tempfile::TempDir;
use vmpool::config::FileStoreOptions;
use vmpool::pool::{document, PoolCollection};

pub use mock_service::{CapturedRequest, MockResponse, MockService};

/// Two members in `pool1`, nothing leased.
pub const TWO_MEMBER_POOL: &str = r#"pool1:
  pool_instances:
    - vmA
    - vmB
  used_instances: []
"#;

/// Write a pool document into a fresh temp dir.
pub fn temp_pool_file(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("vmpool.yaml");
    std::fs::write(&path, content).expect("Failed to write pool file");
    (temp_dir, path)
}

pub fn file_options(path: &PathBuf) -> FileStoreOptions {
    FileStoreOptions {
        pool_file: path.clone(),
        lock: true,
    }
}

/// Decode the pool document currently on disk.
pub fn read_pools(path: &PathBuf) -> PoolCollection {
    let content = std::fs::read_to_string(path).expect("Failed to read pool file");
    document::decode(&content).expect("Pool file is not a valid document")
}
