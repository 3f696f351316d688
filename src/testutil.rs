//! Shared test helpers for in-crate tests.

use std::sync::Arc;

use crate::config::{Config, ServerConfig, StorageBackend, StorageConfig, UploadConfig};
use crate::storage::LocalStore;
use crate::AppState;

pub const TEST_ACCESS_CODE: &str = "blandiana";

/// Create a test AppState backed by a local store in a temporary directory.
pub fn test_state(temp_dir: &tempfile::TempDir) -> Arc<AppState> {
    let data_dir = temp_dir.path().join("data");

    let config = Config {
        server: ServerConfig::default(),
        storage: StorageConfig {
            backend: StorageBackend::Local,
            local_data_dir: data_dir.to_string_lossy().to_string(),
            ..StorageConfig::default()
        },
        uploads: UploadConfig::default(),
        access_code: Some(TEST_ACCESS_CODE.to_string()),
    };

    let store = LocalStore::open(&data_dir).expect("Failed to open test store");

    Arc::new(AppState {
        config,
        store: Arc::new(store),
    })
}
