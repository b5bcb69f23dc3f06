#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use once_cell::sync::Lazy;
use tempfile::TempDir;
use villa_split::{
    config::ConfigManager, errors::Result, session::SettlementSession,
    storage::json_backend::JsonFileStore,
};

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Creates a unique data directory that is cleaned up when the test binary exits.
pub fn test_home() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

/// Opens a session over the store and config found under `base`, the same
/// layout the shell uses.
pub fn open_session(base: &Path) -> Result<SettlementSession> {
    let config = ConfigManager::with_base_dir(base.to_path_buf())?.load()?;
    let store = JsonFileStore::new(base.join("store"))?;
    SettlementSession::open(Box::new(store), config)
}
