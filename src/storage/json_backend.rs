use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::errors::{Result, SettlementError};
use crate::utils::{app_data_dir, ensure_dir};

use super::KeyValueStore;

const VALUE_EXTENSION: &str = "json";
const TMP_SUFFIX: &str = "tmp";
const STORE_DIR: &str = "store";

/// Filesystem store keeping one JSON document per key under a root directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: PathBuf) -> Result<Self> {
        ensure_dir(&root)?;
        Ok(Self { root })
    }

    /// Store rooted in the application data directory.
    pub fn new_default() -> Result<Self> {
        Self::new(app_data_dir().join(STORE_DIR))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File holding `key`. Keys map one-to-one onto file names, so only
    /// `[a-z0-9_]` is accepted.
    pub fn value_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(format!("{}.{}", key, VALUE_EXTENSION)))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.value_path(key)?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let path = self.value_path(key)?;
        let tmp = tmp_path(&path);
        write_atomic(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        debug!(key, path = %path.display(), "stored value");
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let path = self.value_path(key)?;
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '_'));
    if valid {
        Ok(())
    } else {
        Err(SettlementError::InvalidInput(format!(
            "store key `{}` must be non-empty lowercase ASCII letters, digits or `_`",
            key
        )))
    }
}

pub(crate) fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

pub(crate) fn write_atomic(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}
