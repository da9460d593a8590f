//! Persistent tier: one JSON file per record, named by its identifier.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::types::{Record, StoreError, StoreResult, TTL_FOREVER};
use crate::uid::{validate_exact, UidValidator};

use super::Storage;

/// Distinguishes temp files of concurrent writers within this process.
static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Directory-backed durable storage.
///
/// Writes go to a hidden temp file in the same directory and are renamed over
/// the target, so readers only ever see complete files and concurrent writers
/// to one id resolve to whichever rename lands last. Names starting with `.`
/// are never addressable, whatever the validator accepts, so
/// [`FsStorage::pass`] skips stray temp files.
pub struct FsStorage {
    root: PathBuf,
    validator: Arc<dyn UidValidator>,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>, validator: Arc<dyn UidValidator>) -> Self {
        Self {
            root: root.into(),
            validator,
        }
    }

    /// The directory holding the record files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root directory (and parents) if it does not exist yet.
    pub fn create_root(&self) -> StoreResult<()> {
        std::fs::create_dir_all(&self.root)
            .map_err(|e| StoreError::io("create directory", &self.root, e))
    }

    /// Visit every readable record in the directory.
    ///
    /// Entries with invalid names, unreadable content or malformed JSON are
    /// skipped. Only a failure to list the directory itself is an error.
    pub fn pass<F>(&self, mut callback: F) -> StoreResult<()>
    where
        F: FnMut(&str, DateTime<Utc>, Value),
    {
        let entries =
            std::fs::read_dir(&self.root).map_err(|e| StoreError::io("list", &self.root, e))?;

        for entry in entries {
            let Ok(entry) = entry else { continue };
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            match self.get(&name) {
                Ok(record) => callback(&name, record.created_at, record.payload),
                Err(e) => log::debug!("Skipping persisted entry {:?}: {}", name, e),
            }
        }
        Ok(())
    }

    /// Resolve the file path for an id, refusing anything that is not a plain,
    /// visible filename.
    fn record_path(&self, uid: &str) -> StoreResult<PathBuf> {
        validate_exact(self.validator.as_ref(), uid)?;
        if uid.is_empty() || uid.starts_with('.') || uid.contains(['/', '\\']) {
            return Err(StoreError::InvalidId(uid.to_string()));
        }
        Ok(self.root.join(uid))
    }

    fn temp_path(&self, uid: &str) -> PathBuf {
        let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
        self.root.join(format!(".{}.{}.{}.tmp", uid, std::process::id(), seq))
    }
}

/// Write `data` to `temp`, sync it, rename it over `target`, then sync the
/// directory so the rename itself survives a crash.
fn write_atomic(temp: &Path, target: &Path, data: &[u8]) -> StoreResult<()> {
    let write = || -> std::io::Result<()> {
        let mut file = File::create(temp)?;
        file.write_all(data)?;
        file.sync_all()
    };
    if let Err(e) = write() {
        let _ = std::fs::remove_file(temp);
        return Err(StoreError::io("write", temp, e));
    }
    if let Err(e) = std::fs::rename(temp, target) {
        let _ = std::fs::remove_file(temp);
        return Err(StoreError::io("rename", target, e));
    }
    sync_parent(target)
}

/// Directories cannot be opened for syncing on every platform; unix only.
#[cfg(unix)]
fn sync_parent(target: &Path) -> StoreResult<()> {
    let Some(dir) = target.parent() else {
        return Ok(());
    };
    File::open(dir)
        .and_then(|d| d.sync_all())
        .map_err(|e| StoreError::io("sync directory", dir, e))
}

#[cfg(not(unix))]
fn sync_parent(_target: &Path) -> StoreResult<()> {
    Ok(())
}

impl Storage for FsStorage {
    fn get(&self, uid: &str) -> StoreResult<Record> {
        let path = self.record_path(uid)?;

        let meta = std::fs::metadata(&path).map_err(|_| StoreError::NotFound(uid.to_string()))?;
        let modified = meta.modified().map_err(|e| StoreError::io("stat", &path, e))?;

        let data = std::fs::read(&path).map_err(|e| StoreError::io("read", &path, e))?;
        let payload: Value =
            serde_json::from_slice(&data).map_err(|e| StoreError::serialization(uid, e))?;

        Ok(Record {
            payload,
            created_at: DateTime::<Utc>::from(modified),
            ttl: TTL_FOREVER,
        })
    }

    /// Persist unconditionally; `ttl` is ignored.
    fn put(&self, uid: &str, payload: &Value, _ttl: Option<Duration>) -> StoreResult<()> {
        let path = self.record_path(uid)?;
        let data = serde_json::to_vec(payload).map_err(|e| StoreError::serialization(uid, e))?;
        write_atomic(&self.temp_path(uid), &path, &data)
    }
}
