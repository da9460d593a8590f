//! Startup reconciliation: seed the memory tier from the persistent tier.

use crate::storage::{FsStorage, MemoryStorage};
use crate::types::{StoreResult, TTL_FOREVER};

/// What to do when a persisted record's id is already live in the cache.
///
/// Reconciliation normally runs before any front end can write, so a
/// conflict means the caller broke that ordering. The choice is explicit
/// rather than implied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnConflict {
    /// Replace the cached entry with the persisted record.
    #[default]
    Overwrite,
    /// Leave the cached entry in place.
    KeepCached,
}

/// Result of a reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Persisted records loaded into the memory tier.
    pub loaded: usize,
    /// Persisted records skipped because a live cache entry won (`KeepCached` only).
    pub kept: usize,
}

/// Load every recoverable persisted record into `memory` as durable.
///
/// Unreadable entries are skipped by [`FsStorage::pass`]. Fails only when the
/// persistent directory cannot be listed; startup must treat that as fatal.
/// Loaded records keep the file's modification time as `created_at`.
pub fn reconcile(
    persistent: &FsStorage,
    memory: &MemoryStorage,
    on_conflict: OnConflict,
) -> StoreResult<ReconcileReport> {
    let mut report = ReconcileReport::default();

    persistent.pass(|uid, created_at, payload| {
        if on_conflict == OnConflict::KeepCached && memory.contains(uid) {
            log::debug!("Keeping cached record {} over its persisted copy", uid);
            report.kept += 1;
            return;
        }
        memory.insert_with_created_at(uid, payload, created_at, Some(TTL_FOREVER));
        report.loaded += 1;
    })?;

    log::info!(
        "{} persistent records loaded into the memory cache from {}",
        report.loaded,
        persistent.root().display()
    );
    Ok(report)
}
