//! Startup wiring: identifier component, both tiers, reconciliation.

pub mod bootstrap;

use std::sync::Arc;

use crate::config::Config;
use crate::storage::{DataStorage, FsStorage, MemoryStorage};
use crate::types::StoreResult;
use crate::uid::UidGenerator;

pub use bootstrap::{reconcile, OnConflict, ReconcileReport};

/// A fully bootstrapped store, ready to be shared with front ends.
///
/// Construction runs the reconciliation pass to completion, so every
/// persisted record is cached before the engine can serve a single request.
pub struct StoreEngine {
    uid: Arc<UidGenerator>,
    memory: Arc<MemoryStorage>,
    persistent: Arc<FsStorage>,
    store: DataStorage,
    report: ReconcileReport,
}

impl StoreEngine {
    /// Build and bootstrap from configuration.
    ///
    /// Fails on invalid configuration or when the data directory cannot be
    /// listed. The directory is only created when `[data] create` is set.
    pub fn open(config: &Config) -> StoreResult<Self> {
        Self::open_with(config, OnConflict::default())
    }

    /// Like [`open`](Self::open) with an explicit reconciliation conflict policy.
    pub fn open_with(config: &Config, on_conflict: OnConflict) -> StoreResult<Self> {
        config.validate()?;
        let uid = Arc::new(config.uid_generator()?);
        let memory = Arc::new(MemoryStorage::new(config.default_ttl()));
        let persistent = Arc::new(FsStorage::new(&config.data.path, uid.clone()));
        if config.data.create {
            persistent.create_root()?;
        }

        let report = reconcile(&persistent, &memory, on_conflict)?;

        let store = DataStorage::new(memory.clone(), persistent.clone(), uid.clone());
        Ok(Self {
            uid,
            memory,
            persistent,
            store,
            report,
        })
    }

    /// The composite store front ends read and write through.
    pub fn store(&self) -> &DataStorage {
        &self.store
    }

    /// The identifier generator shared with write-side front ends.
    pub fn uid(&self) -> &UidGenerator {
        &self.uid
    }

    pub fn memory(&self) -> &MemoryStorage {
        &self.memory
    }

    pub fn persistent(&self) -> &FsStorage {
        &self.persistent
    }

    /// Outcome of the startup reconciliation pass.
    pub fn report(&self) -> ReconcileReport {
        self.report
    }
}
