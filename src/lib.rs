//! ftpdts-store — dual-tier record store.
//!
//! Short-lived JSON records addressed by opaque identifiers live in a
//! concurrent memory cache with per-record expiry. Durable records are also
//! written to one file per record in a data directory, which is scanned once
//! at startup to repopulate the cache. Reads never touch the disk.

pub mod cli;
pub mod config;
pub mod engine;
pub mod storage;
pub mod types;
pub mod uid;

// Re-export commonly used types at the crate root
pub use config::Config;
pub use engine::{reconcile, OnConflict, ReconcileReport, StoreEngine};
pub use storage::{DataStorage, FsStorage, MemoryStorage, Storage};
pub use types::{Record, StoreError, StoreResult, DEFAULT_CACHE_TTL, TTL_FOREVER};
pub use uid::{UidGenerator, UidValidator};
