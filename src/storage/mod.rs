//! Storage tiers and the composite store built from them.

pub mod composite;
pub mod fs;
pub mod memory;

use std::time::Duration;

use serde_json::Value;

use crate::types::{Record, StoreResult};

pub use composite::DataStorage;
pub use fs::FsStorage;
pub use memory::MemoryStorage;

/// The single storage capability shared by every tier.
///
/// `ttl` semantics: `None` uses the tier's default, `Some(TTL_FOREVER)` is
/// durable, anything else is a finite lifetime. Tiers that cannot expire
/// records accept and ignore it.
pub trait Storage: Send + Sync {
    /// Fetch a live record.
    fn get(&self, uid: &str) -> StoreResult<Record>;

    /// Store a record, replacing any previous one under the same id.
    fn put(&self, uid: &str, payload: &Value, ttl: Option<Duration>) -> StoreResult<()>;
}
