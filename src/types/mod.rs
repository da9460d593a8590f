//! Shared data types for the record store.

pub mod error;
pub mod record;

use std::time::Duration;

pub use error::{StoreError, StoreResult};
pub use record::Record;

/// The ttl sentinel meaning "durable: never expires, write to the persistent tier".
pub const TTL_FOREVER: Duration = Duration::ZERO;

/// Default lifetime of cached records written without an explicit ttl: one day.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(86_400);

/// Whether a requested ttl asks for durable storage.
///
/// Only an explicit `Some(TTL_FOREVER)` is durable; `None` means "tier default".
pub fn is_durable(ttl: Option<Duration>) -> bool {
    ttl == Some(TTL_FOREVER)
}
