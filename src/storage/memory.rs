//! In-memory tier: concurrent cache with per-record expiry.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::Value;

use crate::types::{Record, StoreError, StoreResult, DEFAULT_CACHE_TTL, TTL_FOREVER};

use super::Storage;

/// A cached record plus the monotonic instant its ttl counts from.
#[derive(Debug, Clone)]
struct Entry {
    payload: Value,
    created_at: DateTime<Utc>,
    ttl: Duration,
    inserted: Instant,
}

impl Entry {
    /// Remaining lifetime at `now`, or `None` once expired.
    fn remaining(&self, now: Instant) -> Option<Duration> {
        if self.ttl == TTL_FOREVER {
            return Some(TTL_FOREVER);
        }
        let elapsed = now.saturating_duration_since(self.inserted);
        match self.ttl.checked_sub(elapsed) {
            Some(left) if !left.is_zero() => Some(left),
            _ => None,
        }
    }
}

/// Concurrent key → record cache.
///
/// Expiry is lazy: an entry past its ttl is invisible to [`Storage::get`]
/// and is physically removed on the next read of that id or by
/// [`MemoryStorage::purge_expired`]. The map is sharded, so writers to
/// distinct ids rarely contend.
#[derive(Debug)]
pub struct MemoryStorage {
    entries: DashMap<String, Entry>,
    default_ttl: Duration,
}

impl MemoryStorage {
    /// Create an empty cache. `default_ttl` applies to puts without a ttl.
    ///
    /// A zero default would collide with the durable sentinel, so it is
    /// replaced by [`DEFAULT_CACHE_TTL`].
    pub fn new(default_ttl: Duration) -> Self {
        let default_ttl = if default_ttl.is_zero() {
            log::warn!(
                "Zero default ttl for the memory tier, using {}s instead",
                DEFAULT_CACHE_TTL.as_secs()
            );
            DEFAULT_CACHE_TTL
        } else {
            default_ttl
        };
        Self {
            entries: DashMap::new(),
            default_ttl,
        }
    }

    /// The ttl applied when a put does not specify one.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Insert with an explicit `created_at`; the ttl still counts from now.
    pub(crate) fn insert_with_created_at(
        &self,
        uid: &str,
        payload: Value,
        created_at: DateTime<Utc>,
        ttl: Option<Duration>,
    ) {
        let entry = Entry {
            payload,
            created_at,
            ttl: ttl.unwrap_or(self.default_ttl),
            inserted: Instant::now(),
        };
        self.entries.insert(uid.to_string(), entry);
    }

    /// Whether a live (unexpired) record exists under `uid`.
    pub fn contains(&self, uid: &str) -> bool {
        self.entries
            .get(uid)
            .is_some_and(|e| e.remaining(Instant::now()).is_some())
    }

    /// Identifiers of all live entries, sorted.
    pub fn uids(&self) -> Vec<String> {
        let now = Instant::now();
        let mut uids: Vec<String> = self
            .entries
            .iter()
            .filter(|e| e.value().remaining(now).is_some())
            .map(|e| e.key().clone())
            .collect();
        uids.sort_unstable();
        uids
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, e| e.remaining(now).is_some());
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            log::debug!("Purged {} expired records from the memory tier", removed);
        }
        removed
    }

    /// Number of entries held, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, uid: &str) -> StoreResult<Record> {
        let now = Instant::now();
        {
            let entry = self
                .entries
                .get(uid)
                .ok_or_else(|| StoreError::NotFound(uid.to_string()))?;
            if let Some(ttl) = entry.remaining(now) {
                return Ok(Record {
                    payload: entry.payload.clone(),
                    created_at: entry.created_at,
                    ttl,
                });
            }
        }
        // Re-check under the write lock: a concurrent put may have refreshed it.
        self.entries.remove_if(uid, |_, e| e.remaining(now).is_none());
        Err(StoreError::NotFound(uid.to_string()))
    }

    fn put(&self, uid: &str, payload: &Value, ttl: Option<Duration>) -> StoreResult<()> {
        self.insert_with_created_at(uid, payload.clone(), Utc::now(), ttl);
        Ok(())
    }
}
