//! The record returned by every storage tier.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::TTL_FOREVER;

/// A stored record as seen by readers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// Opaque JSON payload.
    pub payload: Value,
    /// Insertion time for cached records; file mtime for persisted ones.
    pub created_at: DateTime<Utc>,
    /// Remaining lifetime. `TTL_FOREVER` for durable records.
    #[serde(rename = "ttl_secs", serialize_with = "serialize_ttl")]
    pub ttl: Duration,
}

impl Record {
    /// Whether this record never expires.
    pub fn is_durable(&self) -> bool {
        self.ttl == TTL_FOREVER
    }
}

fn serialize_ttl<S: serde::Serializer>(ttl: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(ttl.as_secs())
}
