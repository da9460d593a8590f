//! The read/write surface handed to front ends.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::types::{is_durable, Record, StoreError, StoreResult};
use crate::uid::{validate_exact, UidValidator};

use super::Storage;

/// Composes a memory tier and a persistent tier.
///
/// Durable puts (`ttl == Some(TTL_FOREVER)`) are written to the persistent
/// tier first and then cached; every other put is cache-only. Reads are served
/// from the memory tier alone, so records that only exist on disk stay
/// invisible until a reconciliation pass has loaded them.
#[derive(Clone)]
pub struct DataStorage {
    memory: Arc<dyn Storage>,
    persistent: Arc<dyn Storage>,
    validator: Arc<dyn UidValidator>,
}

impl DataStorage {
    pub fn new(
        memory: Arc<dyn Storage>,
        persistent: Arc<dyn Storage>,
        validator: Arc<dyn UidValidator>,
    ) -> Self {
        Self {
            memory,
            persistent,
            validator,
        }
    }

    /// Read a record from the memory tier.
    pub fn get(&self, uid: &str) -> StoreResult<Record> {
        validate_exact(self.validator.as_ref(), uid)?;
        self.memory.get(uid)
    }

    /// Write a record to the tier(s) selected by `ttl`.
    ///
    /// A persistent-tier failure is returned unchanged and leaves the cache
    /// untouched. A cache failure after a successful persist is reported as
    /// [`StoreError::NotCached`].
    pub fn put(&self, uid: &str, payload: &Value, ttl: Option<Duration>) -> StoreResult<()> {
        validate_exact(self.validator.as_ref(), uid)?;

        if is_durable(ttl) {
            if let Err(e) = self.persistent.put(uid, payload, ttl) {
                log::warn!("Can't store record {} in the persistent tier: {}", uid, e);
                return Err(e);
            }
        }

        self.memory.put(uid, payload, ttl).map_err(|e| {
            if is_durable(ttl) {
                StoreError::NotCached {
                    uid: uid.to_string(),
                    source: Box::new(e),
                }
            } else {
                e
            }
        })
    }

    /// Serialize `value` and [`put`](Self::put) it.
    pub fn put_as<T: Serialize>(
        &self,
        uid: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> StoreResult<()> {
        let payload =
            serde_json::to_value(value).map_err(|e| StoreError::serialization(uid, e))?;
        self.put(uid, &payload, ttl)
    }

    /// [`get`](Self::get) a record and deserialize its payload.
    pub fn get_as<T: DeserializeOwned>(&self, uid: &str) -> StoreResult<T> {
        let record = self.get(uid)?;
        serde_json::from_value(record.payload).map_err(|e| StoreError::serialization(uid, e))
    }
}

impl Storage for DataStorage {
    fn get(&self, uid: &str) -> StoreResult<Record> {
        DataStorage::get(self, uid)
    }

    fn put(&self, uid: &str, payload: &Value, ttl: Option<Duration>) -> StoreResult<()> {
        DataStorage::put(self, uid, payload, ttl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::types::TTL_FOREVER;
    use crate::uid::UidGenerator;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// A tier that counts calls and optionally refuses writes.
    struct StubTier {
        puts: AtomicUsize,
        fail: bool,
    }

    impl StubTier {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                puts: AtomicUsize::new(0),
                fail,
            })
        }
    }

    impl Storage for StubTier {
        fn get(&self, uid: &str) -> StoreResult<Record> {
            Err(StoreError::NotFound(uid.to_string()))
        }

        fn put(&self, uid: &str, _payload: &Value, _ttl: Option<Duration>) -> StoreResult<()> {
            self.puts.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(StoreError::io("write", uid, std::io::Error::other("disk full")))
            } else {
                Ok(())
            }
        }
    }

    fn store(
        memory: Arc<dyn Storage>,
        persistent: Arc<dyn Storage>,
    ) -> (DataStorage, UidGenerator) {
        let uids = UidGenerator::default();
        let ds = DataStorage::new(memory, persistent, Arc::new(uids.clone()));
        (ds, uids)
    }

    #[test]
    fn test_ephemeral_put_skips_persistent_tier() {
        let memory = Arc::new(MemoryStorage::new(Duration::from_secs(60)));
        let persistent = StubTier::new(false);
        let (ds, uids) = store(memory.clone(), persistent.clone());

        let uid = uids.new_uid();
        ds.put(&uid, &json!(1), None).unwrap();
        ds.put(&uid, &json!(2), Some(Duration::from_secs(5))).unwrap();

        assert_eq!(persistent.puts.load(Ordering::SeqCst), 0);
        assert_eq!(ds.get(&uid).unwrap().payload, json!(2));
    }

    #[test]
    fn test_durable_put_writes_both_tiers() {
        let memory = Arc::new(MemoryStorage::new(Duration::from_secs(60)));
        let persistent = StubTier::new(false);
        let (ds, uids) = store(memory.clone(), persistent.clone());

        let uid = uids.new_uid();
        ds.put(&uid, &json!({"a": 1}), Some(TTL_FOREVER)).unwrap();

        assert_eq!(persistent.puts.load(Ordering::SeqCst), 1);
        assert!(memory.contains(&uid));
    }

    #[test]
    fn test_persist_failure_leaves_cache_untouched() {
        let memory = Arc::new(MemoryStorage::new(Duration::from_secs(60)));
        let (ds, uids) = store(memory.clone(), StubTier::new(true));

        let uid = uids.new_uid();
        let err = ds.put(&uid, &json!(1), Some(TTL_FOREVER)).unwrap_err();

        assert!(matches!(err, StoreError::Io { .. }));
        assert!(!memory.contains(&uid));
    }

    #[test]
    fn test_cache_failure_after_persist_is_not_cached() {
        let persistent = StubTier::new(false);
        let (ds, uids) = store(StubTier::new(true), persistent.clone());

        let uid = uids.new_uid();
        let err = ds.put(&uid, &json!(1), Some(TTL_FOREVER)).unwrap_err();

        assert!(matches!(err, StoreError::NotCached { .. }));
        assert_eq!(persistent.puts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_invalid_id_touches_no_tier() {
        let memory = StubTier::new(false);
        let persistent = StubTier::new(false);
        let (ds, _) = store(memory.clone(), persistent.clone());

        for ttl in [None, Some(TTL_FOREVER), Some(Duration::from_secs(1))] {
            assert!(matches!(
                ds.put("../escape", &json!(1), ttl),
                Err(StoreError::InvalidId(_))
            ));
        }
        assert!(matches!(ds.get("../escape"), Err(StoreError::InvalidId(_))));
        assert_eq!(memory.puts.load(Ordering::SeqCst), 0);
        assert_eq!(persistent.puts.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_typed_accessors() {
        #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
        struct Link {
            title: String,
            url: String,
        }

        let memory = Arc::new(MemoryStorage::new(Duration::from_secs(60)));
        let (ds, uids) = store(memory, StubTier::new(false));
        let uid = uids.new_uid();
        let link = Link {
            title: "Title".into(),
            url: "https://example.org".into(),
        };

        ds.put_as(&uid, &link, None).unwrap();
        assert_eq!(ds.get_as::<Link>(&uid).unwrap(), link);
        assert!(matches!(
            ds.get_as::<Vec<u32>>(&uid),
            Err(StoreError::Serialization { .. })
        ));
    }
}
