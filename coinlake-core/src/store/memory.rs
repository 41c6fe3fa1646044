//! In-memory object store.
//!
//! Clones share the same backing list, so a caller can hand one clone to the
//! pipeline and inspect writes through another.

use super::{validate_bucket, validate_key, ObjectStore};
use crate::error::IngestError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One successful `put`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bucket: String,
    pub key: String,
    pub body: Vec<u8>,
    pub content_type: String,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryObjectStore {
    objects: Arc<Mutex<Vec<StoredObject>>>,
    attempts: Arc<AtomicUsize>,
    fail_with: Option<String>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every `put` fails with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            fail_with: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Snapshot of stored objects in write order.
    pub fn objects(&self) -> Vec<StoredObject> {
        self.objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Number of `put` calls, successful or not.
    pub fn put_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl ObjectStore for MemoryObjectStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), IngestError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        validate_bucket(bucket, key)?;
        validate_key(key)?;

        if let Some(reason) = &self.fail_with {
            return Err(IngestError::storage(key, reason));
        }

        let mut objects = self
            .objects
            .lock()
            .map_err(|_| IngestError::storage(key, "store lock poisoned"))?;
        objects.push(StoredObject {
            bucket: bucket.to_string(),
            key: key.to_string(),
            body,
            content_type: content_type.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_writes() {
        let store = MemoryObjectStore::new();
        let handle = store.clone();

        store.put("b", "raw/k.json", b"1".to_vec(), "application/json").unwrap();

        let objects = handle.objects();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].bucket, "b");
        assert_eq!(objects[0].content_type, "application/json");
        assert_eq!(handle.put_attempts(), 1);
    }

    #[test]
    fn failing_store_counts_attempts() {
        let store = MemoryObjectStore::failing("access denied");
        let err = store.put("b", "raw/k.json", b"1".to_vec(), "application/json").unwrap_err();

        assert!(err.to_string().contains("access denied"));
        assert_eq!(store.put_attempts(), 1);
        assert!(store.objects().is_empty());
    }
}
