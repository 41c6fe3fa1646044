//! Object stores the pipeline writes records into.
//!
//! Every backend takes the same `put(bucket, key, body, content_type)` call.
//! Keys are `/`-separated; backends map them onto their own namespace.

pub mod http;
pub mod local;
pub mod memory;
pub mod s3;

pub use http::HttpObjectStore;
pub use local::{LocalObjectStore, PartitionSummary};
pub use memory::{MemoryObjectStore, StoredObject};
pub use self::s3::S3ObjectStore;

use crate::config::StoreConfig;
use crate::error::IngestError;

/// Content type of every record body.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Trait for object store backends.
pub trait ObjectStore: Send + Sync {
    /// Human-readable name of this backend.
    fn name(&self) -> &str;

    /// Write `body` under `bucket`/`key` in a single request.
    fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), IngestError>;
}

/// Build the backend described by `config`.
pub fn from_config(config: &StoreConfig) -> Result<Box<dyn ObjectStore>, IngestError> {
    match config {
        StoreConfig::Local { root } => Ok(Box::new(LocalObjectStore::new(root))),
        StoreConfig::Http {
            endpoint,
            timeout_secs,
        } => Ok(Box::new(HttpObjectStore::new(
            endpoint.clone(),
            std::time::Duration::from_secs(*timeout_secs),
        )?)),
        StoreConfig::S3 {
            region,
            endpoint,
            access_key_id,
            secret_access_key,
        } => Ok(Box::new(S3ObjectStore::new(
            region,
            endpoint.as_deref(),
            access_key_id.as_deref(),
            secret_access_key.as_deref(),
        )?)),
    }
}

/// Reject empty segments and `.`/`..` so keys can't escape their bucket.
pub(crate) fn validate_key(key: &str) -> Result<(), IngestError> {
    if key.is_empty() || key.starts_with('/') {
        return Err(IngestError::storage(key, "key must be a non-empty relative path"));
    }
    for segment in key.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(IngestError::storage(
                key,
                format!("invalid key segment '{segment}'"),
            ));
        }
    }
    Ok(())
}

pub(crate) fn validate_bucket(bucket: &str, key: &str) -> Result<(), IngestError> {
    let bucket = bucket.trim();
    if bucket.is_empty()
        || bucket == "."
        || bucket == ".."
        || bucket.contains('/')
        || bucket.contains('\\')
    {
        return Err(IngestError::storage(
            key,
            format!("invalid bucket name '{bucket}'"),
        ));
    }
    Ok(())
}
