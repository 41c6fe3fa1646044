//! Filesystem object store.
//!
//! Layout: `{root}/{bucket}/{key}`, e.g.
//! `data/my-bucket/raw/2024-01-15/btc_price_1705320000.0.json`
//!
//! Writes are atomic: the body goes to `{file}.tmp` and is renamed into place,
//! so a reader never sees a half-written object.

use super::{validate_bucket, validate_key, ObjectStore};
use crate::domain::RAW_PREFIX;
use crate::error::IngestError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Object count for one date partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionSummary {
    pub date: NaiveDate,
    pub object_count: usize,
}

/// Object store rooted at a local directory. Each bucket is a subdirectory.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bucket_dir(&self, bucket: &str) -> PathBuf {
        self.root.join(bucket.trim())
    }

    /// Filesystem path an object would be written to.
    pub fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, IngestError> {
        validate_bucket(bucket, key)?;
        validate_key(key)?;
        let mut path = self.bucket_dir(bucket);
        for segment in key.split('/') {
            path.push(segment);
        }
        Ok(path)
    }

    /// Keys in `bucket` starting with `prefix`, sorted ascending.
    ///
    /// A bucket that has never been written to lists as empty.
    pub fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, IngestError> {
        validate_bucket(bucket, prefix)
            .map_err(|e| IngestError::StorageRead(e.to_string()))?;
        let dir = self.bucket_dir(bucket);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        collect_keys(&dir, "", &mut keys)?;
        keys.retain(|k| k.starts_with(prefix));
        keys.sort();
        Ok(keys)
    }

    /// Date partitions under `raw/` with their object counts, oldest first.
    ///
    /// Directories whose names are not `YYYY-MM-DD` dates are ignored.
    pub fn partitions(&self, bucket: &str) -> Result<Vec<PartitionSummary>, IngestError> {
        validate_bucket(bucket, RAW_PREFIX)
            .map_err(|e| IngestError::StorageRead(e.to_string()))?;
        let raw_dir = self.bucket_dir(bucket).join(RAW_PREFIX);
        if !raw_dir.exists() {
            return Ok(Vec::new());
        }

        let mut summaries = Vec::new();
        for entry in read_dir(&raw_dir)? {
            let entry = entry.map_err(|e| IngestError::StorageRead(format!("dir entry: {e}")))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let Some(date) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| NaiveDate::parse_from_str(n, "%Y-%m-%d").ok())
            else {
                continue;
            };

            let mut object_count = 0;
            for file in read_dir(&path)? {
                let file = file.map_err(|e| IngestError::StorageRead(format!("dir entry: {e}")))?;
                if file.path().extension().and_then(|e| e.to_str()) == Some("json") {
                    object_count += 1;
                }
            }
            summaries.push(PartitionSummary { date, object_count });
        }

        summaries.sort_by_key(|s| s.date);
        Ok(summaries)
    }
}

impl ObjectStore for LocalObjectStore {
    fn name(&self) -> &str {
        "local"
    }

    fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), IngestError> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| IngestError::storage(key, format!("failed to create dir: {e}")))?;
        }

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| IngestError::storage(key, "key has no file name"))?;
        let tmp_path = path.with_file_name(format!("{file_name}.tmp"));

        fs::write(&tmp_path, &body)
            .map_err(|e| IngestError::storage(key, format!("write failed: {e}")))?;

        // Atomic rename
        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            IngestError::storage(key, format!("atomic rename failed: {e}"))
        })?;

        tracing::debug!(path = %path.display(), content_type, "object written");
        Ok(())
    }
}

fn read_dir(dir: &Path) -> Result<fs::ReadDir, IngestError> {
    fs::read_dir(dir)
        .map_err(|e| IngestError::StorageRead(format!("read dir {}: {e}", dir.display())))
}

/// Walk `dir`, pushing `/`-joined keys relative to the bucket. Skips temp files.
fn collect_keys(dir: &Path, rel: &str, out: &mut Vec<String>) -> Result<(), IngestError> {
    for entry in read_dir(dir)? {
        let entry = entry.map_err(|e| IngestError::StorageRead(format!("dir entry: {e}")))?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let key = if rel.is_empty() {
            name.to_string()
        } else {
            format!("{rel}/{name}")
        };

        if path.is_dir() {
            collect_keys(&path, &key, out)?;
        } else if !name.ends_with(".tmp") {
            out.push(key);
        }
    }
    Ok(())
}
