//! S3-style object store over plain HTTP PUT.
//!
//! Path-style addressing: `PUT {endpoint}/{bucket}/{key}`. Suitable for
//! gateways and emulators that accept unsigned writes.

use super::{validate_bucket, validate_key, ObjectStore};
use crate::error::IngestError;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

pub struct HttpObjectStore {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl HttpObjectStore {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, IngestError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IngestError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn object_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, bucket.trim(), key)
    }
}

impl ObjectStore for HttpObjectStore {
    fn name(&self) -> &str {
        "http"
    }

    fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), IngestError> {
        validate_bucket(bucket, key)?;
        validate_key(key)?;

        let url = self.object_url(bucket, key);
        let resp = self
            .client
            .put(&url)
            .header(CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .map_err(|e| IngestError::storage(key, format!("PUT {url} failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(IngestError::storage(key, format!("PUT {url} returned HTTP {status}")));
        }
        Ok(())
    }
}
