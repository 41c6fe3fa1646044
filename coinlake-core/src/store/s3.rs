//! Amazon S3 (or S3-compatible) object store with SigV4-signed PUTs.
//!
//! A custom endpoint switches to path-style addressing, which is what MinIO,
//! LocalStack and similar services expect.

use super::{validate_bucket, validate_key, ObjectStore};
use crate::error::IngestError;
use ::s3::creds::Credentials;
use ::s3::{Bucket, Region};

pub struct S3ObjectStore {
    region: Region,
    credentials: Credentials,
    path_style: bool,
}

impl S3ObjectStore {
    /// `endpoint` overrides the AWS endpoint for `region`. Without explicit
    /// keys, credentials come from the environment or the shared profile.
    pub fn new(
        region: &str,
        endpoint: Option<&str>,
        access_key_id: Option<&str>,
        secret_access_key: Option<&str>,
    ) -> Result<Self, IngestError> {
        let (region, path_style) = match endpoint {
            Some(endpoint) => (
                Region::Custom {
                    region: region.to_string(),
                    endpoint: endpoint.trim_end_matches('/').to_string(),
                },
                true,
            ),
            None => (
                region
                    .parse::<Region>()
                    .map_err(|e| IngestError::Configuration(format!("invalid S3 region '{region}': {e}")))?,
                false,
            ),
        };

        let credentials = match (access_key_id, secret_access_key) {
            (Some(key), Some(secret)) => Credentials::new(Some(key), Some(secret), None, None, None),
            (None, None) => Credentials::default(),
            _ => {
                return Err(IngestError::Configuration(
                    "S3 access_key_id and secret_access_key must be set together".into(),
                ))
            }
        }
        .map_err(|e| IngestError::Configuration(format!("S3 credentials unavailable: {e}")))?;

        Ok(Self {
            region,
            credentials,
            path_style,
        })
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    fn bucket(&self, name: &str, key: &str) -> Result<Box<Bucket>, IngestError> {
        let bucket = Bucket::new(name, self.region.clone(), self.credentials.clone())
            .map_err(|e| IngestError::storage(key, format!("S3 bucket '{name}': {e}")))?;
        Ok(if self.path_style {
            bucket.with_path_style()
        } else {
            bucket
        })
    }
}

impl ObjectStore for S3ObjectStore {
    fn name(&self) -> &str {
        "s3"
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

        let target = self.bucket(bucket.trim(), key)?;
        let resp = target
            .put_object_with_content_type(format!("/{key}"), &body, content_type)
            .map_err(|e| IngestError::storage(key, format!("S3 PUT failed: {e}")))?;

        let status = resp.status_code();
        if !(200..300).contains(&status) {
            return Err(IngestError::storage(
                key,
                format!("S3 PUT returned HTTP {status}"),
            ));
        }
        Ok(())
    }
}
