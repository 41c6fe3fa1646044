//! Invocation configuration.
//!
//! Sources, lowest precedence first: built-in defaults, an optional TOML file,
//! then environment variables. The CLI applies its own flags last.
//!
//! ```toml
//! bucket = "my-bucket"
//!
//! [source]
//! url = "https://api.coingecko.com/api/v3/simple/price"
//! timeout_secs = 10
//!
//! [store]
//! type = "LOCAL"
//! root = "data"
//! ```
//!
//! An S3 destination signs its requests; credentials come from the file or,
//! when left out, from the usual AWS environment variables and profile:
//!
//! ```toml
//! [store]
//! type = "S3"
//! region = "eu-west-1"
//! ```

use crate::error::IngestError;
use crate::source::{DEFAULT_PRICE_URL, DEFAULT_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_BUCKET: &str = "BUCKET_NAME";
pub const ENV_PRICE_URL: &str = "COINLAKE_PRICE_URL";
pub const ENV_TIMEOUT_SECS: &str = "COINLAKE_TIMEOUT_SECS";
pub const ENV_STORE_ROOT: &str = "COINLAKE_STORE_ROOT";
pub const ENV_STORE_ENDPOINT: &str = "COINLAKE_STORE_ENDPOINT";
pub const ENV_S3_REGION: &str = "COINLAKE_S3_REGION";
pub const ENV_S3_ENDPOINT: &str = "COINLAKE_S3_ENDPOINT";

const DEFAULT_STORE_ROOT: &str = "data";
const DEFAULT_STORE_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Destination bucket. Required at run time, but may be left out of the
    /// file and supplied through `BUCKET_NAME`.
    #[serde(default)]
    pub bucket: Option<String>,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub store: StoreConfig,
}

/// Upstream price API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_PRICE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

impl SourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Object store backend selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StoreConfig {
    /// Directory tree on the local filesystem, one subdirectory per bucket.
    Local { root: PathBuf },

    /// S3-style HTTP endpoint accepting path-addressed PUTs.
    Http {
        endpoint: String,
        #[serde(default = "default_store_timeout_secs")]
        timeout_secs: u64,
    },

    /// Amazon S3, or an S3-compatible service when `endpoint` is set.
    S3 {
        region: String,
        #[serde(default)]
        endpoint: Option<String>,
        #[serde(default)]
        access_key_id: Option<String>,
        #[serde(default)]
        secret_access_key: Option<String>,
    },
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Local {
            root: PathBuf::from(DEFAULT_STORE_ROOT),
        }
    }
}

fn default_store_timeout_secs() -> u64 {
    DEFAULT_STORE_TIMEOUT_SECS
}

impl StoreConfig {
    /// HTTP backend with the default request timeout.
    pub fn http(endpoint: impl Into<String>) -> Self {
        StoreConfig::Http {
            endpoint: endpoint.into(),
            timeout_secs: DEFAULT_STORE_TIMEOUT_SECS,
        }
    }

    /// S3 backend using ambient AWS credentials.
    pub fn s3(region: impl Into<String>, endpoint: Option<String>) -> Self {
        StoreConfig::S3 {
            region: region.into(),
            endpoint,
            access_key_id: None,
            secret_access_key: None,
        }
    }
}

impl IngestConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, IngestError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| IngestError::Configuration(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, IngestError> {
        let content = fs::read_to_string(path).map_err(|e| {
            IngestError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) -> Result<(), IngestError> {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    /// Overlay values from `lookup`.
    ///
    /// When several store variables are set the later backend wins:
    /// S3 over HTTP endpoint over local root.
    pub fn apply_vars<F>(&mut self, lookup: F) -> Result<(), IngestError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bucket) = lookup(ENV_BUCKET) {
            self.bucket = Some(bucket);
        }
        if let Some(url) = lookup(ENV_PRICE_URL) {
            self.source.url = url;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            self.source.timeout_secs = raw.trim().parse().map_err(|_| {
                IngestError::Configuration(format!(
                    "{ENV_TIMEOUT_SECS} must be a whole number of seconds, got '{raw}'"
                ))
            })?;
        }
        if let Some(root) = lookup(ENV_STORE_ROOT) {
            self.store = StoreConfig::Local {
                root: PathBuf::from(root),
            };
        }
        if let Some(endpoint) = lookup(ENV_STORE_ENDPOINT) {
            self.store = StoreConfig::http(endpoint);
        }
        if let Some(region) = lookup(ENV_S3_REGION) {
            self.store = StoreConfig::s3(region, lookup(ENV_S3_ENDPOINT));
        }
        self.validate()
    }

    /// Reject settings that would make every invocation fail in a misleading way.
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.source.timeout_secs == 0 {
            return Err(IngestError::Configuration(
                "source timeout_secs must be at least 1".into(),
            ));
        }
        match &self.store {
            StoreConfig::Http { timeout_secs: 0, .. } => Err(IngestError::Configuration(
                "store timeout_secs must be at least 1".into(),
            )),
            StoreConfig::S3 { region, .. } if region.trim().is_empty() => Err(
                IngestError::Configuration("S3 store needs a region".into()),
            ),
            _ => Ok(()),
        }
    }

    /// The bucket to write to, if one is set and non-blank.
    pub fn destination(&self) -> Option<&str> {
        destination(self.bucket.as_deref())
    }
}

pub(crate) fn destination(bucket: Option<&str>) -> Option<&str> {
    bucket.map(str::trim).filter(|b| !b.is_empty())
}
