//! The ingestion pipeline: validate → fetch → transform → persist.
//!
//! One `run` is one invocation. Nothing is retried or compensated: a failure
//! after the configuration check is logged and returned to the caller, and
//! whatever was fetched is dropped.

use crate::clock::{Clock, SystemClock};
use crate::config::{self, IngestConfig};
use crate::domain::{self, Asset, PriceRecord, StorageKey};
use crate::error::IngestError;
use crate::source::{CoingeckoProvider, PriceQuoteRaw, QuoteProvider};
use crate::store::{self, ObjectStore, CONTENT_TYPE_JSON};
use serde::Serialize;
use tracing::{debug, error, info};

/// Opaque payload of whatever triggered the invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerEvent(serde_json::Value);

impl TriggerEvent {
    pub fn new(payload: serde_json::Value) -> Self {
        Self(payload)
    }

    pub fn payload(&self) -> &serde_json::Value {
        &self.0
    }
}

impl Default for TriggerEvent {
    fn default() -> Self {
        Self(serde_json::Value::Object(Default::default()))
    }
}

/// How an invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationStatus {
    Success,
    ConfigurationError,
    Failed,
}

/// Structured result handed back to the invoking framework.
///
/// Serializes as `{"statusCode": 200, "body": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResponse {
    #[serde(skip)]
    pub status: InvocationStatus,
    pub status_code: u16,
    pub body: String,
}

impl InvocationResponse {
    pub fn success(key: &StorageKey) -> Self {
        Self {
            status: InvocationStatus::Success,
            status_code: 200,
            body: format!("Ingestion successful: {key}"),
        }
    }

    pub fn configuration_error() -> Self {
        Self {
            status: InvocationStatus::ConfigurationError,
            status_code: 500,
            body: "Configuration Error".to_string(),
        }
    }

    /// Response for an error that escaped `run`.
    pub fn from_error(err: &IngestError) -> Self {
        Self {
            status: InvocationStatus::Failed,
            status_code: 500,
            body: err.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == InvocationStatus::Success
    }
}

/// Fetches one quote, flattens it and writes it to the object store.
pub struct IngestionPipeline {
    provider: Box<dyn QuoteProvider>,
    store: Box<dyn ObjectStore>,
    clock: Box<dyn Clock>,
    bucket: Option<String>,
    asset: Asset,
}

impl IngestionPipeline {
    pub fn new(
        provider: Box<dyn QuoteProvider>,
        store: Box<dyn ObjectStore>,
        bucket: Option<String>,
    ) -> Self {
        Self {
            provider,
            store,
            clock: Box::new(SystemClock),
            bucket,
            asset: Asset::BITCOIN,
        }
    }

    /// Wire the CoinGecko provider and the configured store.
    pub fn from_config(config: &IngestConfig) -> Result<Self, IngestError> {
        config.validate()?;
        let provider = CoingeckoProvider::new(config.source.url.clone(), config.source.timeout())?;
        let store = store::from_config(&config.store)?;
        Ok(Self::new(Box::new(provider), store, config.bucket.clone()))
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn asset(&self) -> Asset {
        self.asset
    }

    /// The configured bucket, if set and non-blank.
    pub fn destination(&self) -> Option<&str> {
        config::destination(self.bucket.as_deref())
    }

    pub fn fetch_price(&self) -> Result<PriceQuoteRaw, IngestError> {
        match self.provider.fetch(&self.asset) {
            Ok(raw) => {
                info!(provider = self.provider.name(), ?raw, "Data fetched");
                Ok(raw)
            }
            Err(e) => {
                error!(provider = self.provider.name(), error = %e, "Error fetching data");
                Err(e)
            }
        }
    }

    pub fn transform(&self, raw: &PriceQuoteRaw) -> Result<PriceRecord, IngestError> {
        domain::transform(raw, self.asset, self.clock.now()).map_err(|e| {
            error!(error = %e, "Unexpected response shape");
            e
        })
    }

    /// Write `record` to `bucket` under a key derived from the current time.
    pub fn persist(&self, record: &PriceRecord, bucket: &str) -> Result<StorageKey, IngestError> {
        let key = StorageKey::for_instant(self.asset, self.clock.now());
        let written = record
            .to_json_bytes()
            .map_err(|e| IngestError::storage(key.as_str(), format!("serialization: {e}")))
            .and_then(|body| {
                self.store
                    .put(bucket, key.as_str(), body, CONTENT_TYPE_JSON)
            });

        if let Err(e) = written {
            error!(store = self.store.name(), bucket, error = %e, "Failed to upload record");
            return Err(e);
        }

        info!(
            "Successfully uploaded to {}://{bucket}/{key}",
            self.store.name()
        );
        Ok(key)
    }

    /// Run one invocation.
    ///
    /// A missing bucket is reported as a 500 "Configuration Error" response
    /// without touching the network. Every later failure is returned as `Err`.
    pub fn run(&self, event: &TriggerEvent) -> Result<InvocationResponse, IngestError> {
        info!("Starting data ingestion pipeline...");
        debug!(event = %event.payload(), "trigger event");

        let Some(bucket) = self.destination() else {
            error!("{} environment variable not set.", config::ENV_BUCKET);
            return Ok(InvocationResponse::configuration_error());
        };

        let raw = self.fetch_price()?;
        let record = self.transform(&raw)?;
        let key = self.persist(&record, bucket)?;

        Ok(InvocationResponse::success(&key))
    }
}
