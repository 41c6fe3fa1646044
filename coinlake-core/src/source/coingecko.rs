//! CoinGecko simple-price provider.
//!
//! One blocking GET per invocation against `/simple/price`. No retries:
//! connection failures, timeouts and non-success statuses all surface as
//! [`IngestError::Network`].

use super::{PriceQuoteRaw, QuoteProvider};
use crate::domain::Asset;
use crate::error::IngestError;
use reqwest::header::ACCEPT;
use std::time::Duration;

pub const DEFAULT_PRICE_URL: &str = "https://api.coingecko.com/api/v3/simple/price";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// CoinGecko-backed quote provider.
pub struct CoingeckoProvider {
    client: reqwest::blocking::Client,
    url: String,
    timeout: Duration,
}

impl CoingeckoProvider {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, IngestError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("coinlake/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| IngestError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
            timeout,
        })
    }

    /// Provider against the public endpoint with the default timeout.
    pub fn public() -> Result<Self, IngestError> {
        Self::new(DEFAULT_PRICE_URL, DEFAULT_TIMEOUT)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn request_error(&self, e: reqwest::Error) -> IngestError {
        if e.is_timeout() {
            IngestError::Network(format!(
                "request to {} timed out after {}s",
                self.url,
                self.timeout.as_secs_f64()
            ))
        } else {
            IngestError::Network(format!("request to {} failed: {e}", self.url))
        }
    }
}

impl QuoteProvider for CoingeckoProvider {
    fn name(&self) -> &str {
        "coingecko"
    }

    fn fetch(&self, asset: &Asset) -> Result<PriceQuoteRaw, IngestError> {
        let resp = self
            .client
            .get(&self.url)
            .query(&[
                ("ids", asset.id),
                ("vs_currencies", "usd"),
                ("include_last_updated_at", "true"),
            ])
            .header(ACCEPT, "application/json")
            .send()
            .map_err(|e| self.request_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(IngestError::Network(format!(
                "HTTP {status} from {} for '{}'",
                self.url, asset.id
            )));
        }

        let body = resp.bytes().map_err(|e| self.request_error(e))?;
        PriceQuoteRaw::from_slice(&body)
    }
}
