//! Upstream price sources.
//!
//! The QuoteProvider trait abstracts over the price API so the pipeline can be
//! driven by a stub in tests. Providers only fetch and parse; they don't know
//! about records or storage.

pub mod coingecko;

pub use coingecko::{CoingeckoProvider, DEFAULT_PRICE_URL, DEFAULT_TIMEOUT};

use crate::domain::Asset;
use crate::error::IngestError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Quote fields for one asset, as the API sends them.
///
/// Both fields are optional at parse time; `transform` decides what is missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAssetQuote {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated_at: Option<i64>,
}

/// Raw API response: asset id → quote fields.
///
/// `{"bitcoin": {"usd": 65000.5, "last_updated_at": 1700000000}}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceQuoteRaw(HashMap<String, RawAssetQuote>);

impl PriceQuoteRaw {
    /// Parse a response body.
    pub fn from_slice(body: &[u8]) -> Result<Self, IngestError> {
        serde_json::from_slice(body)
            .map_err(|e| IngestError::MalformedResponse(format!("invalid quote JSON: {e}")))
    }

    /// A response carrying exactly one complete quote.
    pub fn single(asset_id: &str, usd: f64, last_updated_at: i64) -> Self {
        let mut map = HashMap::new();
        map.insert(
            asset_id.to_string(),
            RawAssetQuote {
                usd: Some(usd),
                last_updated_at: Some(last_updated_at),
            },
        );
        Self(map)
    }

    pub fn get(&self, asset_id: &str) -> Option<&RawAssetQuote> {
        self.0.get(asset_id)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Trait for upstream price APIs.
pub trait QuoteProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch the current USD quote for `asset`.
    fn fetch(&self, asset: &Asset) -> Result<PriceQuoteRaw, IngestError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_coingecko_shape() {
        let raw = PriceQuoteRaw::from_slice(
            br#"{"bitcoin": {"usd": 65000.5, "last_updated_at": 1700000000}}"#,
        )
        .unwrap();
        let quote = raw.get("bitcoin").unwrap();
        assert_eq!(quote.usd, Some(65000.5));
        assert_eq!(quote.last_updated_at, Some(1_700_000_000));
    }

    #[test]
    fn integer_price_and_extra_fields_accepted() {
        let raw = PriceQuoteRaw::from_slice(
            br#"{"bitcoin": {"usd": 65000, "usd_24h_vol": 1.5, "last_updated_at": 1}}"#,
        )
        .unwrap();
        assert_eq!(raw.get("bitcoin").unwrap().usd, Some(65000.0));
    }

    #[test]
    fn empty_object_parses_as_empty() {
        let raw = PriceQuoteRaw::from_slice(b"{}").unwrap();
        assert!(raw.is_empty());
    }

    #[test]
    fn non_json_body_is_malformed() {
        let err = PriceQuoteRaw::from_slice(b"<html>rate limited</html>").unwrap_err();
        assert!(matches!(err, IngestError::MalformedResponse(_)));
    }

    #[test]
    fn wrong_shape_is_malformed() {
        let err = PriceQuoteRaw::from_slice(br#"{"bitcoin": 65000.5}"#).unwrap_err();
        assert!(matches!(err, IngestError::MalformedResponse(_)));
    }
}
