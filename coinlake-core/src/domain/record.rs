//! The flat record persisted once per invocation, and the transform that builds it.

use super::asset::Asset;
use crate::error::IngestError;
use crate::source::PriceQuoteRaw;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One ingested price point.
///
/// Fields are private: a record is immutable once built by [`transform`].
/// Serializes to compact JSON in declaration order:
/// `{"asset":..,"price_usd":..,"source_timestamp":..,"ingested_at":..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    asset: String,
    price_usd: f64,
    source_timestamp: i64,
    ingested_at: String,
}

impl PriceRecord {
    pub fn asset(&self) -> &str {
        &self.asset
    }

    pub fn price_usd(&self) -> f64 {
        self.price_usd
    }

    /// Unix seconds as reported by the upstream API.
    pub fn source_timestamp(&self) -> i64 {
        self.source_timestamp
    }

    /// ISO-8601 UTC time at which the record was built.
    pub fn ingested_at(&self) -> &str {
        &self.ingested_at
    }

    /// Compact JSON body written to the object store.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Flatten the raw API response for `asset` into a [`PriceRecord`].
///
/// Fails with [`IngestError::MalformedResponse`] when the asset entry or
/// either of its `usd` / `last_updated_at` fields is absent.
pub fn transform(
    raw: &PriceQuoteRaw,
    asset: Asset,
    ingested_at: DateTime<Utc>,
) -> Result<PriceRecord, IngestError> {
    let quote = raw.get(asset.id).ok_or_else(|| {
        IngestError::MalformedResponse(format!("asset '{}' missing from response", asset.id))
    })?;

    let price_usd = quote.usd.ok_or_else(|| {
        IngestError::MalformedResponse(format!("field 'usd' missing for '{}'", asset.id))
    })?;

    let source_timestamp = quote.last_updated_at.ok_or_else(|| {
        IngestError::MalformedResponse(format!(
            "field 'last_updated_at' missing for '{}'",
            asset.id
        ))
    })?;

    Ok(PriceRecord {
        asset: asset.id.to_string(),
        price_usd,
        source_timestamp,
        ingested_at: iso8601(ingested_at),
    })
}

/// Naive ISO-8601 rendering of a UTC instant.
///
/// Whole seconds render as `2024-01-15T12:00:00`; anything finer adds
/// microseconds: `2024-01-15T12:00:00.250000`.
pub fn iso8601(at: DateTime<Utc>) -> String {
    let naive = at.naive_utc();
    if at.timestamp_subsec_micros() == 0 {
        naive.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        naive.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn transform_copies_quote_fields() {
        let raw = PriceQuoteRaw::single("bitcoin", 65000.5, 1_700_000_000);
        let record = transform(&raw, Asset::BITCOIN, noon()).unwrap();

        assert_eq!(record.asset(), "bitcoin");
        assert_eq!(record.price_usd(), 65000.5);
        assert_eq!(record.source_timestamp(), 1_700_000_000);
        assert_eq!(record.ingested_at(), "2024-01-15T12:00:00");
    }

    #[test]
    fn record_serializes_in_field_order() {
        let raw = PriceQuoteRaw::single("bitcoin", 65000.5, 1_700_000_000);
        let record = transform(&raw, Asset::BITCOIN, noon()).unwrap();
        let body = String::from_utf8(record.to_json_bytes().unwrap()).unwrap();

        assert_eq!(
            body,
            r#"{"asset":"bitcoin","price_usd":65000.5,"source_timestamp":1700000000,"ingested_at":"2024-01-15T12:00:00"}"#
        );
    }

    #[test]
    fn body_parses_back_to_exact_price() {
        let raw = PriceQuoteRaw::from_slice(
            br#"{"bitcoin": {"usd": 7372376.6175152715, "last_updated_at": 1700000000}}"#,
        )
        .unwrap();
        let record = transform(&raw, Asset::BITCOIN, noon()).unwrap();
        assert_eq!(record.price_usd(), 7372376.6175152715);

        let body = record.to_json_bytes().unwrap();
        let back: PriceRecord = serde_json::from_slice(&body).unwrap();
        assert_eq!(back, record);
        assert_eq!(back.price_usd().to_bits(), 7372376.6175152715_f64.to_bits());

        let raw = PriceQuoteRaw::single("bitcoin", 2033777.9201530302, 1_700_000_000);
        let record = transform(&raw, Asset::BITCOIN, noon()).unwrap();
        let back: PriceRecord = serde_json::from_slice(&record.to_json_bytes().unwrap()).unwrap();
        assert_eq!(back.price_usd(), 2033777.9201530302);
    }

    #[test]
    fn missing_asset_is_malformed() {
        let raw = PriceQuoteRaw::single("ethereum", 3000.0, 1_700_000_000);
        let err = transform(&raw, Asset::BITCOIN, noon()).unwrap_err();
        assert!(matches!(err, IngestError::MalformedResponse(_)));
        assert!(err.to_string().contains("bitcoin"));
    }

    #[test]
    fn missing_fields_are_malformed() {
        let raw = PriceQuoteRaw::from_slice(br#"{"bitcoin": {"usd": 1.0}}"#).unwrap();
        let err = transform(&raw, Asset::BITCOIN, noon()).unwrap_err();
        assert!(err.to_string().contains("last_updated_at"));

        let raw = PriceQuoteRaw::from_slice(br#"{"bitcoin": {"last_updated_at": 1}}"#).unwrap();
        let err = transform(&raw, Asset::BITCOIN, noon()).unwrap_err();
        assert!(err.to_string().contains("usd"));
    }

    #[test]
    fn iso8601_keeps_microseconds() {
        let at = noon() + chrono::Duration::microseconds(250_000);
        assert_eq!(iso8601(at), "2024-01-15T12:00:00.250000");
        assert_eq!(iso8601(noon()), "2024-01-15T12:00:00");
    }
}
