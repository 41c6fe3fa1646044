//! Date-partitioned object keys.
//!
//! Layout: `raw/{YYYY-MM-DD}/{ticker}_price_{unix_seconds}.{fraction}.json`
//!
//! The fraction is the sub-second part of the instant (microsecond
//! resolution, trailing zeros trimmed, `0` on a whole second). Two
//! invocations landing on the same microsecond produce the same key.

use super::asset::Asset;
use chrono::{DateTime, Utc};
use std::fmt;

/// Top-level prefix for freshly ingested objects.
pub const RAW_PREFIX: &str = "raw";

/// Key under which one record is written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    /// Derive the key for `asset` from a wall-clock instant.
    pub fn for_instant(asset: Asset, at: DateTime<Utc>) -> Self {
        let date = at.format("%Y-%m-%d");
        let stamp = unix_timestamp_with_fraction(at);
        Self(format!(
            "{RAW_PREFIX}/{date}/{}_price_{stamp}.json",
            asset.ticker
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The date partition this key belongs to, e.g. `raw/2024-01-15`.
    pub fn partition(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[..idx],
            None => &self.0,
        }
    }

    /// Final path segment, e.g. `btc_price_1705320000.0.json`.
    pub fn file_name(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn unix_timestamp_with_fraction(at: DateTime<Utc>) -> String {
    let secs = at.timestamp();
    let micros = at.timestamp_subsec_micros();
    if micros == 0 {
        return format!("{secs}.0");
    }
    let fraction = format!("{micros:06}");
    format!("{secs}.{}", fraction.trim_end_matches('0'))
}
