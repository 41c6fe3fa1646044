//! The instrument being tracked.

use std::fmt;

/// An asset as the upstream API and the storage layout name it.
///
/// `id` is the API identifier and the value written to `PriceRecord::asset`;
/// `ticker` is the short prefix used in object file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Asset {
    pub id: &'static str,
    pub ticker: &'static str,
}

impl Asset {
    pub const BITCOIN: Asset = Asset {
        id: "bitcoin",
        ticker: "btc",
    };
}

impl Default for Asset {
    fn default() -> Self {
        Asset::BITCOIN
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id)
    }
}
