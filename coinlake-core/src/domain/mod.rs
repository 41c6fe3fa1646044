//! Domain types: the tracked asset, the persisted record, and its storage key.

pub mod asset;
pub mod key;
pub mod record;

pub use asset::Asset;
pub use key::{StorageKey, RAW_PREFIX};
pub use record::{iso8601, transform, PriceRecord};
