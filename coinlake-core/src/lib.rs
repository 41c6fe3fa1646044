//! coinlake core: one-shot price ingestion into a date-partitioned object store.
//!
//! Each invocation runs a linear pipeline:
//! - fetch a quote from the upstream price API ([`source`])
//! - flatten it into a [`domain::PriceRecord`] stamped with the ingestion time
//! - write it as JSON under a date-partitioned [`domain::StorageKey`] ([`store`])
//!
//! Every collaborator (provider, store, clock) is injected into
//! [`pipeline::IngestionPipeline`], so tests run without network or global state.

pub mod clock;
pub mod config;
pub mod domain;
pub mod error;
pub mod pipeline;
pub mod source;
pub mod store;

pub use error::IngestError;
pub use pipeline::{IngestionPipeline, InvocationResponse, InvocationStatus, TriggerEvent};
