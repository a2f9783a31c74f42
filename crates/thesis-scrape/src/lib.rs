//! Scraping side of the thesis topic tracker.
//!
//! Turns the configured lab list into a [`Snapshot`] by validating each lab's
//! link and running its registered [`SourceAdapter`]. Per-lab failures are
//! recorded, not propagated. The snapshot is then handed to the
//! reconciliation engine in `thesis-core`.
//!
//! [`Snapshot`]: thesis_core::snapshot::Snapshot

pub mod adapter;
pub mod adapters;
pub mod aggregate;
pub mod artifact;
pub mod error;
pub mod fetch;
pub mod sync;
pub mod validator;

pub use adapter::{AdapterRegistry, SourceAdapter};
pub use aggregate::{Aggregator, LabConfig, LabOutcome};
pub use error::{AdapterError, Result};
pub use sync::Synchronizer;
pub use validator::{HttpLinkValidator, LinkValidator};
