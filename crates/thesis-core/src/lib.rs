//! Core types and trait definitions for the thesis topic tracker.
//!
//! No HTTP or database code lives here. The crate owns the data model, the
//! store contract and the reconciliation engine that converges persisted
//! topic state onto a freshly scraped snapshot.

pub mod error;
pub mod lab;
pub mod memory;
pub mod reconcile;
pub mod snapshot;
pub mod store;
pub mod topic;

pub use error::{Error, Result};
