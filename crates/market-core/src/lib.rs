//! Core types for the market snapshot sync job.
//!
//! Holds the tabular data model, the snapshot reconciler and the storage
//! trait. This crate does no I/O; the SQLite backend and the job binary
//! depend on it.

// Native `async fn` in traits; see `store::TableStore`.
#![allow(async_fn_in_trait)]

pub mod dataset;
pub mod error;
pub mod reconcile;
pub mod store;
pub mod value;

pub use dataset::Dataset;
pub use error::{Error, Result};
pub use reconcile::{ReconcileStats, Reconciled, reconcile};
pub use store::{TableStore, WriteMode, WriteOptions};
pub use value::Value;
