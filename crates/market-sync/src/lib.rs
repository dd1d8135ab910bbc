//! Periodic market snapshot sync.
//!
//! Downloads a gzip-compressed CSV snapshot, merges it into a single table
//! with the upsert-and-keep-history policy from [`market_core::reconcile`],
//! and writes the result back through a [`market_core::TableStore`].

pub mod config;
pub mod decode;
pub mod download;
pub mod error;
pub mod job;

pub use config::{DatabaseLocation, JobConfig};
pub use download::SnapshotClient;
pub use error::{Error, Result};
pub use job::{JobReport, apply_snapshot, ping, run};
