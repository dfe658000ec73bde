//! Storage abstractions for tender exports.
//!
//! ## Directory Structure
//!
//! ```text
//! output/
//! ├── master_tenders.xlsx       # Cumulative store, newest first
//! ├── tenders_2025_06_30.xlsx   # Dated snapshot of one run
//! └── last_run.json             # Report of the last run
//! ```

pub mod local;

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{RunReport, TenderRecord};

pub use local::LocalStorage;

/// Metadata about a storage write operation.
#[derive(Debug, Clone)]
pub struct WriteMetadata {
    /// File that was written
    pub location: PathBuf,
    /// Records in the file
    pub count: usize,
    pub timestamp: DateTime<Utc>,
}

/// Trait for tender storage backends.
#[async_trait]
pub trait TenderStorage: Send + Sync {
    /// Load the cumulative store. A missing store is empty.
    async fn load_cumulative(&self) -> Result<Vec<TenderRecord>>;

    /// Replace the cumulative store.
    async fn write_cumulative(&self, records: &[TenderRecord]) -> Result<WriteMetadata>;

    /// Write a dated snapshot under `name`.
    async fn write_snapshot(&self, name: &str, records: &[TenderRecord])
    -> Result<WriteMetadata>;

    /// Persist the report of a finished run.
    async fn write_report(&self, report: &RunReport) -> Result<PathBuf>;
}
