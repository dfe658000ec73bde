//! Pipeline entry points for scraper operations.
//!
//! - `run_scraper`: Walk the listing and export snapshot and cumulative store
//! - `run_validate`: Check a configuration file

pub mod dedup;
pub mod extract;
pub mod merge;
pub mod paginate;
pub mod scrape;
pub mod validate;
pub mod walker;

pub use dedup::DedupTracker;
pub use extract::{RowExtractor, RowOutcome};
pub use merge::{MergeOutcome, dated_snapshot, merge, renumber};
pub use paginate::{CrawlState, Paginator};
pub use scrape::run_scraper;
pub use validate::{ValidationIssue, run_validate};
pub use walker::{PageOutcome, PageWalker};
