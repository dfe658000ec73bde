// src/models/mod.rs

//! Domain models for the scraper.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod run;
mod selectors;
mod tender;

// Re-export all public types
pub use config::{
    BrowserConfig, Config, LoggingConfig, OutputConfig, RetryConfig, ScrapingConfig, TimingConfig,
};
pub use run::{
    DateWindow, RejectReason, RunReport, RunState, RunStats, Termination, WindowPosition,
};
pub use selectors::{ListingSelectors, labels};
pub use tender::{COLUMNS, TenderRecord};
