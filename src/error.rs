// src/error.rs

//! Unified error handling for the scraper.

use std::fmt;

use thiserror::Error;

/// Result type alias for scraper operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Workbook could not be read
    #[error("Workbook read error: {0}")]
    WorkbookRead(#[from] calamine::XlsxError),

    /// Workbook could not be written
    #[error("Workbook write error: {0}")]
    WorkbookWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// The automation session failed
    #[error("Browser error: {0}")]
    Browser(String),

    /// A row handle no longer refers to a live element
    #[error("Stale element: {0}")]
    StaleElement(String),

    /// Scraping error
    #[error("Scrape error for {context}: {message}")]
    Crawl { context: String, message: String },
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a browser/automation error.
    pub fn browser(message: impl fmt::Display) -> Self {
        Self::Browser(message.to_string())
    }

    /// Create a stale element error.
    pub fn stale(message: impl fmt::Display) -> Self {
        Self::StaleElement(message.to_string())
    }

    /// Create a scrape error with context.
    pub fn crawl(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Crawl {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Whether the failure came from a row reference that went stale.
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::StaleElement(_))
    }
}

/// DevTools messages reported when a node was re-rendered under us.
#[cfg(feature = "browser")]
const STALE_MARKERS: &[&str] = &[
    "no node with given id",
    "could not find node",
    "node is detached",
    "does not belong to the document",
    "cannot find context with specified id",
];

#[cfg(feature = "browser")]
impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        let message = err.to_string();
        let lower = message.to_lowercase();
        if STALE_MARKERS.iter().any(|marker| lower.contains(marker)) {
            Self::StaleElement(message)
        } else {
            Self::Browser(message)
        }
    }
}
