//! Page-automation collaborator for the tender listing.
//!
//! The extraction pipeline only talks to the listing through the
//! [`ListingDriver`] and [`ListingRow`] traits:
//! - `BrowserDriver`: Chrome over the DevTools protocol (`browser` feature)
//! - `panel`: HTML parsing of row cells and the expanded detail panel

#[cfg(feature = "browser")]
mod browser;
pub mod panel;

#[cfg(feature = "browser")]
pub use browser::BrowserDriver;

use async_trait::async_trait;

use crate::error::Result;

/// One expandable row of the listing table.
///
/// Every method may fail with [`AppError::StaleElement`] when the page
/// re-rendered and the handle no longer points at a live row.
///
/// [`AppError::StaleElement`]: crate::error::AppError::StaleElement
#[async_trait]
pub trait ListingRow: Send + Sync {
    /// Visible cell texts, left to right.
    async fn columns(&self) -> Result<Vec<String>>;

    /// Open the detail panel. No-op when already open.
    async fn expand(&self) -> Result<()>;

    /// Close the detail panel. No-op when already closed.
    async fn collapse(&self) -> Result<()>;

    /// Value next to a detail-panel label, or `""` when the label is absent.
    async fn labeled_value(&self, label: &str) -> Result<String>;

    /// Document download links listed in the detail panel.
    async fn document_links(&self) -> Result<Vec<String>>;
}

/// Session on the listing page.
#[async_trait]
pub trait ListingDriver: Send + Sync {
    type Row: ListingRow;

    /// Load the listing and wait for it to settle.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Rows on the current page, placeholder rows excluded.
    async fn list_rows(&self) -> Result<Vec<Self::Row>>;

    /// Whether an enabled next-page control exists.
    async fn has_next_page(&self) -> Result<bool>;

    /// Advance to the next page; `false` when there is none.
    async fn go_to_next_page(&self) -> Result<bool>;

    /// Release the automation session.
    async fn close(&self) -> Result<()>;
}
