// src/pipeline/walker.rs

//! Sequential walk over the rows of one listing page.

use std::time::Duration;

use super::extract::{RowExtractor, RowOutcome};
use crate::models::{RetryConfig, RunState, RunStats, TimingConfig};
use crate::services::ListingDriver;

/// How a page walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// Every row was handled; move on to the next page
    Completed,
    /// A row predates the window; stop paginating
    StopAll,
}

#[derive(Debug, Clone)]
pub struct PageWalker {
    extractor: RowExtractor,
    max_retries: u32,
    retry_delay: Duration,
}

impl PageWalker {
    pub fn new(timing: &TimingConfig, retry: &RetryConfig) -> Self {
        Self {
            extractor: RowExtractor::new(timing.clone()),
            max_retries: retry.max_retries,
            retry_delay: timing.retry_delay(),
        }
    }

    /// Walk `rows` in order.
    ///
    /// A stale row triggers a fresh row listing and a retry of the same
    /// index, up to `max_retries` times, after which the row is skipped.
    pub async fn walk<D>(
        &self,
        driver: &D,
        mut rows: Vec<D::Row>,
        state: &mut RunState,
        stats: &mut RunStats,
    ) -> PageOutcome
    where
        D: ListingDriver + ?Sized,
    {
        let mut index = 0;
        while index < rows.len() {
            let position = index + 1;
            stats.rows_seen += 1;
            let mut retries = 0;

            loop {
                let Some(row) = rows.get(index) else {
                    log::warn!("Row {position} disappeared after re-fetching the page");
                    stats.rows_skipped += 1;
                    break;
                };

                match self.extractor.extract(row, state).await {
                    Ok(RowOutcome::Accepted(_)) => {
                        stats.accepted += 1;
                        break;
                    }
                    Ok(RowOutcome::Rejected(reason)) => {
                        log::debug!("Row {position} rejected: {reason}");
                        stats.record_rejection(reason);
                        break;
                    }
                    Ok(RowOutcome::Stop) => return PageOutcome::StopAll,
                    Err(e) if e.is_stale() && retries < self.max_retries => {
                        retries += 1;
                        stats.stale_retries += 1;
                        log::warn!(
                            "Stale element at row {position}, retry {retries}/{}",
                            self.max_retries
                        );
                        tokio::time::sleep(self.retry_delay).await;

                        match driver.list_rows().await {
                            Ok(fresh) => rows = fresh,
                            Err(e) => {
                                log::error!("Could not re-fetch rows: {e}");
                                return PageOutcome::Completed;
                            }
                        }
                    }
                    Err(e) if e.is_stale() => {
                        log::error!(
                            "Row {position} still stale after {} retries, skipping",
                            self.max_retries
                        );
                        stats.rows_skipped += 1;
                        break;
                    }
                    Err(e) => {
                        log::error!("Error processing row {position}: {e}");
                        stats.row_failures += 1;
                        break;
                    }
                }
            }

            index += 1;
        }

        PageOutcome::Completed
    }
}
