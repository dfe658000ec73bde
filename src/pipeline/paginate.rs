// src/pipeline/paginate.rs

//! Pagination state machine over the listing.

use std::time::Duration;

use sha2::{Digest, Sha256};

use super::walker::{PageOutcome, PageWalker};
use crate::models::{RetryConfig, RunState, RunStats, Termination, TimingConfig};
use crate::services::{ListingDriver, ListingRow};

/// Pagination state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlState {
    /// Walking the given 1-based page
    Scraping(u32),
    Stopped,
    Exhausted,
}

pub struct Paginator<'a, D: ?Sized> {
    driver: &'a D,
    walker: PageWalker,
    next_page_delay: Duration,
}

impl<'a, D> Paginator<'a, D>
where
    D: ListingDriver + ?Sized,
{
    pub fn new(driver: &'a D, timing: &TimingConfig, retry: &RetryConfig) -> Self {
        Self {
            driver,
            walker: PageWalker::new(timing, retry),
            next_page_delay: timing.next_page(),
        }
    }

    /// Walk pages from the current one until stopped or out of pages.
    pub async fn run(&self, state: &mut RunState) -> (Termination, RunStats) {
        let mut stats = RunStats::default();
        let mut crawl = CrawlState::Scraping(1);
        let mut previous: Option<String> = None;

        loop {
            let page = match crawl {
                CrawlState::Scraping(page) => page,
                CrawlState::Stopped => return (Termination::Stopped, stats),
                CrawlState::Exhausted => return (Termination::Exhausted, stats),
            };

            log::info!("Processing page {page}");
            // A failed listing has no fingerprint and leaves `previous` as is.
            let rows = match self.driver.list_rows().await {
                Ok(rows) => {
                    let fingerprint = page_fingerprint(&rows).await;
                    if previous.as_deref() == Some(fingerprint.as_str()) {
                        log::warn!("Page {page} repeats the previous page, stopping");
                        crawl = CrawlState::Exhausted;
                        continue;
                    }
                    previous = Some(fingerprint);
                    rows
                }
                Err(e) => {
                    log::error!("Could not list rows on page {page}: {e}");
                    Vec::new()
                }
            };
            stats.pages_visited += 1;

            log::info!("Found {} rows on page {page}", rows.len());
            if self.walker.walk(self.driver, rows, state, &mut stats).await == PageOutcome::StopAll {
                log::info!("Reached tenders older than {}, stopping", state.window.from);
                crawl = CrawlState::Stopped;
                continue;
            }

            crawl = self.advance(page).await;
        }
    }

    async fn advance(&self, page: u32) -> CrawlState {
        match self.driver.has_next_page().await {
            Ok(true) => {}
            Ok(false) => {
                log::info!("No more pages after page {page}");
                return CrawlState::Exhausted;
            }
            Err(e) => {
                log::warn!("Could not check for a next page: {e}");
                return CrawlState::Exhausted;
            }
        }

        match self.driver.go_to_next_page().await {
            Ok(true) => {
                tokio::time::sleep(self.next_page_delay).await;
                CrawlState::Scraping(page + 1)
            }
            Ok(false) => CrawlState::Exhausted,
            Err(e) => {
                log::warn!("Could not advance past page {page}: {e}");
                CrawlState::Exhausted
            }
        }
    }
}

/// SHA-256 over the column texts of every row on a page.
async fn page_fingerprint<R: ListingRow>(rows: &[R]) -> String {
    let mut hasher = Sha256::new();
    for row in rows {
        for cell in row.columns().await.unwrap_or_default() {
            hasher.update(cell.as_bytes());
            hasher.update([0x1f]);
        }
        hasher.update([0x1e]);
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::DateWindow;
    use crate::testing::{FakeDriver, RowSpec};

    fn june() -> RunState {
        let window = DateWindow::new(
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
        )
        .unwrap();
        RunState::new(window, "2025/07/01", "ETENDERS.GOV.ZA")
    }

    async fn paginate(driver: &FakeDriver) -> (Termination, RunStats, RunState) {
        let mut state = june();
        let paginator = Paginator::new(
            driver,
            &TimingConfig::immediate(),
            &RetryConfig::default(),
        );
        let (termination, stats) = paginator.run(&mut state).await;
        (termination, stats, state)
    }

    #[tokio::test]
    async fn exhausts_all_pages() {
        let driver = FakeDriver::new(vec![
            vec![RowSpec::tender("T1", "20/06/2025"), RowSpec::tender("T2", "19/06/2025")],
            vec![RowSpec::tender("T3", "10/06/2025")],
        ]);

        let (termination, stats, state) = paginate(&driver).await;

        assert_eq!(termination, Termination::Exhausted);
        assert_eq!(stats.pages_visited, 2);
        let ids: Vec<_> = state.records.iter().map(|r| r.tender_id.as_str()).collect();
        assert_eq!(ids, vec!["T1", "T2", "T3"]);
    }

    #[tokio::test]
    async fn row_before_window_stops_pagination() {
        let driver = FakeDriver::new(vec![
            vec![RowSpec::tender("T1", "20/06/2025"), RowSpec::tender("T2", "31/05/2025")],
            vec![RowSpec::tender("T3", "10/06/2025")],
        ]);

        let (termination, stats, state) = paginate(&driver).await;

        assert_eq!(termination, Termination::Stopped);
        assert_eq!(stats.pages_visited, 1);
        assert_eq!(state.records.len(), 1);
        assert_eq!(driver.current_page(), 0);
    }

    #[tokio::test]
    async fn repeated_page_is_exhausted() {
        let driver = FakeDriver::new(vec![vec![RowSpec::tender("T1", "20/06/2025")]]).stuck();

        let (termination, stats, state) = paginate(&driver).await;

        assert_eq!(termination, Termination::Exhausted);
        assert_eq!(stats.pages_visited, 1);
        assert_eq!(state.records.len(), 1);
    }

    #[tokio::test]
    async fn unlistable_page_does_not_end_pagination() {
        let driver = FakeDriver::new(vec![
            vec![RowSpec::tender("T1", "20/06/2025")],
            vec![RowSpec::tender("T2", "19/06/2025")],
            vec![RowSpec::tender("T3", "18/06/2025")],
        ])
        .unlistable_page(1);

        let (termination, stats, state) = paginate(&driver).await;

        assert_eq!(termination, Termination::Exhausted);
        assert_eq!(stats.pages_visited, 3);
        let ids: Vec<_> = state.records.iter().map(|r| r.tender_id.as_str()).collect();
        assert_eq!(ids, vec!["T1", "T3"]);
    }

    #[tokio::test]
    async fn consecutive_unlistable_pages_keep_paginating() {
        let driver = FakeDriver::new(vec![
            vec![RowSpec::tender("T1", "20/06/2025")],
            vec![RowSpec::tender("T2", "19/06/2025")],
            vec![RowSpec::tender("T3", "18/06/2025")],
            vec![RowSpec::tender("T4", "17/06/2025")],
        ])
        .unlistable_page(1)
        .unlistable_page(2);

        let (termination, stats, state) = paginate(&driver).await;

        assert_eq!(termination, Termination::Exhausted);
        assert_eq!(stats.pages_visited, 4);
        assert_eq!(driver.current_page(), 3);
        let ids: Vec<_> = state.records.iter().map(|r| r.tender_id.as_str()).collect();
        assert_eq!(ids, vec!["T1", "T4"]);
    }

    #[tokio::test]
    async fn empty_listing_is_exhausted() {
        let driver = FakeDriver::new(vec![vec![]]);

        let (termination, stats, state) = paginate(&driver).await;

        assert_eq!(termination, Termination::Exhausted);
        assert_eq!(stats.pages_visited, 1);
        assert!(state.records.is_empty());
    }
}
