//! Per-run scraping state and statistics.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::TenderRecord;
use crate::pipeline::DedupTracker;

/// Inclusive publication-date window `[from, to]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// Where a date falls relative to a [`DateWindow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPosition {
    /// Strictly before `from`
    Before,
    Within,
    /// Strictly after `to`
    After,
}

impl DateWindow {
    /// Build a window, rejecting `from > to`.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if from > to {
            return Err(AppError::validation(format!(
                "date_from ({from}) cannot be later than date_to ({to})"
            )));
        }
        Ok(Self { from, to })
    }

    pub fn classify(&self, date: NaiveDate) -> WindowPosition {
        if date < self.from {
            WindowPosition::Before
        } else if date > self.to {
            WindowPosition::After
        } else {
            WindowPosition::Within
        }
    }
}

/// Why a row did not produce a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Fewer columns than the listing layout requires
    MalformedRow,
    /// Advertised date column not in `DD/MM/YYYY`
    BadDate,
    /// Advertised after the end of the window
    OutOfWindow,
    /// Already accepted earlier in this run
    Duplicate,
    /// Failed record validation
    Invalid,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::MalformedRow => "malformed_row",
            Self::BadDate => "bad_date",
            Self::OutOfWindow => "out_of_window",
            Self::Duplicate => "duplicate",
            Self::Invalid => "invalid",
        };
        f.write_str(label)
    }
}

/// Process-scoped state threaded through one scraping run.
///
/// Owned by the pagination controller's call chain and consumed by the
/// cumulative merger once the walk ends.
#[derive(Debug)]
pub struct RunState {
    /// Accepted records in discovery order (newest listing rows first)
    pub records: Vec<TenderRecord>,
    /// Unique keys seen so far in this run
    pub seen: DedupTracker,
    pub window: DateWindow,
    /// `REPORT_DATE` stamped on every record of this run
    pub report_date: String,
    /// `TENDER_SOURCE` stamped on every record of this run
    pub source: String,
}

impl RunState {
    pub fn new(window: DateWindow, report_date: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            records: Vec::new(),
            seen: DedupTracker::new(),
            window,
            report_date: report_date.into(),
            source: source.into(),
        }
    }

    /// Hand the accumulated records over to the merger.
    pub fn into_records(self) -> Vec<TenderRecord> {
        self.records
    }
}

/// Terminal state of the pagination state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// A row fell before the date window
    Stopped,
    /// No further pages
    Exhausted,
}

/// Counters gathered while walking the listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    pub pages_visited: u32,
    pub rows_seen: usize,
    pub accepted: usize,
    pub rejected: BTreeMap<RejectReason, usize>,
    pub stale_retries: usize,
    /// Rows dropped after exhausting stale retries
    pub rows_skipped: usize,
    /// Rows dropped on a non-stale automation error
    pub row_failures: usize,
}

impl RunStats {
    pub fn record_rejection(&mut self, reason: RejectReason) {
        *self.rejected.entry(reason).or_default() += 1;
    }

    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }

    pub fn rejections(&self, reason: RejectReason) -> usize {
        self.rejected.get(&reason).copied().unwrap_or(0)
    }
}

/// Summary of a finished run, persisted next to the exports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub window: DateWindow,
    pub termination: Termination,
    pub stats: RunStats,
    /// Records in the dated snapshot
    pub snapshot_count: usize,
    /// Records in the cumulative store after the merge
    pub cumulative_count: usize,
    /// Records newly added to the cumulative store
    pub cumulative_added: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn window_classifies_inclusive_bounds() {
        let window = DateWindow::new(date(2025, 6, 1), date(2025, 6, 30)).unwrap();
        assert_eq!(window.classify(date(2025, 5, 31)), WindowPosition::Before);
        assert_eq!(window.classify(date(2025, 6, 1)), WindowPosition::Within);
        assert_eq!(window.classify(date(2025, 6, 30)), WindowPosition::Within);
        assert_eq!(window.classify(date(2025, 7, 1)), WindowPosition::After);
    }

    #[test]
    fn window_rejects_inverted_range() {
        assert!(DateWindow::new(date(2025, 7, 1), date(2025, 6, 1)).is_err());
        assert!(DateWindow::new(date(2025, 6, 1), date(2025, 6, 1)).is_ok());
    }

    #[test]
    fn stats_count_rejections_per_reason() {
        let mut stats = RunStats::default();
        stats.record_rejection(RejectReason::Duplicate);
        stats.record_rejection(RejectReason::Duplicate);
        stats.record_rejection(RejectReason::OutOfWindow);

        assert_eq!(stats.rejections(RejectReason::Duplicate), 2);
        assert_eq!(stats.rejections(RejectReason::Invalid), 0);
        assert_eq!(stats.rejected_total(), 3);
    }

    #[test]
    fn reject_reason_labels() {
        assert_eq!(RejectReason::MalformedRow.to_string(), "malformed_row");
        assert_eq!(RejectReason::OutOfWindow.to_string(), "out_of_window");
    }
}
