// src/pipeline/extract.rs

//! Turns one listing row into a tender record.

use chrono::NaiveDate;

use super::validate;
use crate::error::Result;
use crate::models::{
    RejectReason, RunState, TenderRecord, TimingConfig, WindowPosition, labels,
};
use crate::pipeline::DedupTracker;
use crate::services::ListingRow;
use crate::utils::date::{
    ADVERTISED_DATE_FORMAT, CANONICAL_DATE_FORMAT, parse_closing_date_time, parse_day_month_year,
};
use crate::utils::text::normalize;

/// Visible columns of a listing row.
const MIN_COLUMNS: usize = 5;
const CATEGORY_COLUMN: usize = 1;
const DESCRIPTION_COLUMN: usize = 2;
const ESUBMISSION_COLUMN: usize = 3;
const ADVERTISED_COLUMN: usize = 4;

const CROSS_GLYPHS: [char; 3] = ['✗', '✘', '✖'];

/// Result of extracting a single row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Accepted(TenderRecord),
    Rejected(RejectReason),
    /// The row predates the window; nothing older follows.
    Stop,
}

/// Detail-panel values read after expanding a row.
#[derive(Debug, Default)]
struct PanelValues {
    tender_number: String,
    tender_type: String,
    briefing_venue: String,
    department: String,
    province: String,
    briefing_session: String,
    compulsory_briefing: String,
    closing: String,
    briefing: String,
    links: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RowExtractor {
    timing: TimingConfig,
}

impl RowExtractor {
    pub fn new(timing: TimingConfig) -> Self {
        Self { timing }
    }

    /// Extract one row, appending accepted records to `state`.
    ///
    /// Errors are automation failures only; a stale row surfaces as
    /// [`AppError::StaleElement`](crate::error::AppError::StaleElement).
    pub async fn extract<R>(&self, row: &R, state: &mut RunState) -> Result<RowOutcome>
    where
        R: ListingRow + ?Sized,
    {
        let columns = row.columns().await?;
        if columns.len() < MIN_COLUMNS {
            log::debug!("Skipping row with {} columns", columns.len());
            return Ok(RowOutcome::Rejected(RejectReason::MalformedRow));
        }

        let category = normalize(&columns[CATEGORY_COLUMN]);
        let description = normalize(&columns[DESCRIPTION_COLUMN]);
        let advertised = normalize(&columns[ADVERTISED_COLUMN]);

        let published = match NaiveDate::parse_from_str(&advertised, ADVERTISED_DATE_FORMAT) {
            Ok(date) => date,
            Err(_) => {
                log::warn!("Could not parse advertised date: {advertised:?}");
                return Ok(RowOutcome::Rejected(RejectReason::BadDate));
            }
        };

        match state.window.classify(published) {
            WindowPosition::Before => {
                log::info!(
                    "Tender advertised {published} is before {}, stopping",
                    state.window.from
                );
                return Ok(RowOutcome::Stop);
            }
            WindowPosition::After => {
                log::debug!("Tender advertised {published} is after {}, skipping", state.window.to);
                return Ok(RowOutcome::Rejected(RejectReason::OutOfWindow));
            }
            WindowPosition::Within => {}
        }

        let esubmission = esubmission_flag(&columns[ESUBMISSION_COLUMN]);

        row.expand().await?;
        tokio::time::sleep(self.timing.expand_row()).await;
        let panel = self.read_panel(row).await?;

        let (closing_date, closing_time) = parse_closing_date_time(&panel.closing);
        let mut record = TenderRecord {
            report_date: state.report_date.clone(),
            tender_id: panel.tender_number,
            publication_date: published.format(CANONICAL_DATE_FORMAT).to_string(),
            closing_date,
            closing_time,
            tender_type: panel.tender_type,
            tender_description: description,
            tender_source: state.source.clone(),
            department: panel.department,
            province: panel.province,
            esubmission,
            category,
            is_there_a_briefing_session: panel.briefing_session,
            briefing_date: parse_day_month_year(&panel.briefing),
            compulsory_briefing: panel.compulsory_briefing,
            briefing_session_venue: panel.briefing_venue,
            link: panel.links.into_iter().next().unwrap_or_default(),
            ..TenderRecord::default()
        };

        if state.seen.is_duplicate(&record) {
            log::debug!("Duplicate tender skipped: {}", DedupTracker::unique_key(&record));
            self.collapse(row).await;
            return Ok(RowOutcome::Rejected(RejectReason::Duplicate));
        }

        record.normalize_fields();

        if !validate::validate(&record) {
            self.collapse(row).await;
            return Ok(RowOutcome::Rejected(RejectReason::Invalid));
        }

        state.seen.register(&record);
        state.records.push(record.clone());
        log::info!("Extracted: {}", record.summary_line());

        self.collapse(row).await;
        Ok(RowOutcome::Accepted(record))
    }

    async fn read_panel<R>(&self, row: &R) -> Result<PanelValues>
    where
        R: ListingRow + ?Sized,
    {
        let links = match row.document_links().await {
            Ok(links) => links,
            Err(e) if e.is_stale() => return Err(e),
            Err(e) => {
                log::warn!("Could not read document links: {e}");
                Vec::new()
            }
        };

        Ok(PanelValues {
            tender_number: label(row, labels::TENDER_NUMBER).await?,
            tender_type: label(row, labels::TENDER_TYPE).await?,
            briefing_venue: label(row, labels::BRIEFING_VENUE).await?,
            department: label(row, labels::ORGAN_OF_STATE).await?,
            province: label(row, labels::PROVINCE).await?,
            briefing_session: label(row, labels::BRIEFING_SESSION).await?,
            compulsory_briefing: label(row, labels::COMPULSORY_BRIEFING).await?,
            closing: label(row, labels::CLOSING_DATE).await?,
            briefing: label(row, labels::BRIEFING_DATE).await?,
            links,
        })
    }

    /// Best-effort collapse.
    async fn collapse<R>(&self, row: &R)
    where
        R: ListingRow + ?Sized,
    {
        match row.collapse().await {
            Ok(()) => tokio::time::sleep(self.timing.collapse_row()).await,
            Err(e) => log::debug!("Could not collapse row: {e}"),
        }
    }
}

/// Labelled panel value; non-stale lookup failures read as `""`.
async fn label<R>(row: &R, name: &str) -> Result<String>
where
    R: ListingRow + ?Sized,
{
    match row.labeled_value(name).await {
        Ok(value) => Ok(normalize(value)),
        Err(e) if e.is_stale() => Err(e),
        Err(e) => {
            log::warn!("Could not read {name:?}: {e}");
            Ok(String::new())
        }
    }
}

/// Map the e-submission marker to `Yes`/`No`, keeping unknown markers verbatim.
fn esubmission_flag(raw: &str) -> String {
    let marker = normalize(raw);
    let lower = marker.to_lowercase();

    if marker.contains('✔') || marker.contains('✓') || lower.contains("tick") {
        "Yes".into()
    } else if marker.is_empty() || lower.contains('x') || marker.contains(CROSS_GLYPHS) {
        "No".into()
    } else {
        marker
    }
}
