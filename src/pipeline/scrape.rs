// src/pipeline/scrape.rs

//! Tender scraping pipeline.

use chrono::{Local, Utc};

use super::merge::{dated_snapshot, merge};
use super::paginate::Paginator;
use crate::error::{AppError, Result};
use crate::models::{Config, RunReport, RunState, Termination};
use crate::services::ListingDriver;
use crate::storage::TenderStorage;
use crate::utils::date::CANONICAL_DATE_FORMAT;
use crate::utils::log;

/// Run one scrape: walk the listing, then export the snapshot and the
/// merged cumulative store.
///
/// Returns `None` when no tender in the window was found; nothing is
/// written in that case.
pub async fn run_scraper<D>(
    config: &Config,
    driver: &D,
    storage: &dyn TenderStorage,
) -> Result<Option<RunReport>>
where
    D: ListingDriver + ?Sized,
{
    let start_time = Utc::now();
    let window = config.window()?;

    log::header("TENDER SCRAPER STARTED");
    log::sub_item(&format!("Date range: {} to {}", window.from, window.to));
    log::sub_item(&format!("URL: {}", config.scraping.url));

    let report_date = Local::now().format(CANONICAL_DATE_FORMAT).to_string();
    let mut state = RunState::new(window, report_date, config.scraping.source.as_str());

    driver
        .navigate(&config.scraping.url)
        .await
        .map_err(|e| AppError::crawl(&config.scraping.url, e))?;

    let paginator = Paginator::new(driver, &config.timing, &config.retry);
    let (termination, stats) = paginator.run(&mut state).await;
    let records = state.into_records();

    if records.is_empty() {
        ::log::warn!(
            "No tenders found in the date range {} to {}",
            window.from,
            window.to
        );
        return Ok(None);
    }

    let snapshot = dated_snapshot(&records);
    let snapshot_meta = storage
        .write_snapshot(&config.snapshot_file_name(), &snapshot)
        .await?;

    let existing = storage.load_cumulative().await?;
    let merged = merge(&records, existing);
    let cumulative_meta = storage.write_cumulative(&merged.cumulative).await?;

    let report = RunReport {
        start_time,
        end_time: Utc::now(),
        window,
        termination,
        stats,
        snapshot_count: snapshot_meta.count,
        cumulative_count: cumulative_meta.count,
        cumulative_added: merged.added,
    };
    let report_path = storage.write_report(&report).await?;

    let stopped_by = match report.termination {
        Termination::Stopped => "reached start of window",
        Termination::Exhausted => "no more pages",
    };
    log::summary(
        "SCRAPING COMPLETED",
        &[
            ("Pages visited", report.stats.pages_visited.to_string()),
            ("Rows seen", report.stats.rows_seen.to_string()),
            ("Tenders extracted", report.stats.accepted.to_string()),
            ("Rows rejected", report.stats.rejected_total().to_string()),
            ("Rows skipped", report.stats.rows_skipped.to_string()),
            ("Stopped because", stopped_by.to_string()),
            ("Snapshot", snapshot_meta.location.display().to_string()),
            (
                "Cumulative store",
                format!(
                    "{} ({} new, {} total)",
                    cumulative_meta.location.display(),
                    report.cumulative_added,
                    report.cumulative_count
                ),
            ),
            ("Run report", report_path.display().to_string()),
            (
                "Duration",
                format!(
                    "{:.1}s",
                    (report.end_time - report.start_time).num_milliseconds() as f64 / 1000.0
                ),
            ),
        ],
    );

    Ok(Some(report))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::models::TenderRecord;
    use crate::storage::LocalStorage;
    use crate::testing::{FakeDriver, RowSpec};

    const URL: &str = "https://www.etenders.gov.za/Home/opportunities?id=1";

    fn config(tmp: &TempDir) -> Config {
        let mut config = Config::from_toml(&format!(
            r#"
            [scraping]
            url = "{URL}"
            date_from = "2025-06-01"
            date_to = "2025-06-30"
            "#
        ))
        .unwrap();
        config.timing = crate::models::TimingConfig::immediate();
        config.output.dir = tmp.path().to_path_buf();
        config
    }

    fn stored(id: &str, record_id: u32) -> TenderRecord {
        TenderRecord {
            record_id,
            tender_id: id.into(),
            tender_description: format!("Stored {id}"),
            publication_date: "2025/05/20".into(),
            closing_date: "2025/06/20".into(),
            ..TenderRecord::default()
        }
    }

    #[tokio::test]
    async fn exports_snapshot_and_merged_store() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp);
        let storage = LocalStorage::from_config(&config.output);
        storage
            .write_cumulative(&[stored("T1", 2), stored("T2", 1)])
            .await
            .unwrap();

        let driver = FakeDriver::new(vec![
            vec![RowSpec::tender("T3", "20/06/2025")],
            vec![RowSpec::tender("T1", "19/06/2025"), RowSpec::tender("T0", "30/05/2025")],
        ]);

        let report = run_scraper(&config, &driver, &storage)
            .await
            .unwrap()
            .expect("tenders were found");

        assert_eq!(driver.navigated(), vec![URL.to_string()]);
        assert_eq!(report.termination, Termination::Stopped);
        assert_eq!(report.snapshot_count, 2);
        assert_eq!(report.cumulative_added, 1);
        assert_eq!(report.cumulative_count, 3);

        let cumulative = storage.load_cumulative().await.unwrap();
        let ids: Vec<_> = cumulative
            .iter()
            .map(|r| (r.tender_id.as_str(), r.record_id))
            .collect();
        assert_eq!(ids, vec![("T3", 3), ("T1", 2), ("T2", 1)]);
        assert_eq!(cumulative[1].tender_description, "Stored T1");

        assert!(tmp.path().join("tenders_2025_06_30.xlsx").exists());
        assert!(tmp.path().join("last_run.json").exists());
    }

    #[tokio::test]
    async fn empty_run_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp);
        let storage = LocalStorage::from_config(&config.output);
        let driver = FakeDriver::new(vec![vec![RowSpec::tender("T1", "15/05/2025")]]);

        let report = run_scraper(&config, &driver, &storage).await.unwrap();

        assert!(report.is_none());
        assert!(!tmp.path().join("master_tenders.xlsx").exists());
        assert!(!tmp.path().join("tenders_2025_06_30.xlsx").exists());
    }

    #[tokio::test]
    async fn malformed_store_fails_after_snapshot() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp);
        std::fs::write(tmp.path().join("master_tenders.xlsx"), "A,B\n1,2\n").unwrap();
        let storage = LocalStorage::from_config(&config.output);
        let driver = FakeDriver::new(vec![vec![RowSpec::tender("T1", "15/06/2025")]]);

        let result = run_scraper(&config, &driver, &storage).await;

        assert!(result.is_err());
        assert!(tmp.path().join("tenders_2025_06_30.xlsx").exists());
        let untouched = std::fs::read_to_string(tmp.path().join("master_tenders.xlsx")).unwrap();
        assert_eq!(untouched, "A,B\n1,2\n");
    }
}
