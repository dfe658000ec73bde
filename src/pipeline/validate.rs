// src/pipeline/validate.rs

//! Record validation and the `validate` command.

use std::fmt;
use std::path::Path;

use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{Config, TenderRecord};
use crate::utils::date::CANONICAL_DATE_FORMAT;
use crate::utils::log;

/// Why a record failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    MissingField(&'static str),
    MalformedDate { field: &'static str, value: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "missing {field}"),
            Self::MalformedDate { field, value } => {
                write!(f, "{field} '{value}' is not a YYYY/MM/DD date")
            }
        }
    }
}

/// Check a normalized record, reporting the first problem found.
pub fn check(record: &TenderRecord) -> std::result::Result<(), ValidationIssue> {
    let required = [
        ("TENDER_ID", &record.tender_id),
        ("TENDER_DESCRIPTION", &record.tender_description),
        ("PUBLICATION_DATE", &record.publication_date),
        ("CLOSING_DATE", &record.closing_date),
    ];
    if let Some((field, _)) = required.into_iter().find(|(_, value)| value.is_empty()) {
        return Err(ValidationIssue::MissingField(field));
    }

    for (field, value) in [
        ("PUBLICATION_DATE", &record.publication_date),
        ("CLOSING_DATE", &record.closing_date),
    ] {
        if !value.is_empty() && NaiveDate::parse_from_str(value, CANONICAL_DATE_FORMAT).is_err() {
            return Err(ValidationIssue::MalformedDate {
                field,
                value: value.clone(),
            });
        }
    }

    Ok(())
}

/// Whether a record may be accepted. Logs the reason on rejection.
pub fn validate(record: &TenderRecord) -> bool {
    match check(record) {
        Ok(()) => true,
        Err(issue) => {
            ::log::warn!("Invalid tender {:?}: {issue}", record.tender_id);
            false
        }
    }
}

/// Load and validate a configuration file, logging what it would scrape.
pub fn run_validate(config_path: &Path) -> Result<Config> {
    log::header("VALIDATING CONFIGURATION");

    match Config::load_validated(config_path) {
        Ok(config) => {
            ::log::info!("Configuration is valid: {}", config_path.display());
            log::sub_item(&format!("URL: {}", config.scraping.url));
            log::sub_item(&format!(
                "Date range: {} to {}",
                config.scraping.date_from, config.scraping.date_to
            ));
            log::sub_item(&format!(
                "Snapshot file: {}",
                config.output_path(&config.snapshot_file_name()).display()
            ));
            log::sub_item(&format!(
                "Cumulative file: {}",
                config.output_path(&config.output.cumulative_file).display()
            ));
            log::sub_item(&format!("Max retries: {}", config.retry.max_retries));
            Ok(config)
        }
        Err(e) => {
            ::log::error!("Configuration validation failed: {e}");
            Err(e)
        }
    }
}
