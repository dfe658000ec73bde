//! Local filesystem storage implementation.
//!
//! Records are stored as `.xlsx` workbooks with a header row in the fixed
//! column order of [`COLUMNS`]. Date columns hold date cells and `LINK` holds
//! a hyperlink. Every write goes to a temporary file that is then renamed over
//! the target.

use std::io::Cursor;
use std::path::PathBuf;

use async_trait::async_trait;
use calamine::{Data, Reader, Xlsx};
use chrono::{Datelike, NaiveDate, Utc};
use rust_xlsxwriter::{Color, ExcelDateTime, Format, Workbook, Worksheet};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{COLUMNS, OutputConfig, RunReport, TenderRecord};
use crate::storage::{TenderStorage, WriteMetadata};
use crate::utils::date::CANONICAL_DATE_FORMAT;
use crate::utils::text::{normalize, normalize_display, normalize_opt};

const SHEET_NAME: &str = "Tenders";
const DATE_NUM_FORMAT: &str = "yyyy/mm/dd";
const DATE_COLUMNS: [&str; 4] = [
    "REPORT_DATE",
    "PUBLICATION_DATE",
    "CLOSING_DATE",
    "BRIEFING_DATE",
];
const LINK_COLUMN: &str = "LINK";
const RECORD_ID_COLUMN: &str = "RECORD_ID";
const TENDER_ID_COLUMN: &str = "TENDER_ID";
const MAX_COLUMN_WIDTH: usize = 50;

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
    cumulative_file: String,
    stats_file: String,
}

impl LocalStorage {
    /// Create a LocalStorage rooted at the given directory with default file names.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self::from_config(&OutputConfig {
            dir: root_dir.into(),
            ..OutputConfig::default()
        })
    }

    pub fn from_config(output: &OutputConfig) -> Self {
        Self {
            root_dir: output.dir.clone(),
            cumulative_file: output.cumulative_file.clone(),
            stats_file: output.stats_file.clone(),
        }
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.path(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(path)
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<PathBuf> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    async fn write_records(&self, key: &str, records: &[TenderRecord]) -> Result<WriteMetadata> {
        let bytes = encode_records(records)?;
        let location = self.write_bytes(key, &bytes).await?;
        log::info!("Saved {} tenders to {}", records.len(), location.display());

        Ok(WriteMetadata {
            location,
            count: records.len(),
            timestamp: Utc::now(),
        })
    }
}

/// One worksheet: a frozen header row followed by one row per record.
fn encode_records(records: &[TenderRecord]) -> Result<Vec<u8>> {
    let header = Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(0x4472C4));
    let date = Format::new().set_num_format(DATE_NUM_FORMAT);
    let mut widths: Vec<usize> = COLUMNS.iter().map(|c| c.len()).collect();

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, name) in (0u16..).zip(COLUMNS) {
        sheet.write_string_with_format(0, col, name, &header)?;
    }

    for (row, record) in (1u32..).zip(records) {
        let fields = serde_json::to_value(record)?;
        for ((col, name), width) in (0u16..).zip(COLUMNS).zip(widths.iter_mut()) {
            match fields.get(name) {
                Some(Value::Number(number)) => {
                    let value = number.as_f64().unwrap_or_default();
                    sheet.write_number(row, col, value)?;
                    *width = (*width).max(number.to_string().len());
                }
                Some(Value::String(text)) if !text.is_empty() => {
                    write_text(sheet, row, col, name, text, &date)?;
                    *width = (*width).max(text.chars().count());
                }
                _ => {}
            }
        }
    }

    for (col, width) in (0u16..).zip(&widths) {
        let width = (width + 2).min(MAX_COLUMN_WIDTH);
        sheet.set_column_width(col, width as f64)?;
    }
    sheet.set_freeze_panes(1, 0)?;

    Ok(workbook.save_to_buffer()?)
}

/// Date columns become date cells and web links become hyperlinks;
/// anything that does not parse stays text.
fn write_text(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    column: &str,
    text: &str,
    date: &Format,
) -> Result<()> {
    if DATE_COLUMNS.contains(&column) {
        if let Some(day) = excel_date(text) {
            sheet.write_datetime_with_format(row, col, &day, date)?;
            return Ok(());
        }
    } else if column == LINK_COLUMN
        && is_web_link(text)
        && sheet.write_url(row, col, text).is_ok()
    {
        return Ok(());
    }

    sheet.write_string(row, col, text)?;
    Ok(())
}

fn excel_date(text: &str) -> Option<ExcelDateTime> {
    let day = NaiveDate::parse_from_str(text, CANONICAL_DATE_FORMAT).ok()?;
    let year = u16::try_from(day.year()).ok()?;
    ExcelDateTime::from_ymd(year, day.month() as u8, day.day() as u8).ok()
}

fn is_web_link(text: &str) -> bool {
    Url::parse(text).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

fn decode_records(bytes: Vec<u8>, source: &str) -> Result<Vec<TenderRecord>> {
    let mut workbook = Xlsx::new(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::validation(format!("{source} has no worksheet")))??;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .map(|row| row.iter().map(header_name).collect())
        .unwrap_or_default();
    if !headers.iter().any(|h| h == TENDER_ID_COLUMN) {
        return Err(AppError::validation(format!(
            "{source} has no {TENDER_ID_COLUMN} column"
        )));
    }

    rows.enumerate()
        .map(|(index, row)| decode_row(&headers, row, index + 2, source))
        .collect()
}

/// Header names are normalized before both the column check and the lookup.
fn header_name(cell: &Data) -> String {
    normalize_opt(match cell {
        Data::String(name) => Some(name.as_str()),
        _ => None,
    })
}

/// Build a record from one data row; unknown columns are ignored and
/// missing ones default to empty.
fn decode_row(headers: &[String], row: &[Data], line: usize, source: &str) -> Result<TenderRecord> {
    let mut fields = Map::new();
    for (name, cell) in headers.iter().zip(row) {
        if name == RECORD_ID_COLUMN {
            if let Some(id) = record_id(cell, line, source)? {
                fields.insert(name.clone(), Value::from(id));
            }
        } else if COLUMNS.contains(&name.as_str()) {
            fields.insert(name.clone(), Value::String(cell_text(cell)));
        }
    }
    Ok(serde_json::from_value(Value::Object(fields))?)
}

fn record_id(cell: &Data, line: usize, source: &str) -> Result<Option<u32>> {
    let parsed = match cell {
        Data::Empty => return Ok(None),
        Data::String(text) if text.trim().is_empty() => return Ok(None),
        Data::String(text) => text.trim().parse().ok(),
        Data::Int(value) => u32::try_from(*value).ok(),
        Data::Float(value)
            if value.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(value) =>
        {
            Some(*value as u32)
        }
        _ => None,
    };

    parsed.map(Some).ok_or_else(|| {
        AppError::validation(format!(
            "{source} row {line}: {RECORD_ID_COLUMN} is not a number ({cell:?})"
        ))
    })
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(text) | Data::DateTimeIso(text) | Data::DurationIso(text) => normalize(text),
        Data::DateTime(when) => match when.as_datetime() {
            Some(when) => when.format(CANONICAL_DATE_FORMAT).to_string(),
            None => normalize_display(&when.as_f64()),
        },
        other => normalize_display(other),
    }
}

#[async_trait]
impl TenderStorage for LocalStorage {
    async fn load_cumulative(&self) -> Result<Vec<TenderRecord>> {
        match self.read_bytes(&self.cumulative_file).await? {
            Some(bytes) => {
                let records = decode_records(bytes, &self.cumulative_file)?;
                log::info!(
                    "Loaded {} tenders from {}",
                    records.len(),
                    self.cumulative_file
                );
                Ok(records)
            }
            None => {
                log::info!("No cumulative store found at {}", self.cumulative_file);
                Ok(Vec::new())
            }
        }
    }

    async fn write_cumulative(&self, records: &[TenderRecord]) -> Result<WriteMetadata> {
        self.write_records(&self.cumulative_file, records).await
    }

    async fn write_snapshot(
        &self,
        name: &str,
        records: &[TenderRecord],
    ) -> Result<WriteMetadata> {
        self.write_records(name, records).await
    }

    async fn write_report(&self, report: &RunReport) -> Result<PathBuf> {
        self.write_json(&self.stats_file, report).await
    }
}
