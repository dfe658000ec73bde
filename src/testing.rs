// src/testing.rs

//! Scripted listing driver for pipeline tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::labels;
use crate::services::{ListingDriver, ListingRow};

/// Script for one listing row. Clones share their counters.
#[derive(Debug, Clone)]
pub struct RowSpec {
    columns: Vec<String>,
    labels: HashMap<String, String>,
    links: Vec<String>,
    /// Stale failures still to be raised by `expand()`
    stale_failures: Arc<AtomicU32>,
    /// Raise a non-stale error from `columns()`
    broken: bool,
    /// Label whose lookup fails with a non-stale error
    failing_label: Option<String>,
    /// Raise a non-stale error from `collapse()`
    failing_collapse: bool,
    expands: Arc<AtomicU32>,
    collapses: Arc<AtomicU32>,
}

impl RowSpec {
    /// A well-formed row advertised on `advertised` (`DD/MM/YYYY`).
    pub fn tender(id: &str, advertised: &str) -> Self {
        let labels = [
            (labels::TENDER_NUMBER, id.to_string()),
            (labels::TENDER_TYPE, "Request for Quotation".to_string()),
            (labels::ORGAN_OF_STATE, "Department of Health".to_string()),
            (labels::PROVINCE, "Gauteng".to_string()),
            (labels::BRIEFING_SESSION, "No".to_string()),
            (labels::CLOSING_DATE, "Thursday, 31 July 2025 - 11:00".to_string()),
        ]
        .into_iter()
        .map(|(label, value)| (label.to_string(), value))
        .collect();

        Self {
            columns: vec![
                String::new(),
                "Services: General".into(),
                format!("Supply for {id}"),
                "✔".into(),
                advertised.into(),
            ],
            labels,
            links: vec![format!(
                "https://www.etenders.gov.za/home/Download/?blobName={id}.pdf"
            )],
            stale_failures: Arc::new(AtomicU32::new(0)),
            broken: false,
            failing_label: None,
            failing_collapse: false,
            expands: Arc::new(AtomicU32::new(0)),
            collapses: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn with_columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_column(mut self, index: usize, value: &str) -> Self {
        self.columns[index] = value.to_string();
        self
    }

    pub fn with_label(mut self, label: &str, value: &str) -> Self {
        self.labels.insert(label.to_string(), value.to_string());
        self
    }

    pub fn with_links(mut self, links: &[&str]) -> Self {
        self.links = links.iter().map(|l| l.to_string()).collect();
        self
    }

    pub fn with_stale_failures(self, count: u32) -> Self {
        self.stale_failures.store(count, Ordering::SeqCst);
        self
    }

    pub fn broken(mut self) -> Self {
        self.broken = true;
        self
    }

    pub fn with_failing_label(mut self, label: &str) -> Self {
        self.failing_label = Some(label.to_string());
        self
    }

    pub fn with_failing_collapse(mut self) -> Self {
        self.failing_collapse = true;
        self
    }

    pub fn expands(&self) -> u32 {
        self.expands.load(Ordering::SeqCst)
    }

    pub fn collapses(&self) -> u32 {
        self.collapses.load(Ordering::SeqCst)
    }

    pub fn row(&self) -> FakeRow {
        FakeRow {
            spec: self.clone(),
            expanded: AtomicBool::new(false),
        }
    }
}

pub struct FakeRow {
    spec: RowSpec,
    expanded: AtomicBool,
}

#[async_trait]
impl ListingRow for FakeRow {
    async fn columns(&self) -> Result<Vec<String>> {
        if self.spec.broken {
            return Err(AppError::browser("row is unreadable"));
        }
        Ok(self.spec.columns.clone())
    }

    async fn expand(&self) -> Result<()> {
        let remaining = self.spec.stale_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.spec.stale_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(AppError::stale("row was re-rendered"));
        }
        if !self.expanded.swap(true, Ordering::SeqCst) {
            self.spec.expands.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn collapse(&self) -> Result<()> {
        if self.spec.failing_collapse {
            return Err(AppError::browser("toggle is covered"));
        }
        if self.expanded.swap(false, Ordering::SeqCst) {
            self.spec.collapses.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn labeled_value(&self, label: &str) -> Result<String> {
        if self.spec.failing_label.as_deref() == Some(label) {
            return Err(AppError::browser(format!("lookup of {label} failed")));
        }
        Ok(self.spec.labels.get(label).cloned().unwrap_or_default())
    }

    async fn document_links(&self) -> Result<Vec<String>> {
        Ok(self.spec.links.clone())
    }
}

/// Paged listing backed by [`RowSpec`]s.
#[derive(Default)]
pub struct FakeDriver {
    pages: Vec<Vec<RowSpec>>,
    current: AtomicUsize,
    /// Advancing reports success without changing page
    stuck: bool,
    /// Pages whose row listing fails
    unlistable: Vec<usize>,
    list_calls: AtomicU32,
    navigated: Mutex<Vec<String>>,
}

impl FakeDriver {
    pub fn new(pages: Vec<Vec<RowSpec>>) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    pub fn stuck(mut self) -> Self {
        self.stuck = true;
        self
    }

    pub fn unlistable_page(mut self, index: usize) -> Self {
        self.unlistable.push(index);
        self
    }

    /// Zero-based index of the page currently shown.
    pub fn current_page(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> u32 {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn navigated(&self) -> Vec<String> {
        self.navigated.lock().map(|n| n.clone()).unwrap_or_default()
    }

    fn has_more(&self) -> bool {
        self.current_page() + 1 < self.pages.len()
    }
}

#[async_trait]
impl ListingDriver for FakeDriver {
    type Row = FakeRow;

    async fn navigate(&self, url: &str) -> Result<()> {
        if let Ok(mut navigated) = self.navigated.lock() {
            navigated.push(url.to_string());
        }
        self.current.store(0, Ordering::SeqCst);
        Ok(())
    }

    async fn list_rows(&self) -> Result<Vec<FakeRow>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let page = self.current_page();
        if self.unlistable.contains(&page) {
            return Err(AppError::browser("table did not render"));
        }
        Ok(self
            .pages
            .get(page)
            .map(|rows| rows.iter().map(RowSpec::row).collect())
            .unwrap_or_default())
    }

    async fn has_next_page(&self) -> Result<bool> {
        Ok(self.stuck || self.has_more())
    }

    async fn go_to_next_page(&self) -> Result<bool> {
        if self.stuck {
            return Ok(true);
        }
        if !self.has_more() {
            return Ok(false);
        }
        self.current.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
