// src/pipeline/dedup.rs

//! Within-run duplicate detection.
//!
//! Keyed on tender number plus publication date. The cumulative merge uses a
//! different key (tender number alone), see [`super::merge`].

use std::collections::HashSet;

use crate::models::TenderRecord;
use crate::utils::text::normalize;

#[derive(Debug, Clone, Default)]
pub struct DedupTracker {
    seen: HashSet<String>,
}

impl DedupTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// `normalize(TENDER_ID) + "_" + normalize(PUBLICATION_DATE)`.
    pub fn unique_key(record: &TenderRecord) -> String {
        format!(
            "{}_{}",
            normalize(&record.tender_id),
            normalize(&record.publication_date)
        )
    }

    pub fn is_duplicate(&self, record: &TenderRecord) -> bool {
        self.seen.contains(&Self::unique_key(record))
    }

    /// Record a tender as seen. Returns `false` if it already was.
    pub fn register(&mut self, record: &TenderRecord) -> bool {
        self.seen.insert(Self::unique_key(record))
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
