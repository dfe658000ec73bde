// src/pipeline/merge.rs

//! Merge of a run's records into the cumulative store.
//!
//! Unknown tenders are prepended so the newest discoveries come first.
//! Existing rows are never updated. Identity across runs is the tender
//! number alone; within a run it is [`DedupTracker::unique_key`].
//!
//! [`DedupTracker::unique_key`]: super::DedupTracker::unique_key

use std::collections::{HashSet, VecDeque};

use crate::models::TenderRecord;
use crate::utils::text::normalize;

/// Cumulative store after a merge.
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    /// Merged and renumbered store
    pub cumulative: Vec<TenderRecord>,
    /// Run records inserted into the store
    pub added: usize,
    /// Run records already present in the store
    pub skipped: usize,
}

/// Merge `run` records into `existing`.
///
/// Each run record whose `TENDER_ID` is not in `existing` is inserted at the
/// front, in run order, so later run records end up before earlier ones.
pub fn merge(run: &[TenderRecord], existing: Vec<TenderRecord>) -> MergeOutcome {
    let known: HashSet<String> = existing
        .iter()
        .map(|record| normalize(&record.tender_id))
        .collect();

    let mut cumulative: VecDeque<TenderRecord> = existing.into();
    let mut added = 0;
    let mut skipped = 0;

    for record in run {
        if known.contains(&normalize(&record.tender_id)) {
            skipped += 1;
            continue;
        }
        cumulative.push_front(record.clone());
        added += 1;
    }

    let mut cumulative: Vec<TenderRecord> = cumulative.into();
    renumber(&mut cumulative);

    log::info!(
        "Merged {added} new tenders into the cumulative store ({skipped} already present, {} total)",
        cumulative.len()
    );

    MergeOutcome {
        cumulative,
        added,
        skipped,
    }
}

/// `RECORD_ID = len - position`, so the first row carries the highest id.
pub fn renumber(records: &mut [TenderRecord]) {
    let len = records.len();
    for (position, record) in records.iter_mut().enumerate() {
        record.record_id = (len - position) as u32;
    }
}

/// The run's records alone, renumbered for the dated snapshot.
pub fn dated_snapshot(run: &[TenderRecord]) -> Vec<TenderRecord> {
    let mut snapshot = run.to_vec();
    renumber(&mut snapshot);
    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tender(id: &str) -> TenderRecord {
        TenderRecord {
            tender_id: id.into(),
            tender_description: format!("Description of {id}"),
            ..TenderRecord::default()
        }
    }

    fn ids(records: &[TenderRecord]) -> Vec<(&str, u32)> {
        records
            .iter()
            .map(|r| (r.tender_id.as_str(), r.record_id))
            .collect()
    }

    #[test]
    fn prepends_unknown_tenders() {
        let existing = vec![tender("T1"), tender("T2")];
        let run = vec![tender("T3"), tender("T1")];

        let outcome = merge(&run, existing);

        assert_eq!(ids(&outcome.cumulative), vec![("T3", 3), ("T1", 2), ("T2", 1)]);
        assert_eq!(outcome.added, 1);
        assert_eq!(outcome.skipped, 1);
    }

    #[test]
    fn later_run_records_come_first() {
        let run = vec![tender("T4"), tender("T5")];

        let outcome = merge(&run, vec![tender("T1")]);

        assert_eq!(ids(&outcome.cumulative), vec![("T5", 3), ("T4", 2), ("T1", 1)]);
    }

    #[test]
    fn existing_rows_are_not_updated() {
        let mut stored = tender("T1");
        stored.requirements = "Grade 3 CIDB".into();
        let mut rescraped = tender("T1");
        rescraped.tender_description = "Changed".into();

        let outcome = merge(&[rescraped], vec![stored.clone()]);

        assert_eq!(outcome.cumulative[0].tender_description, stored.tender_description);
        assert_eq!(outcome.cumulative[0].requirements, "Grade 3 CIDB");
    }

    #[test]
    fn empty_store_takes_the_run() {
        let outcome = merge(&[tender("T1"), tender("T2")], Vec::new());
        assert_eq!(ids(&outcome.cumulative), vec![("T2", 2), ("T1", 1)]);
        assert_eq!(outcome.added, 2);
    }

    #[test]
    fn snapshot_keeps_run_order() {
        let snapshot = dated_snapshot(&[tender("T3"), tender("T1")]);
        assert_eq!(ids(&snapshot), vec![("T3", 2), ("T1", 1)]);
    }

    #[test]
    fn renumber_empty_is_noop() {
        let mut records: Vec<TenderRecord> = Vec::new();
        renumber(&mut records);
        assert!(records.is_empty());
    }
}
