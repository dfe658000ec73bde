//! Tender record data structure.

use serde::{Deserialize, Serialize};

use crate::utils::text::normalize;

/// Export column order; matches the field order of [`TenderRecord`].
pub const COLUMNS: [&str; 23] = [
    "REPORT_DATE",
    "RECORD_ID",
    "TENDER_ID",
    "PUBLICATION_DATE",
    "CLOSING_DATE",
    "CLOSING_TIME",
    "TENDER_TYPE",
    "TENDER_DESCRIPTION",
    "TENDER_SOURCE",
    "DEPARTMENT",
    "PROVINCE",
    "ESUBMISSION",
    "CATEGORY",
    "IS_THERE_A_BRIEFING_SESSION",
    "BRIEFING_DATE",
    "COMPULSORY_BRIEFING",
    "BRIEFING_SESSION_VENUE",
    "LINK",
    "SOE",
    "COST_OF_SALES_ESTIMATE",
    "CAPABILITY_AVAILABLE",
    "CAPABILITY_GROUP",
    "REQUIREMENTS",
];

/// One tender as it appears in the exported register.
///
/// Field order is the column order of the persisted store.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct TenderRecord {
    /// Calendar date of the run that discovered the tender
    pub report_date: String,

    /// Positional rank, recomputed on every export; not an identity
    pub record_id: u32,

    /// Tender number as published
    pub tender_id: String,

    pub publication_date: String,
    pub closing_date: String,
    pub closing_time: String,
    pub tender_type: String,
    pub tender_description: String,
    pub tender_source: String,

    /// Organ of state
    pub department: String,
    pub province: String,

    /// `Yes`, `No`, or the raw marker when unrecognised
    pub esubmission: String,
    pub category: String,
    pub is_there_a_briefing_session: String,
    pub briefing_date: String,
    pub compulsory_briefing: String,
    pub briefing_session_venue: String,

    /// First document download link
    pub link: String,

    // Reserved columns, kept for schema stability.
    pub soe: String,
    pub cost_of_sales_estimate: String,
    pub capability_available: String,
    pub capability_group: String,
    pub requirements: String,
}

impl TenderRecord {
    /// Mutable access to every string field.
    fn text_fields_mut(&mut self) -> [&mut String; 22] {
        [
            &mut self.report_date,
            &mut self.tender_id,
            &mut self.publication_date,
            &mut self.closing_date,
            &mut self.closing_time,
            &mut self.tender_type,
            &mut self.tender_description,
            &mut self.tender_source,
            &mut self.department,
            &mut self.province,
            &mut self.esubmission,
            &mut self.category,
            &mut self.is_there_a_briefing_session,
            &mut self.briefing_date,
            &mut self.compulsory_briefing,
            &mut self.briefing_session_venue,
            &mut self.link,
            &mut self.soe,
            &mut self.cost_of_sales_estimate,
            &mut self.capability_available,
            &mut self.capability_group,
            &mut self.requirements,
        ]
    }

    /// Apply the text normalizer to every string field in place.
    pub fn normalize_fields(&mut self) {
        for field in self.text_fields_mut() {
            *field = normalize(field.as_str());
        }
    }

    /// Short label for log lines.
    pub fn summary_line(&self) -> String {
        format!(
            "{} [{}], Advertised: {}",
            self.tender_description, self.tender_id, self.publication_date
        )
    }
}
