// src/models/selectors.rs

//! Selectors and labels describing the tender listing layout.

use serde::{Deserialize, Serialize};

/// Detail-panel labels read for every expanded row.
pub mod labels {
    pub const TENDER_NUMBER: &str = "Tender Number:";
    pub const TENDER_TYPE: &str = "Tender Type:";
    pub const BRIEFING_VENUE: &str = "Briefing Venue";
    pub const ORGAN_OF_STATE: &str = "Organ Of State:";
    pub const PROVINCE: &str = "Province:";
    pub const BRIEFING_SESSION: &str = "Is there a briefing session?";
    pub const COMPULSORY_BRIEFING: &str = "Is it compulsory?";
    pub const CLOSING_DATE: &str = "Closing Date:";
    pub const BRIEFING_DATE: &str = "Briefing Date and Time";
}

/// CSS selectors and markers for the listing page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingSelectors {
    /// Selector for each row of the listing table
    #[serde(default = "defaults::row_selector")]
    pub row_selector: String,

    /// Rows whose inner HTML starts with this are placeholders
    #[serde(default = "defaults::placeholder_prefix")]
    pub placeholder_prefix: String,

    /// Selector for the next-page control
    #[serde(default = "defaults::next_button")]
    pub next_button: String,

    /// Class present on the next-page control when there is no next page
    #[serde(default = "defaults::disabled_class")]
    pub disabled_class: String,

    /// Class present on a row whose detail panel is open
    #[serde(default = "defaults::expanded_class")]
    pub expanded_class: String,

    /// Label heading the document table in the detail panel
    #[serde(default = "defaults::documents_label")]
    pub documents_label: String,

    /// Substring identifying document download links
    #[serde(default = "defaults::download_marker")]
    pub download_marker: String,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            row_selector: defaults::row_selector(),
            placeholder_prefix: defaults::placeholder_prefix(),
            next_button: defaults::next_button(),
            disabled_class: defaults::disabled_class(),
            expanded_class: defaults::expanded_class(),
            documents_label: defaults::documents_label(),
            download_marker: defaults::download_marker(),
        }
    }
}

impl ListingSelectors {
    /// Names of selector fields that are empty.
    pub fn empty_fields(&self) -> Vec<&'static str> {
        [
            ("row_selector", &self.row_selector),
            ("placeholder_prefix", &self.placeholder_prefix),
            ("next_button", &self.next_button),
            ("disabled_class", &self.disabled_class),
            ("expanded_class", &self.expanded_class),
            ("documents_label", &self.documents_label),
            ("download_marker", &self.download_marker),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

mod defaults {
    pub fn row_selector() -> String {
        "table.dataTable > tbody > tr".into()
    }
    pub fn placeholder_prefix() -> String {
        "<td colspan".into()
    }
    pub fn next_button() -> String {
        "#tendeList_next".into()
    }
    pub fn disabled_class() -> String {
        "disabled".into()
    }
    pub fn expanded_class() -> String {
        "shown".into()
    }
    pub fn documents_label() -> String {
        "TENDER DOCUMENTS".into()
    }
    pub fn download_marker() -> String {
        "Download".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_no_empty_fields() {
        assert!(ListingSelectors::default().empty_fields().is_empty());
    }

    #[test]
    fn reports_empty_fields() {
        let selectors = ListingSelectors {
            next_button: " ".into(),
            ..ListingSelectors::default()
        };
        assert_eq!(selectors.empty_fields(), vec!["next_button"]);
    }
}
