// src/services/panel.rs

//! HTML parsing for listing rows and expanded detail panels.
//!
//! The browser adapter hands raw HTML to these functions so the lookup rules
//! can be exercised without a running browser.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::utils::{resolve_url, text::normalize};

static CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").expect("valid selector"));
static BOLD: LazyLock<Selector> = LazyLock::new(|| Selector::parse("b").expect("valid selector"));
static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid selector"));

fn text_of(element: ElementRef<'_>) -> String {
    normalize(element.text().collect::<String>())
}

/// Parse the outer HTML of one `<tr>` inside a table body.
pub fn detail_fragment(row_html: &str) -> Html {
    Html::parse_fragment(&format!("<table><tbody>{row_html}</tbody></table>"))
}

/// Cell texts of a single `<tr>` given its outer HTML.
pub fn row_cells(row_html: &str) -> Vec<String> {
    detail_fragment(row_html).select(&CELL).map(text_of).collect()
}

/// Whether a row is a placeholder (e.g. "No data available") rather than a tender.
pub fn is_placeholder(row_inner_html: &str, placeholder_prefix: &str) -> bool {
    row_inner_html.trim_start().starts_with(placeholder_prefix)
}

/// Find the value cell for a label in the detail panel.
///
/// Takes the first `<b>` whose text contains `label`, climbs to its enclosing
/// `<td>` and returns the text of the next sibling `<td>`. Returns `""` when
/// any step is missing.
pub fn labeled_value(document: &Html, label: &str) -> String {
    let Some(label_elem) = document
        .select(&BOLD)
        .find(|b| b.text().collect::<String>().contains(label))
    else {
        return String::new();
    };

    let Some(cell) = enclosing(label_elem, "td") else {
        return String::new();
    };

    cell.next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|sibling| sibling.value().name() == "td")
        .map(text_of)
        .unwrap_or_default()
}

/// Document links from the table that holds the documents label.
///
/// Keeps `href`s containing `marker`, resolved against `base` when given.
pub fn document_links(
    document: &Html,
    documents_label: &str,
    marker: &str,
    base: Option<&Url>,
) -> Vec<String> {
    let Some(table) = document
        .select(&BOLD)
        .find(|b| b.text().collect::<String>().contains(documents_label))
        .and_then(|b| enclosing(b, "table"))
    else {
        log::debug!("No document section found");
        return Vec::new();
    };

    let links: Vec<String> = table
        .select(&ANCHOR)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| href.contains(marker))
        .map(|href| match base {
            Some(base) => resolve_url(base, href),
            None => href.to_string(),
        })
        .collect();

    log::debug!("Found {} document links", links.len());
    links
}

/// Nearest ancestor element with the given tag name.
fn enclosing<'a>(element: ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| ancestor.value().name() == tag)
}
