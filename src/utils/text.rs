// src/utils/text.rs

//! Text normalization for scraped cell and label values.

use std::fmt::Display;

/// ASCII control characters that are dropped outright.
///
/// TAB, LF and CR survive this pass and are folded by the whitespace collapse.
fn is_stripped_control(c: char) -> bool {
    matches!(c, '\u{00}'..='\u{08}' | '\u{0B}' | '\u{0C}' | '\u{0E}'..='\u{1F}' | '\u{7F}')
}

/// Clean raw extracted text.
///
/// Removes ASCII control characters (except TAB, LF, CR), collapses runs of
/// whitespace (newlines included) into a single space and trims both ends.
/// Applying it twice gives the same result as applying it once.
pub fn normalize(raw: impl AsRef<str>) -> String {
    let cleaned: String = raw
        .as_ref()
        .chars()
        .filter(|c| !is_stripped_control(*c))
        .collect();

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize an optional value; `None` becomes an empty string.
pub fn normalize_opt(raw: Option<&str>) -> String {
    raw.map(normalize).unwrap_or_default()
}

/// Normalize any displayable value through its textual form.
pub fn normalize_display<T: Display + ?Sized>(value: &T) -> String {
    normalize(value.to_string())
}
