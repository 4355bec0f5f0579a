// ABOUTME: Parsing of release-note date headings such as "March 3, 2024".
// ABOUTME: A single fixed month-day-year format; anything else is not a date heading.

use chrono::NaiveDate;

/// Format of a date heading: full month name, day, comma, four-digit year.
pub const HEADING_DATE_FORMAT: &str = "%B %d, %Y";

/// Parses heading text as a calendar date.
///
/// Runs of whitespace count as one space and month names match without
/// regard to case. Returns None when the text does not match
/// [`HEADING_DATE_FORMAT`]; chrono alone also takes abbreviated month names
/// and a missing space, so the parsed date is checked against its own
/// rendering.
pub fn parse_heading_date(text: &str) -> Option<NaiveDate> {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() {
        return None;
    }
    let date = NaiveDate::parse_from_str(&normalized, HEADING_DATE_FORMAT).ok()?;
    let padded = date.format(HEADING_DATE_FORMAT).to_string();
    let unpadded = date.format("%B %-d, %Y").to_string();
    (normalized.eq_ignore_ascii_case(&padded) || normalized.eq_ignore_ascii_case(&unpadded))
        .then_some(date)
}
