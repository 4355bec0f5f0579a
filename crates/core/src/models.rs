// ABOUTME: Normalized release-note record model shared by extraction, dedup and sinks.
// ABOUTME: Field names serialize to the column/field labels used by the CSV export and the record store.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Column order of the flat-file export, also the record-store field names.
pub const COLUMNS: [&str; 7] = [
    "Product",
    "Feature name",
    "Description",
    "Release date",
    "Source URL",
    "Source page",
    "External ID",
];

/// One feature announcement scraped from a release-notes page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "Product")]
    pub product: String,
    #[serde(rename = "Feature name")]
    pub feature_name: String,
    #[serde(rename = "Description")]
    pub description: String,
    /// ISO-8601 calendar date, e.g. "2024-03-01".
    #[serde(rename = "Release date")]
    pub release_date: String,
    #[serde(rename = "Source URL")]
    pub source_url: String,
    #[serde(rename = "Source page")]
    pub source_page: String,
    #[serde(rename = "External ID")]
    pub external_id: String,
}

impl Record {
    /// Values in [`COLUMNS`] order.
    pub fn row(&self) -> [&str; 7] {
        [
            self.product.as_str(),
            self.feature_name.as_str(),
            self.description.as_str(),
            self.release_date.as_str(),
            self.source_url.as_str(),
            self.source_page.as_str(),
            self.external_id.as_str(),
        ]
    }
}

/// Builds the dedup key for a record.
///
/// Depends only on the source key, the release date and the feature title, so
/// the same announcement maps to the same id on every run. Two features with
/// the same title on the same day collapse into one id.
pub fn external_id(source_key: &str, release_date: NaiveDate, feature_name: &str) -> String {
    format!("{}-{}-{}", source_key, release_date.format("%Y-%m-%d"), feature_name)
}
