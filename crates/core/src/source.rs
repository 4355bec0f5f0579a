// ABOUTME: Extractor capability and the built-in release-notes sources.
// ABOUTME: A source fetches its page and turns it into Records; fetch failures yield no records.

use tracing::{debug, error};

use crate::extract::{extract_announcements, SectionLayout};
use crate::fetch::Fetcher;
use crate::models::{external_id, Record};

/// A named source that can fetch its page and extract records from it.
///
/// `fetch_and_parse` never fails: a page that cannot be fetched is logged
/// and yields an empty list, so one broken source does not stop the others.
pub trait Extractor {
    /// Canonical lowercase registry key; also the external-id prefix.
    fn key(&self) -> &str;

    fn fetch_and_parse(&self, fetcher: &dyn Fetcher) -> Vec<Record>;
}

/// A vendor release-notes page laid out as date sections of feature headings.
#[derive(Debug, Clone)]
pub struct ReleaseNotesPage {
    pub key: String,
    pub product: String,
    pub url: String,
    pub page_label: String,
    pub layout: SectionLayout,
}

impl ReleaseNotesPage {
    /// ChatGPT release notes on the OpenAI help center.
    pub fn chatgpt() -> Self {
        Self {
            key: "chatgpt".to_string(),
            product: "ChatGPT".to_string(),
            url: "https://help.openai.com/en/articles/6825453-chatgpt-release-notes".to_string(),
            page_label: "ChatGPT Release Notes".to_string(),
            layout: SectionLayout::default(),
        }
    }

    /// Extracts records from already-fetched markup, in document order.
    pub fn parse(&self, html: &str) -> Vec<Record> {
        extract_announcements(html, &self.layout)
            .into_iter()
            .map(|a| Record {
                product: self.product.clone(),
                external_id: external_id(&self.key, a.release_date, &a.feature_name),
                release_date: a.release_date.format("%Y-%m-%d").to_string(),
                feature_name: a.feature_name,
                description: a.description,
                source_url: self.url.clone(),
                source_page: self.page_label.clone(),
            })
            .collect()
    }
}

impl Extractor for ReleaseNotesPage {
    fn key(&self) -> &str {
        &self.key
    }

    fn fetch_and_parse(&self, fetcher: &dyn Fetcher) -> Vec<Record> {
        match fetcher.fetch(&self.url) {
            Ok(html) => {
                let records = self.parse(&html);
                debug!(source = %self.key, count = records.len(), "extracted records");
                records
            }
            Err(err) => {
                error!("Failed to download {}: {}", self.page_label, err);
                Vec::new()
            }
        }
    }
}
