// ABOUTME: Record-store boundary: paginated listing and per-record creation, with an Airtable client.
// ABOUTME: Also gathers the Known-ID set and writes records best-effort, one failure never aborting the batch.

use std::time::Duration;

use reqwest::blocking::Client as HttpClient;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, error};
use url::Url;

use crate::dedup::KnownIds;
use crate::error::StoreError;
use crate::models::Record;
use crate::settings::StoreConfig;

/// Field holding the dedup key in stored records.
pub const EXTERNAL_ID_FIELD: &str = "External ID";

/// Records per listing page.
pub const PAGE_SIZE: u32 = 100;

/// A record as returned by the store.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StoredRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl StoredRecord {
    /// The non-empty External ID string, if present.
    pub fn external_id(&self) -> Option<&str> {
        self.fields
            .get(EXTERNAL_ID_FIELD)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// One page of a store listing.
pub type StoredPage = Vec<StoredRecord>;

/// Destination for deduplicated records.
pub trait RecordStore {
    /// Lists every stored record, one page at a time.
    fn pages(&self) -> Box<dyn Iterator<Item = Result<StoredPage, StoreError>> + '_>;

    /// Persists one record.
    fn create(&self, record: &Record) -> Result<(), StoreError>;
}

/// Collects the External IDs of every stored record.
pub fn collect_known_ids(store: &dyn RecordStore) -> Result<KnownIds, StoreError> {
    let mut ids = KnownIds::new();
    for page in store.pages() {
        let page = page?;
        ids.extend(page.iter().filter_map(StoredRecord::external_id));
    }
    Ok(ids)
}

/// Outcome of a best-effort batch write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    pub created: usize,
    pub failed: usize,
}

/// Creates each record in turn; failures are logged and counted.
pub fn create_records(store: &dyn RecordStore, records: &[Record]) -> WriteStats {
    let mut stats = WriteStats::default();
    for rec in records {
        match store.create(rec) {
            Ok(()) => stats.created += 1,
            Err(err) => {
                error!(
                    "Failed to create Airtable record {}: {}",
                    rec.external_id, err
                );
                stats.failed += 1;
            }
        }
    }
    stats
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    records: Vec<StoredRecord>,
    #[serde(default)]
    offset: Option<String>,
}

/// Airtable REST client for a single table.
#[derive(Debug, Clone)]
pub struct AirtableStore {
    client: HttpClient,
    endpoint: Url,
    token: String,
}

impl AirtableStore {
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let mut endpoint = Url::parse(&config.api_url)
            .map_err(|e| StoreError::InvalidUrl(format!("{}: {}", config.api_url, e)))?;
        endpoint
            .path_segments_mut()
            .map_err(|_| StoreError::InvalidUrl(config.api_url.clone()))?
            .pop_if_empty()
            .push(&config.base)
            .push(&config.table);

        let client = HttpClient::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(StoreError::http)?;

        Ok(Self {
            client,
            endpoint,
            token: config.token.clone(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn list_page(&self, offset: Option<&str>) -> Result<ListResponse, StoreError> {
        let mut req = self
            .client
            .get(self.endpoint.clone())
            .bearer_auth(&self.token)
            .query(&[("pageSize", PAGE_SIZE.to_string())]);
        if let Some(offset) = offset {
            req = req.query(&[("offset", offset)]);
        }

        let resp = req.send().map_err(StoreError::http)?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }
        resp.json::<ListResponse>().map_err(StoreError::decode)
    }
}

impl RecordStore for AirtableStore {
    fn pages(&self) -> Box<dyn Iterator<Item = Result<StoredPage, StoreError>> + '_> {
        Box::new(AirtablePages {
            store: self,
            offset: None,
            done: false,
        })
    }

    fn create(&self, record: &Record) -> Result<(), StoreError> {
        let resp = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.token)
            .json(&json!({ "fields": record }))
            .send()
            .map_err(StoreError::http)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }
        debug!(external_id = %record.external_id, "created record");
        Ok(())
    }
}

/// Follows Airtable's `offset` cursor until the listing is exhausted or fails.
struct AirtablePages<'a> {
    store: &'a AirtableStore,
    offset: Option<String>,
    done: bool,
}

impl Iterator for AirtablePages<'_> {
    type Item = Result<StoredPage, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.store.list_page(self.offset.as_deref()) {
            Ok(page) => {
                self.offset = page.offset.filter(|o| !o.is_empty());
                self.done = self.offset.is_none();
                Some(Ok(page.records))
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
