// ABOUTME: Core library for scraping vendor release notes into deduplicated feature records.
// ABOUTME: Provides extraction, source registry, deduplication, store/CSV sinks and the run pipeline.

pub mod date_parse;
pub mod dedup;
pub mod error;
pub mod export;
pub mod extract;
pub mod fetch;
pub mod models;
pub mod pipeline;
pub mod registry;
pub mod settings;
pub mod source;
pub mod store;

pub use date_parse::parse_heading_date;
pub use dedup::{filter_new, KnownIds};
pub use error::{
    ConfigError, ExportError, FetchError, PipelineError, SelectionError, StoreError,
};
pub use export::{encode_csv, write_csv};
pub use extract::{extract_announcements, Announcement, Block, SectionLayout, SectionMachine};
pub use fetch::{FetchOptions, Fetcher, FileFetcher, HttpFetcher};
pub use models::{external_id, Record, COLUMNS};
pub use pipeline::{Pipeline, PipelineBuilder, RunSummary};
pub use registry::SourceRegistry;
pub use settings::StoreConfig;
pub use source::{Extractor, ReleaseNotesPage};
pub use store::{
    collect_known_ids, create_records, AirtableStore, RecordStore, StoredPage, StoredRecord,
    WriteStats,
};
