// ABOUTME: Orchestrates a run: resolve sources, load known IDs, extract, deduplicate, dispatch to sinks.
// ABOUTME: Collaborators are injected through PipelineBuilder; nothing is read from the environment here.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::dedup::{filter_new, KnownIds};
use crate::error::PipelineError;
use crate::export::write_csv;
use crate::fetch::Fetcher;
use crate::registry::SourceRegistry;
use crate::store::{collect_known_ids, create_records, RecordStore};

/// Counts describing one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Sources that were run, in order.
    pub sources: Vec<String>,
    /// Records extracted across all sources.
    pub extracted: usize,
    /// Records not already known to the store.
    pub new_records: usize,
    /// Data rows written to the CSV export, if one was requested.
    pub exported: Option<usize>,
    /// Records created in the store.
    pub created: usize,
    /// Records the store rejected.
    pub failed: usize,
    /// Whether the store took part in the run.
    pub store_used: bool,
}

/// One scrape run wired to its collaborators.
pub struct Pipeline<'a> {
    registry: &'a SourceRegistry,
    fetcher: &'a dyn Fetcher,
    store: Option<&'a dyn RecordStore>,
    csv_path: Option<PathBuf>,
}

/// Builder for [`Pipeline`].
pub struct PipelineBuilder<'a> {
    pipeline: Pipeline<'a>,
}

impl<'a> PipelineBuilder<'a> {
    /// Set the destination store. Without one the run is local-only.
    pub fn store(mut self, store: &'a dyn RecordStore) -> Self {
        self.pipeline.store = Some(store);
        self
    }

    /// Set the CSV export path.
    pub fn csv_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.pipeline.csv_path = Some(path.into());
        self
    }

    pub fn build(self) -> Pipeline<'a> {
        self.pipeline
    }
}

impl<'a> Pipeline<'a> {
    pub fn builder(registry: &'a SourceRegistry, fetcher: &'a dyn Fetcher) -> PipelineBuilder<'a> {
        PipelineBuilder {
            pipeline: Pipeline {
                registry,
                fetcher,
                store: None,
                csv_path: None,
            },
        }
    }

    /// Runs the selected sources end to end.
    ///
    /// An unknown source name fails before any I/O. A store that cannot be
    /// listed is dropped for the rest of the run and nothing is treated as
    /// known. Sources run in order and their records are deduplicated once,
    /// across the merged set.
    pub fn run(&self, selection: &str) -> Result<RunSummary, PipelineError> {
        let sources = self.registry.resolve(selection)?;
        let mut summary = RunSummary {
            sources: sources.iter().map(|s| s.key().to_string()).collect(),
            ..Default::default()
        };

        let mut store = self.store;
        let known = match store {
            Some(s) => match collect_known_ids(s) {
                Ok(ids) => {
                    info!("Loaded {} known record IDs", ids.len());
                    ids
                }
                Err(err) => {
                    warn!("Record store is unavailable: {}. Skipping store upload.", err);
                    store = None;
                    KnownIds::new()
                }
            },
            None => KnownIds::new(),
        };
        summary.store_used = store.is_some();

        let mut all = Vec::new();
        for source in &sources {
            info!("Fetching {} release notes", source.key());
            all.extend(source.fetch_and_parse(self.fetcher));
        }
        summary.extracted = all.len();

        let new_records = filter_new(&all, &known);
        summary.new_records = new_records.len();
        if new_records.is_empty() {
            info!("No new records found");
        } else {
            info!("Collected {} new records", new_records.len());
        }

        // With nothing new the export falls back to the full extraction.
        let export = self.csv_path.as_ref().map(|path| {
            let rows = if new_records.is_empty() {
                &all
            } else {
                &new_records
            };
            write_csv(path, rows)
        });

        if let Some(store) = store {
            if !new_records.is_empty() {
                let stats = create_records(store, &new_records);
                summary.created = stats.created;
                summary.failed = stats.failed;
            }
        }

        summary.exported = export.transpose()?;
        Ok(summary)
    }
}
