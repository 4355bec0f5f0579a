// ABOUTME: End-to-end pipeline tests with an in-memory store and canned fetchers.
// ABOUTME: Covers idempotent re-runs, selection errors before I/O, fetch failures and store degradation.

use std::cell::{Cell, RefCell};

use pretty_assertions::assert_eq;
use relnotes_core::{
    encode_csv, FetchError, Fetcher, Pipeline, PipelineError, Record, RecordStore,
    ReleaseNotesPage, SourceRegistry, StoreError, StoredPage, StoredRecord,
};
use serde_json::{Map, Value};
use tempfile::TempDir;

const SCENARIO_A: &str = "<h2>March 1, 2024</h2><h3>Memory</h3><p>Feature X</p>";

/// Serves fixed markup and counts requests.
struct CannedFetcher {
    body: Result<String, String>,
    calls: Cell<usize>,
}

impl CannedFetcher {
    fn ok(body: &str) -> Self {
        Self {
            body: Ok(body.to_string()),
            calls: Cell::new(0),
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            body: Err(message.to_string()),
            calls: Cell::new(0),
        }
    }
}

impl Fetcher for CannedFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.calls.set(self.calls.get() + 1);
        match &self.body {
            Ok(body) => Ok(body.clone()),
            Err(message) => Err(FetchError::transport(url, message)),
        }
    }
}

/// In-memory record store.
#[derive(Default)]
struct MemoryStore {
    records: RefCell<Vec<StoredRecord>>,
    unreachable: bool,
    reject: Option<String>,
    listings: Cell<usize>,
}

impl MemoryStore {
    fn ids(&self) -> Vec<String> {
        self.records
            .borrow()
            .iter()
            .filter_map(|r| r.external_id().map(str::to_string))
            .collect()
    }
}

impl RecordStore for MemoryStore {
    fn pages(&self) -> Box<dyn Iterator<Item = Result<StoredPage, StoreError>> + '_> {
        self.listings.set(self.listings.get() + 1);
        if self.unreachable {
            return Box::new(std::iter::once(Err(StoreError::Http(
                "connection refused".into(),
            ))));
        }
        let pages: Vec<StoredPage> = self
            .records
            .borrow()
            .chunks(1)
            .map(|c| c.to_vec())
            .collect();
        Box::new(pages.into_iter().map(Ok))
    }

    fn create(&self, record: &Record) -> Result<(), StoreError> {
        if self.reject.as_deref() == Some(record.external_id.as_str()) {
            return Err(StoreError::Status {
                status: 422,
                body: "rejected".into(),
            });
        }
        let fields: Map<String, Value> = match serde_json::to_value(record) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        let mut records = self.records.borrow_mut();
        let id = format!("rec{}", records.len() + 1);
        records.push(StoredRecord { id, fields });
        Ok(())
    }
}

fn second_source() -> ReleaseNotesPage {
    ReleaseNotesPage {
        key: "other".into(),
        product: "Other".into(),
        url: "https://example.com/other-notes".into(),
        page_label: "Other Release Notes".into(),
        layout: Default::default(),
    }
}

#[test]
fn scenario_a_single_record() {
    let registry = SourceRegistry::builtin();
    let fetcher = CannedFetcher::ok(SCENARIO_A);
    let store = MemoryStore::default();
    let pipeline = Pipeline::builder(&registry, &fetcher)
        .store(&store)
        .build();

    let summary = pipeline.run("").unwrap();

    assert_eq!(summary.sources, vec!["chatgpt"]);
    assert_eq!(summary.extracted, 1);
    assert_eq!(summary.new_records, 1);
    assert_eq!(summary.created, 1);
    assert!(summary.store_used);

    let stored = store.records.borrow();
    let fields = &stored[0].fields;
    assert_eq!(fields["Product"], "ChatGPT");
    assert_eq!(fields["Feature name"], "Memory");
    assert_eq!(fields["Description"], "Feature X");
    assert_eq!(fields["Release date"], "2024-03-01");
    assert_eq!(fields["External ID"], "chatgpt-2024-03-01-Memory");
}

#[test]
fn scenario_b_second_run_finds_nothing_new() {
    let registry = SourceRegistry::builtin();
    let fetcher = CannedFetcher::ok(SCENARIO_A);
    let store = MemoryStore::default();
    let pipeline = Pipeline::builder(&registry, &fetcher)
        .store(&store)
        .build();

    let first = pipeline.run("chatgpt").unwrap();
    let second = pipeline.run("chatgpt").unwrap();

    assert_eq!(first.created, 1);
    assert_eq!(second.extracted, 1);
    assert_eq!(second.new_records, 0);
    assert_eq!(second.created, 0);
    assert_eq!(store.ids(), vec!["chatgpt-2024-03-01-Memory"]);
}

#[test]
fn idempotent_over_larger_page() {
    let html = r#"
        <article>
          <h2>March 1, 2024</h2>
          <h3>Memory</h3><p>Remembers things.</p><ul><li>Opt in</li></ul>
          <h3>Voice</h3>
          <h2>Coming Soon</h2>
          <h2>February 14, 2024</h2>
          <p>Intro text</p>
          <h3>GPT Store</h3><p>Browse GPTs.</p>
        </article>
    "#;
    let registry = SourceRegistry::builtin();
    let fetcher = CannedFetcher::ok(html);
    let store = MemoryStore::default();
    let pipeline = Pipeline::builder(&registry, &fetcher)
        .store(&store)
        .build();

    let first = pipeline.run("").unwrap();
    assert_eq!(first.created, 3);
    assert_eq!(
        store.ids(),
        vec![
            "chatgpt-2024-03-01-Memory",
            "chatgpt-2024-03-01-Voice",
            "chatgpt-2024-02-14-GPT Store",
        ]
    );

    let second = pipeline.run("").unwrap();
    assert_eq!(second.new_records, 0);
    assert_eq!(store.records.borrow().len(), 3);
}

#[test]
fn external_ids_are_stable_across_extractions() {
    let page = ReleaseNotesPage::chatgpt();
    let first: Vec<String> = page.parse(SCENARIO_A).into_iter().map(|r| r.external_id).collect();
    let second: Vec<String> = page.parse(SCENARIO_A).into_iter().map(|r| r.external_id).collect();
    assert_eq!(first, second);
}

#[test]
fn scenario_c_unknown_source_fails_before_io() {
    let registry = SourceRegistry::builtin();
    let fetcher = CannedFetcher::ok(SCENARIO_A);
    let store = MemoryStore::default();
    let pipeline = Pipeline::builder(&registry, &fetcher)
        .store(&store)
        .build();

    let err = pipeline.run("chatgpt,unknown").unwrap_err();

    match err {
        PipelineError::Selection(sel) => assert_eq!(sel.unknown, vec!["unknown"]),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(fetcher.calls.get(), 0);
    assert_eq!(store.listings.get(), 0);
}

#[test]
fn scenario_d_fetch_failure_is_not_fatal() {
    let registry = SourceRegistry::builtin();
    let fetcher = CannedFetcher::failing("timed out");
    let store = MemoryStore::default();
    let pipeline = Pipeline::builder(&registry, &fetcher)
        .store(&store)
        .build();

    let summary = pipeline.run("chatgpt").unwrap();

    assert_eq!(fetcher.calls.get(), 1);
    assert_eq!(summary.extracted, 0);
    assert_eq!(summary.created, 0);
    assert!(store.records.borrow().is_empty());
}

#[test]
fn failing_source_does_not_abort_siblings() {
    let mut registry = SourceRegistry::builtin();
    registry.register(Box::new(second_source()));

    let fetcher = |url: &str| -> Result<String, FetchError> {
        if url.contains("other-notes") {
            Ok("<h2>April 2, 2024</h2><h3>Thing</h3><p>Body</p>".to_string())
        } else {
            Err(FetchError::transport(url, "connection reset"))
        }
    };
    let store = MemoryStore::default();
    let pipeline = Pipeline::builder(&registry, &fetcher)
        .store(&store)
        .build();

    let summary = pipeline.run("").unwrap();

    assert_eq!(summary.sources, vec!["chatgpt", "other"]);
    assert_eq!(summary.extracted, 1);
    assert_eq!(store.ids(), vec!["other-2024-04-02-Thing"]);
}

#[test]
fn dedup_runs_across_merged_sources() {
    let mut registry = SourceRegistry::builtin();
    registry.register(Box::new(second_source()));
    let fetcher = CannedFetcher::ok(SCENARIO_A);
    let store = MemoryStore::default();
    store.records.borrow_mut().push(StoredRecord {
        id: "rec0".into(),
        fields: serde_json::from_str(r#"{"External ID": "other-2024-03-01-Memory"}"#).unwrap(),
    });
    let pipeline = Pipeline::builder(&registry, &fetcher)
        .store(&store)
        .build();

    let summary = pipeline.run("other, ChatGPT").unwrap();

    assert_eq!(summary.sources, vec!["other", "chatgpt"]);
    assert_eq!(summary.extracted, 2);
    assert_eq!(summary.new_records, 1);
    assert_eq!(
        store.ids(),
        vec!["other-2024-03-01-Memory", "chatgpt-2024-03-01-Memory"]
    );
}

#[test]
fn unreachable_store_degrades_to_local_export() {
    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("notes.csv");
    let registry = SourceRegistry::builtin();
    let fetcher = CannedFetcher::ok(SCENARIO_A);
    let store = MemoryStore {
        unreachable: true,
        ..Default::default()
    };
    let pipeline = Pipeline::builder(&registry, &fetcher)
        .store(&store)
        .csv_path(&csv_path)
        .build();

    let summary = pipeline.run("").unwrap();

    assert!(!summary.store_used);
    assert_eq!(summary.new_records, 1);
    assert_eq!(summary.exported, Some(1));
    assert_eq!(summary.created, 0);
    assert!(store.records.borrow().is_empty());

    let text = std::fs::read_to_string(&csv_path).unwrap();
    assert!(text.contains("chatgpt-2024-03-01-Memory"));
}

#[test]
fn rejected_record_is_counted_and_batch_continues() {
    let html = "<h2>March 1, 2024</h2><h3>A</h3><h3>B</h3><h3>C</h3>";
    let registry = SourceRegistry::builtin();
    let fetcher = CannedFetcher::ok(html);
    let store = MemoryStore {
        reject: Some("chatgpt-2024-03-01-B".into()),
        ..Default::default()
    };
    let pipeline = Pipeline::builder(&registry, &fetcher)
        .store(&store)
        .build();

    let summary = pipeline.run("").unwrap();

    assert_eq!(summary.created, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(
        store.ids(),
        vec!["chatgpt-2024-03-01-A", "chatgpt-2024-03-01-C"]
    );
}

#[test]
fn export_holds_new_records_only() {
    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("out.csv");
    let html = "<h2>March 1, 2024</h2><h3>A</h3><p>a</p><h3>B</h3><p>b</p>";
    let registry = SourceRegistry::builtin();
    let fetcher = CannedFetcher::ok(html);
    let store = MemoryStore::default();
    store.records.borrow_mut().push(StoredRecord {
        id: "rec0".into(),
        fields: serde_json::from_str(r#"{"External ID": "chatgpt-2024-03-01-A"}"#).unwrap(),
    });
    let pipeline = Pipeline::builder(&registry, &fetcher)
        .store(&store)
        .csv_path(&csv_path)
        .build();

    let summary = pipeline.run("").unwrap();

    assert_eq!(summary.exported, Some(1));
    let text = std::fs::read_to_string(&csv_path).unwrap();
    assert_eq!(text.lines().count(), 2);
    assert!(text.contains("chatgpt-2024-03-01-B"));
    assert!(!text.contains("chatgpt-2024-03-01-A"));
}

#[test]
fn export_falls_back_to_full_extraction_when_nothing_new() {
    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("out.csv");
    let registry = SourceRegistry::builtin();
    let fetcher = CannedFetcher::ok(SCENARIO_A);
    let store = MemoryStore::default();
    let pipeline = Pipeline::builder(&registry, &fetcher)
        .store(&store)
        .csv_path(&csv_path)
        .build();

    pipeline.run("").unwrap();
    let second = pipeline.run("").unwrap();

    assert_eq!(second.new_records, 0);
    assert_eq!(second.exported, Some(1));
    let expected = String::from_utf8(encode_csv(&ReleaseNotesPage::chatgpt().parse(SCENARIO_A)).unwrap())
        .unwrap();
    assert_eq!(std::fs::read_to_string(&csv_path).unwrap(), expected);
}

#[test]
fn export_with_no_records_still_has_header() {
    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("empty.csv");
    std::fs::write(&csv_path, "stale contents\n").unwrap();
    let registry = SourceRegistry::builtin();
    let fetcher = CannedFetcher::failing("dns error");
    let pipeline = Pipeline::builder(&registry, &fetcher)
        .csv_path(&csv_path)
        .build();

    let summary = pipeline.run("").unwrap();

    assert!(!summary.store_used);
    assert_eq!(summary.exported, Some(0));
    assert_eq!(
        std::fs::read_to_string(&csv_path).unwrap(),
        "Product,Feature name,Description,Release date,Source URL,Source page,External ID\n"
    );
}

#[test]
fn export_to_missing_directory_is_an_error() {
    let dir = TempDir::new().unwrap();
    let csv_path = dir.path().join("missing").join("out.csv");
    let registry = SourceRegistry::builtin();
    let fetcher = CannedFetcher::ok(SCENARIO_A);
    let store = MemoryStore::default();
    let pipeline = Pipeline::builder(&registry, &fetcher)
        .store(&store)
        .csv_path(csv_path)
        .build();

    let err = pipeline.run("").unwrap_err();

    assert!(matches!(err, PipelineError::Export(_)));
    // The store still received the record.
    assert_eq!(store.ids(), vec!["chatgpt-2024-03-01-Memory"]);
}
