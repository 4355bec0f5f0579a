// ABOUTME: Static registry of named sources and resolution of a user's source selection.
// ABOUTME: Keys are canonical lowercase; lookups and selections are case-insensitive.

use crate::error::SelectionError;
use crate::source::{Extractor, ReleaseNotesPage};

/// Registered sources in registration order.
#[derive(Default)]
pub struct SourceRegistry {
    sources: Vec<(String, Box<dyn Extractor>)>,
}

impl SourceRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry of every built-in source.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(ReleaseNotesPage::chatgpt()));
        registry
    }

    /// Registers a source under its lowercased key, replacing any source with the same key.
    pub fn register(&mut self, source: Box<dyn Extractor>) {
        let key = source.key().to_lowercase();
        if let Some(slot) = self.sources.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = source;
        } else {
            self.sources.push((key, source));
        }
    }

    /// Looks up a source by name, ignoring case and surrounding whitespace.
    pub fn get(&self, name: &str) -> Option<&dyn Extractor> {
        let name = name.trim().to_lowercase();
        self.sources
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, s)| s.as_ref())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Resolves a comma-separated selection to sources.
    ///
    /// A blank selection means every registered source, in registration order.
    /// Otherwise sources come back in the order requested, each once. Any
    /// unregistered name fails the whole selection, naming all bad entries.
    pub fn resolve(&self, selection: &str) -> Result<Vec<&dyn Extractor>, SelectionError> {
        let names = parse_selection(selection);
        if names.is_empty() {
            return Ok(self.sources.iter().map(|(_, s)| s.as_ref()).collect());
        }

        let unknown: Vec<String> = names
            .iter()
            .filter(|n| self.get(n).is_none())
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(SelectionError { unknown });
        }

        Ok(names.iter().filter_map(|n| self.get(n)).collect())
    }
}

/// Splits a selection into trimmed, lowercased, de-duplicated names.
pub fn parse_selection(selection: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in selection.split(',') {
        let name = name.trim().to_lowercase();
        if !name.is_empty() && !names.contains(&name) {
            names.push(name);
        }
    }
    names
}
