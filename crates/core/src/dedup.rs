// ABOUTME: Deduplication of extracted records against identities already in the store.
// ABOUTME: Exact External ID membership is the only test; input order is preserved.

use std::collections::HashSet;

use crate::models::Record;

/// External IDs already present in the destination store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownIds(HashSet<String>);

impl KnownIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.0.insert(id.into())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for KnownIds {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>> Extend<S> for KnownIds {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.0.extend(iter.into_iter().map(Into::into));
    }
}

/// Returns the records whose External ID is not in `known`, in input order.
pub fn filter_new(records: &[Record], known: &KnownIds) -> Vec<Record> {
    records
        .iter()
        .filter(|r| !known.contains(&r.external_id))
        .cloned()
        .collect()
}
