use crate::filter::{BoundFilter, Filter};
use crate::schema::DocumentSchema;
use std::sync::Arc;

/// The ordered set of named filter templates a filter set is built from.
///
/// Order is significant: filters are parsed and applied in registry order.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    filters: Vec<(String, Arc<Filter>)>,
    document: Option<Arc<DocumentSchema>>,
}

impl Registry {
    pub fn new() -> Self { Self::default() }

    /// A registry of the given filters, ordered by when each filter was constructed.
    pub fn declare<N: Into<String>>(declared: impl IntoIterator<Item = (N, Filter)>) -> Self { Self::inherit(&[], declared) }

    /// Merge parent registries with this level's own declarations.
    ///
    /// Entries are concatenated, parents in the order given and then the own
    /// declarations (sorted by construction order). A name that occurs more than once
    /// keeps the position of its first occurrence and the filter of its last.
    pub fn inherit<N: Into<String>>(parents: &[&Registry], declared: impl IntoIterator<Item = (N, Filter)>) -> Self {
        let mut own: Vec<(String, Arc<Filter>)> = declared.into_iter().map(|(name, filter)| (name.into(), Arc::new(filter))).collect();
        own.sort_by_key(|(_, filter)| filter.creation_order());

        let combined = parents.iter().flat_map(|parent| parent.filters.iter().cloned()).chain(own);
        let document = parents.iter().rev().find_map(|parent| parent.document.clone());
        Self { filters: merge(combined), document }
    }

    pub(crate) fn from_entries(entries: impl IntoIterator<Item = (String, Arc<Filter>)>) -> Self {
        Self { filters: merge(entries), document: None }
    }

    /// Record the document type this registry's filters were derived for
    pub fn with_document(mut self, document: impl Into<Arc<DocumentSchema>>) -> Self {
        self.document = Some(document.into());
        self
    }

    pub fn document(&self) -> Option<&DocumentSchema> { self.document.as_deref() }

    pub fn get(&self, name: &str) -> Option<&Arc<Filter>> { self.filters.iter().find(|(n, _)| n == name).map(|(_, filter)| filter) }

    pub fn contains(&self, name: &str) -> bool { self.get(name).is_some() }

    pub fn names(&self) -> impl Iterator<Item = &str> { self.filters.iter().map(|(name, _)| name.as_str()) }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<Filter>)> { self.filters.iter().map(|(name, filter)| (name.as_str(), filter)) }

    pub fn len(&self) -> usize { self.filters.len() }

    pub fn is_empty(&self) -> bool { self.filters.is_empty() }

    /// Bind every filter to its registered name, in order
    pub fn bind(&self) -> Vec<BoundFilter> { self.filters.iter().map(|(name, filter)| filter.bind(name)).collect() }
}

fn merge(entries: impl IntoIterator<Item = (String, Arc<Filter>)>) -> Vec<(String, Arc<Filter>)> {
    let mut merged: Vec<(String, Arc<Filter>)> = Vec::new();
    for (name, filter) in entries {
        match merged.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = filter,
            None => merged.push((name, filter)),
        }
    }
    merged
}
