//! A registry bound to one request's query data.

use crate::error::{FilterError, ValidationError};
use crate::filter::BoundFilter;
use crate::query::QuerySource;
use crate::queryset::Queryset;
use crate::registry::Registry;
use docfilter_ast::{Fragment, Value};
use std::cell::OnceCell;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Parsed query values, keyed by filter name, in registry order. Filters whose input
/// was absent have no entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryValues(Vec<(String, Value)>);

impl QueryValues {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> { self.0.iter().find(|(n, _)| n == name).map(|(_, value)| value) }

    pub fn names(&self) -> impl Iterator<Item = &str> { self.0.iter().map(|(name, _)| name.as_str()) }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> { self.0.iter().map(|(name, value)| (name.as_str(), value)) }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for QueryValues {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut values = QueryValues::new();
        for (name, value) in iter {
            values.insert(name, value);
        }
        values
    }
}

/// Every filter of a registry, bound and paired with one request's query data.
///
/// Parsing is memoised: the first call to [`Filterset::parse_values`] decodes the
/// query data and later calls return the same result.
#[derive(Debug)]
pub struct Filterset<S> {
    registry: Arc<Registry>,
    filters: Vec<BoundFilter>,
    query: S,
    values: OnceCell<Result<QueryValues, ValidationError>>,
}

impl<S: QuerySource> Filterset<S> {
    pub fn new(registry: impl Into<Arc<Registry>>, query: S) -> Self {
        let registry = registry.into();
        let filters = registry.bind();
        debug!(filters = filters.len(), document = registry.document().map(|document| document.name.as_str()), "bound filter set");
        Self { registry, filters, query, values: OnceCell::new() }
    }

    pub fn registry(&self) -> &Registry { &self.registry }

    /// Bound filters in registry order
    pub fn filters(&self) -> &[BoundFilter] { &self.filters }

    pub fn get(&self, name: &str) -> Option<&BoundFilter> { self.filters.iter().find(|filter| filter.name() == name) }

    pub fn query(&self) -> &S { &self.query }

    /// Decode every filter's input. The first invalid input aborts parsing.
    pub fn parse_values(&self) -> Result<&QueryValues, ValidationError> {
        self.values.get_or_init(|| self.parse_all()).as_ref().map_err(Clone::clone)
    }

    fn parse_all(&self) -> Result<QueryValues, ValidationError> {
        let mut values = QueryValues::new();
        for filter in &self.filters {
            match filter.parse_value(&self.query) {
                Ok(Some(value)) => {
                    debug!(filter = filter.name(), key = filter.key(), %value, "parsed query value");
                    values.insert(filter.name(), value);
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(filter = filter.name(), error = %err, "query value failed validation");
                    return Err(err);
                }
            }
        }
        Ok(values)
    }

    /// Compiled fragments of every filter with a parsed value, in registry order
    pub fn fragments(&self) -> Result<Vec<(&str, Fragment)>, ValidationError> {
        let values = self.parse_values()?;
        Ok(self.compile(values).collect())
    }

    fn compile<'a>(&'a self, values: &'a QueryValues) -> impl Iterator<Item = (&'a str, Fragment)> + 'a {
        self.filters
            .iter()
            .map(move |filter| (filter.name(), filter.compile(values.get(filter.name()))))
            .filter(|(_, fragment)| !fragment.is_empty())
    }

    /// Parse the query data and narrow `queryset` by every filter that received a value.
    pub fn filter_queryset<Q: Queryset>(&self, queryset: Q) -> Result<Q, FilterError> {
        self.check_document(&queryset)?;
        let values = self.parse_values()?;
        Ok(self.fold(queryset, values))
    }

    /// Narrow `queryset` by explicitly supplied values instead of the query data.
    /// Filters without a value in `values` are skipped.
    pub fn apply_values<Q: Queryset>(&self, queryset: Q, values: &QueryValues) -> Result<Q, FilterError> {
        self.check_document(&queryset)?;
        Ok(self.fold(queryset, values))
    }

    fn fold<Q: Queryset>(&self, queryset: Q, values: &QueryValues) -> Q {
        self.compile(values).fold(queryset, |queryset, (name, fragment)| {
            trace!(filter = name, ?fragment, "narrowing queryset");
            queryset.filter(&fragment)
        })
    }

    fn check_document<Q: Queryset>(&self, queryset: &Q) -> Result<(), FilterError> {
        let (Some(expected), Some(actual)) = (self.registry.document(), queryset.document()) else {
            return Ok(());
        };
        if actual.is_a(&expected.name) {
            return Ok(());
        }
        warn!(expected = %expected.name, actual = %actual.name, "filter set applied to an incompatible queryset");
        Err(FilterError::BackendMismatch { expected: expected.name.clone(), actual: actual.name.clone() })
    }
}
