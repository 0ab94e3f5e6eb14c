use super::{Filter, FilterKind};
use crate::codec::{truncate_millis, Raw, Shape};
use crate::error::ValidationError;
use crate::query::QuerySource;
use chrono::NaiveTime;
use docfilter_ast::{Condition, Fragment, Lookup, Params, Value, LOOKUP_SEP, RAW_QUERY_KEY};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// A filter template attached to a name within one filter set.
///
/// `key` is what the filter reads from the query (the name override if the template
/// has one, otherwise the binding name). `path` is the stored attribute it compares
/// against (the source override split on `.`, otherwise the key).
#[derive(Debug, Clone)]
pub struct BoundFilter {
    name: String,
    key: String,
    path: Vec<String>,
    filter: Arc<Filter>,
}

fn target_of(dotted: &str) -> String { dotted.split('.').collect::<Vec<_>>().join(LOOKUP_SEP) }

impl BoundFilter {
    pub(super) fn new(name: &str, filter: Arc<Filter>) -> Self {
        let key = filter.name().unwrap_or(name).to_string();
        let path = filter.source().unwrap_or(&key).split('.').map(str::to_string).collect();
        Self { name: name.to_string(), key, path, filter }
    }

    /// The name the filter is registered under
    pub fn name(&self) -> &str { &self.name }

    /// The query key the filter reads
    pub fn key(&self) -> &str { &self.key }

    pub fn path(&self) -> &[String] { &self.path }

    /// The compiled target key stem, e.g. `bar__baz` for source `bar.baz`
    pub fn target(&self) -> String { self.path.join(LOOKUP_SEP) }

    pub fn filter(&self) -> &Arc<Filter> { &self.filter }

    /// Extract this filter's raw input. Empty strings are dropped, and an empty
    /// sequence or group is absent.
    pub fn extract_raw<Q: QuerySource + ?Sized>(&self, query: &Q) -> Option<Raw> {
        match self.filter.codec().shape() {
            Shape::Single => query.get_one(&self.key).filter(|value| !value.is_empty()).map(Raw::One),
            Shape::Sequence => {
                let values: Vec<String> = query.get_all(&self.key).into_iter().filter(|value| !value.is_empty()).collect();
                (!values.is_empty()).then_some(Raw::Many(values))
            }
            Shape::Group => {
                let group: BTreeMap<String, String> = query.get_group(&self.key).into_iter().filter(|(_, value)| !value.is_empty()).collect();
                (!group.is_empty()).then_some(Raw::Group(group))
            }
        }
    }

    /// Extract and decode this filter's value. Missing input, and input that decodes to
    /// null, is `Ok(None)`.
    pub fn parse_value<Q: QuerySource + ?Sized>(&self, query: &Q) -> Result<Option<Value>, ValidationError> {
        let Some(raw) = self.extract_raw(query) else {
            return Ok(None);
        };
        match self.filter.codec().decode(&raw) {
            Ok(Value::Null) => Ok(None),
            Ok(value) => Ok(Some(value)),
            Err(source) => Err(ValidationError { field: self.key.clone(), value: raw.to_string(), source }),
        }
    }

    /// Compile a parsed value into a predicate fragment. An absent value compiles to
    /// the empty fragment.
    pub fn compile(&self, value: Option<&Value>) -> Fragment {
        let Some(value) = value.filter(|value| !value.is_null()) else {
            return Fragment::empty();
        };
        let target = self.target();
        let lookup = self.filter.lookup();

        match self.filter.kind() {
            FilterKind::DateTime => match value {
                Value::DateTime(datetime) => Params::new().with(&target, lookup, truncate_millis(*datetime)).into(),
                other => Params::new().with(&target, lookup, other.clone()).into(),
            },
            FilterKind::Date => self.compile_date(&target, value),
            FilterKind::Reference => {
                let mut raw = BTreeMap::new();
                raw.insert(format!("{}.$id", self.path.join(".")), value.clone());
                Params::new().with(RAW_QUERY_KEY, None, Value::Map(raw)).into()
            }
            FilterKind::Range { lower, upper, collapse } => compile_range(&target, value, *lower, *upper, *collapse),
            FilterKind::RangeIntersection { low, high } => compile_intersection(&target_of(low), &target_of(high), value),
            _ => Params::new().with(&target, lookup, value.clone()).into(),
        }
    }

    /// `gte` the start of the day and `lt` the start of the next. The date codec never
    /// yields the last representable date; given one directly, only the lower bound is
    /// emitted.
    fn compile_date(&self, target: &str, value: &Value) -> Fragment {
        let date = match value {
            Value::Date(date) => *date,
            Value::DateTime(datetime) => datetime.date(),
            other => {
                warn!(filter = %self.name, value = %other, "date filter given a non-date value");
                return Fragment::empty();
            }
        };
        let mut params = Params::new().with(target, Some(Lookup::Gte), date.and_time(NaiveTime::MIN));
        if let Some(next) = date.succ_opt() {
            params.insert(target, Some(Lookup::Lt), next.and_time(NaiveTime::MIN));
        }
        params.into()
    }
}

fn bound<'a>(value: &'a Value, key: &str) -> Option<&'a Value> { value.get_path(&[key]).filter(|bound| !bound.is_null()) }

fn compile_range(target: &str, value: &Value, lower: Lookup, upper: Lookup, collapse: bool) -> Fragment {
    let (min, max) = (bound(value, "min"), bound(value, "max"));
    if collapse {
        if let (Some(min), Some(max)) = (min, max) {
            if min == max {
                return Params::new().with(target, None, min.clone()).into();
            }
        }
    }
    let mut params = Params::new();
    if let Some(min) = min {
        params.insert(target, Some(lower), min.clone());
    }
    if let Some(max) = max {
        params.insert(target, Some(upper), max.clone());
    }
    params.into()
}

/// `(low missing or low <= max) and (high missing or high >= min)`, omitting the side
/// whose query bound was not given.
fn compile_intersection(low: &str, high: &str, value: &Value) -> Fragment {
    let mut conjuncts = Vec::new();
    if let Some(max) = bound(value, "max") {
        conjuncts.push(Condition::or([
            Condition::from(Params::new().with(low, Some(Lookup::Exists), false)),
            Condition::from(Params::new().with(low, Some(Lookup::Lte), max.clone())),
        ]));
    }
    if let Some(min) = bound(value, "min") {
        conjuncts.push(Condition::or([
            Condition::from(Params::new().with(high, Some(Lookup::Exists), false)),
            Condition::from(Params::new().with(high, Some(Lookup::Gte), min.clone())),
        ]));
    }
    if conjuncts.is_empty() {
        return Fragment::empty();
    }
    Condition::and(conjuncts).into()
}
