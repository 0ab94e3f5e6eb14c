use crate::lookup::{lookup_key, Lookup};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key under which a fragment carries a raw, backend-native sub-query.
pub const RAW_QUERY_KEY: &str = "__raw__";

/// A flat mapping of compiled target key (path plus optional lookup suffix) to value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Params(BTreeMap<String, Value>);

impl Params {
    pub fn new() -> Self { Self::default() }

    pub fn with(mut self, target: &str, lookup: Option<Lookup>, value: impl Into<Value>) -> Self {
        self.insert(target, lookup, value);
        self
    }

    pub fn insert(&mut self, target: &str, lookup: Option<Lookup>, value: impl Into<Value>) {
        self.0.insert(lookup_key(target, lookup), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> { self.0.get(key) }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> { self.0.iter() }

    pub fn len(&self) -> usize { self.0.len() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Params {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self { Params(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect()) }
}

impl IntoIterator for Params {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter { self.0.into_iter() }
}

/// Boolean combinator over flat mappings, for predicates that relate separate attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    Match(Params),
    And(Vec<Condition>),
    Or(Vec<Condition>),
}

impl Condition {
    pub fn and(conditions: impl IntoIterator<Item = Condition>) -> Self { Condition::And(conditions.into_iter().collect()) }

    pub fn or(conditions: impl IntoIterator<Item = Condition>) -> Self { Condition::Or(conditions.into_iter().collect()) }

    pub fn is_empty(&self) -> bool {
        match self {
            Condition::Match(params) => params.is_empty(),
            Condition::And(conditions) | Condition::Or(conditions) => conditions.iter().all(Condition::is_empty),
        }
    }
}

impl From<Params> for Condition {
    fn from(params: Params) -> Self { Condition::Match(params) }
}

/// A unit of compiled filtering logic, folded into a queryset one at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Fragment {
    Params(Params),
    Condition(Condition),
}

impl Fragment {
    pub fn empty() -> Self { Fragment::Params(Params::new()) }

    pub fn is_empty(&self) -> bool {
        match self {
            Fragment::Params(params) => params.is_empty(),
            Fragment::Condition(condition) => condition.is_empty(),
        }
    }

    pub fn as_params(&self) -> Option<&Params> {
        match self {
            Fragment::Params(params) => Some(params),
            Fragment::Condition(_) => None,
        }
    }
}

impl From<Params> for Fragment {
    fn from(params: Params) -> Self { Fragment::Params(params) }
}

impl From<Condition> for Fragment {
    fn from(condition: Condition) -> Self { Fragment::Condition(condition) }
}
