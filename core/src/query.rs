//! Sources of raw query data.
//!
//! A [`QuerySource`] answers three questions about one request's query data: the
//! single value of a key, every value of a key, and the group of `key.suffix` entries.
//! [`QueryDict`] is the multi-valued form parsed from a URL query string; plain string
//! maps and JSON objects are supported as degenerate, mostly single-valued forms.

use std::collections::{BTreeMap, HashMap};
use std::convert::Infallible;
use std::str::FromStr;

pub trait QuerySource {
    /// The last value given for `key`
    fn get_one(&self, key: &str) -> Option<String>;

    /// Every value given for `key`, in order
    fn get_all(&self, key: &str) -> Vec<String>;

    /// Every `key.suffix` entry, keyed by suffix
    fn get_group(&self, key: &str) -> BTreeMap<String, String>;
}

impl<T: QuerySource + ?Sized> QuerySource for &T {
    fn get_one(&self, key: &str) -> Option<String> { (**self).get_one(key) }

    fn get_all(&self, key: &str) -> Vec<String> { (**self).get_all(key) }

    fn get_group(&self, key: &str) -> BTreeMap<String, String> { (**self).get_group(key) }
}

fn group_suffix<'a>(name: &'a str, key: &str) -> Option<&'a str> { name.strip_prefix(key)?.strip_prefix('.') }

/// Ordered, multi-valued query data, as decoded from `a=1&a=2&b.min=3`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryDict {
    entries: Vec<(String, String)>,
}

impl QueryDict {
    pub fn new() -> Self { Self::default() }

    /// Decode an `application/x-www-form-urlencoded` query string. A leading `?` is ignored.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self { entries: url::form_urlencoded::parse(query.as_bytes()).into_owned().collect() }
    }

    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) { self.entries.push((key.into(), value.into())); }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.append(key, value);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> { self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str())) }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

impl FromStr for QueryDict {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> { Ok(Self::parse(s)) }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryDict {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self { entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

impl QuerySource for QueryDict {
    fn get_one(&self, key: &str) -> Option<String> { self.entries.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v.clone()) }

    fn get_all(&self, key: &str) -> Vec<String> { self.entries.iter().filter(|(k, _)| k == key).map(|(_, v)| v.clone()).collect() }

    fn get_group(&self, key: &str) -> BTreeMap<String, String> {
        let mut group = BTreeMap::new();
        for (name, _) in &self.entries {
            if let Some(suffix) = group_suffix(name, key) {
                if !group.contains_key(suffix) {
                    if let Some(value) = self.get_one(name) {
                        group.insert(suffix.to_string(), value);
                    }
                }
            }
        }
        group
    }
}

impl QuerySource for HashMap<String, String> {
    fn get_one(&self, key: &str) -> Option<String> { self.get(key).cloned() }

    fn get_all(&self, key: &str) -> Vec<String> { self.get(key).cloned().into_iter().collect() }

    fn get_group(&self, key: &str) -> BTreeMap<String, String> {
        self.iter().filter_map(|(name, value)| Some((group_suffix(name, key)?.to_string(), value.clone()))).collect()
    }
}

impl QuerySource for BTreeMap<String, String> {
    fn get_one(&self, key: &str) -> Option<String> { self.get(key).cloned() }

    fn get_all(&self, key: &str) -> Vec<String> { self.get(key).cloned().into_iter().collect() }

    fn get_group(&self, key: &str) -> BTreeMap<String, String> {
        self.iter().filter_map(|(name, value)| Some((group_suffix(name, key)?.to_string(), value.clone()))).collect()
    }
}

/// Render a JSON scalar as query text. Null has no text; arrays and objects render as JSON.
fn json_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// JSON objects: arrays are sequences, nested objects are groups, scalars are rendered to text.
impl QuerySource for serde_json::Map<String, serde_json::Value> {
    fn get_one(&self, key: &str) -> Option<String> { self.get(key).and_then(json_text) }

    fn get_all(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            Some(serde_json::Value::Array(items)) => items.iter().filter_map(json_text).collect(),
            Some(value) => json_text(value).into_iter().collect(),
            None => Vec::new(),
        }
    }

    fn get_group(&self, key: &str) -> BTreeMap<String, String> {
        match self.get(key) {
            Some(serde_json::Value::Object(object)) => object.iter().filter_map(|(k, v)| Some((k.clone(), json_text(v)?))).collect(),
            _ => self.iter().filter_map(|(name, value)| Some((group_suffix(name, key)?.to_string(), json_text(value)?))).collect(),
        }
    }
}
