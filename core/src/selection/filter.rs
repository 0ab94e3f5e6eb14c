//! Evaluate compiled fragments against in-memory items with document store semantics.
//!
//! Equality and ordering match a stored list when any element matches. `ne` and `nin`
//! match items where the attribute is missing. Numbers compare across integer and float;
//! other types compare only with their own type. `near` matches items with a stored
//! point, within the `max_distance`/`min_distance` given for the same path.

use docfilter_ast::{split_key, Condition, Fragment, Lookup, Params, Value, LOOKUP_SEP, RAW_QUERY_KEY};
use std::cmp::Ordering;
use thiserror::Error;

/// Mean equatorial radius used for spherical distances
pub const EARTH_RADIUS_METERS: f64 = 6_378_100.0;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    #[error("lookup {0} is not supported in memory")]
    UnsupportedLookup(Lookup),
    #[error("{lookup} on {path} requires a near lookup on the same path")]
    MissingNear { path: String, lookup: Lookup },
    #[error("invalid operand for {key}: {value}")]
    InvalidOperand { key: String, value: String },
}

/// Items that fragments can be evaluated against
pub trait Filterable {
    fn collection(&self) -> &str;

    /// The value at a path of attribute names, None when any step is missing
    fn value(&self, path: &[&str]) -> Option<Value>;
}

impl<T: Filterable> Filterable for &T {
    fn collection(&self) -> &str { (**self).collection() }

    fn value(&self, path: &[&str]) -> Option<Value> { (**self).value(path) }
}

fn invalid(key: &str, value: &Value) -> EvalError { EvalError::InvalidOperand { key: key.to_string(), value: value.to_string() } }

/// Great-circle distance in metres between two `(lng, lat)` points
pub fn spherical_distance(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lat2) = (from.1.to_radians(), to.1.to_radians());
    let d_lat = (to.1 - from.1).to_radians();
    let d_lng = (to.0 - from.0).to_radians();
    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * a.sqrt().asin()
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Near {
    origin: Option<(f64, f64)>,
    max: Option<f64>,
    min: Option<f64>,
}

/// The `near` origins and distance bounds of a set of fragments, per path.
///
/// A queryset's fragments are collected together so that a `max_distance` applied by
/// one filter bounds the `near` applied by another.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Proximity {
    paths: Vec<(String, Near)>,
}

fn leaves<'a>(condition: &'a Condition, out: &mut Vec<&'a Params>) {
    match condition {
        Condition::Match(params) => out.push(params),
        Condition::And(conditions) | Condition::Or(conditions) => conditions.iter().for_each(|condition| leaves(condition, out)),
    }
}

impl Proximity {
    pub fn collect<'a>(fragments: impl IntoIterator<Item = &'a Fragment>) -> Result<Self, EvalError> {
        let mut params = Vec::new();
        for fragment in fragments {
            match fragment {
                Fragment::Params(p) => params.push(p),
                Fragment::Condition(condition) => leaves(condition, &mut params),
            }
        }

        let mut proximity = Proximity::default();
        for (key, value) in params.into_iter().flat_map(Params::iter) {
            let (path, Some(lookup)) = split_key(key) else { continue };
            match lookup {
                Lookup::Near | Lookup::NearSphere => {
                    proximity.entry(path.join(LOOKUP_SEP)).origin = Some(value.as_point().ok_or_else(|| invalid(key, value))?)
                }
                Lookup::MaxDistance => proximity.entry(path.join(LOOKUP_SEP)).max = Some(value.as_f64().ok_or_else(|| invalid(key, value))?),
                Lookup::MinDistance => proximity.entry(path.join(LOOKUP_SEP)).min = Some(value.as_f64().ok_or_else(|| invalid(key, value))?),
                _ => {}
            }
        }

        for (path, near) in &proximity.paths {
            if near.origin.is_none() {
                let lookup = if near.max.is_some() { Lookup::MaxDistance } else { Lookup::MinDistance };
                return Err(EvalError::MissingNear { path: path.replace(LOOKUP_SEP, "."), lookup });
            }
        }
        Ok(proximity)
    }

    fn entry(&mut self, path: String) -> &mut Near {
        let index = match self.paths.iter().position(|(existing, _)| *existing == path) {
            Some(index) => index,
            None => {
                self.paths.push((path, Near::default()));
                self.paths.len() - 1
            }
        };
        &mut self.paths[index].1
    }

    fn get(&self, path: &str) -> Option<&Near> { self.paths.iter().find(|(existing, _)| existing == path).map(|(_, near)| near) }

    pub fn is_empty(&self) -> bool { self.paths.is_empty() }

    /// Distance of `item` from the first `near` origin
    pub fn distance<I: Filterable>(&self, item: &I) -> Option<f64> {
        let (path, near) = self.paths.first()?;
        let segments: Vec<&str> = path.split(LOOKUP_SEP).collect();
        let point = item.value(&segments)?.as_point()?;
        Some(spherical_distance(near.origin?, point))
    }

    /// Order items nearest first. Items without a distance keep their relative order, last.
    pub fn sort<I: Filterable>(&self, items: &mut [I]) {
        if self.is_empty() {
            return;
        }
        items.sort_by(|a, b| match (self.distance(a), self.distance(b)) {
            (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
    }

    fn within(&self, path: &str, actual: Option<&Value>) -> bool {
        let Some(point) = actual.and_then(Value::as_point) else {
            return false;
        };
        let Some(near) = self.get(path) else {
            return true;
        };
        let Some(origin) = near.origin else {
            return false;
        };
        let distance = spherical_distance(origin, point);
        near.max.map_or(true, |max| distance <= max) && near.min.map_or(true, |min| distance >= min)
    }
}

fn matches_eq(actual: Option<&Value>, expected: &Value) -> bool {
    match actual {
        None => expected.is_null(),
        Some(Value::List(items)) if !matches!(expected, Value::List(_)) => items.iter().any(|item| item.loosely_eq(expected)),
        Some(value) => value.loosely_eq(expected),
    }
}

fn matches_ordering(actual: Option<&Value>, expected: &Value, lookup: Lookup) -> bool {
    let test = |value: &Value| match value.compare(expected) {
        Some(ordering) => match lookup {
            Lookup::Gt => ordering == Ordering::Greater,
            Lookup::Gte => ordering != Ordering::Less,
            Lookup::Lt => ordering == Ordering::Less,
            Lookup::Lte => ordering != Ordering::Greater,
            _ => false,
        },
        None => false,
    };
    match actual {
        None => false,
        Some(Value::List(items)) => items.iter().any(test),
        Some(value) => test(value),
    }
}

fn matches_in(actual: Option<&Value>, candidates: &[Value]) -> bool { candidates.iter().any(|candidate| matches_eq(actual, candidate)) }

fn matches_string(actual: Option<&Value>, expected: &Value, lookup: Lookup) -> bool {
    let Some(pattern) = expected.as_str() else {
        return matches!(lookup, Lookup::Exact) && matches_eq(actual, expected);
    };
    let test = |value: &Value| {
        let Some(text) = value.as_str() else {
            return false;
        };
        let (lower_text, lower_pattern) = (text.to_lowercase(), pattern.to_lowercase());
        match lookup {
            Lookup::Exact => text == pattern,
            Lookup::IExact => lower_text == lower_pattern,
            Lookup::Contains => text.contains(pattern),
            Lookup::IContains => lower_text.contains(&lower_pattern),
            Lookup::StartsWith => text.starts_with(pattern),
            Lookup::IStartsWith => lower_text.starts_with(&lower_pattern),
            Lookup::EndsWith => text.ends_with(pattern),
            Lookup::IEndsWith => lower_text.ends_with(&lower_pattern),
            _ => false,
        }
    };
    match actual {
        None => false,
        Some(Value::List(items)) => items.iter().any(test),
        Some(value) => test(value),
    }
}

/// Raw sub-query of dotted paths to expected values
fn evaluate_raw<I: Filterable>(item: &I, expected: &Value) -> Result<bool, EvalError> {
    let map = expected.as_map().ok_or_else(|| invalid(RAW_QUERY_KEY, expected))?;
    Ok(map.iter().all(|(dotted, value)| {
        let path: Vec<&str> = dotted.split('.').collect();
        matches_eq(item.value(&path).as_ref(), value)
    }))
}

fn evaluate_entry<I: Filterable>(item: &I, key: &str, expected: &Value, proximity: &Proximity) -> Result<bool, EvalError> {
    if key == RAW_QUERY_KEY {
        return evaluate_raw(item, expected);
    }
    let (path, lookup) = split_key(key);
    let actual = item.value(&path);
    let actual = actual.as_ref();

    Ok(match lookup {
        None => matches_eq(actual, expected),
        Some(Lookup::Ne) => !matches_eq(actual, expected),
        Some(lookup @ (Lookup::Gt | Lookup::Gte | Lookup::Lt | Lookup::Lte)) => matches_ordering(actual, expected, lookup),
        Some(Lookup::Exists) => match expected {
            Value::Bool(present) => actual.is_some() == *present,
            other => return Err(invalid(key, other)),
        },
        Some(lookup @ (Lookup::In | Lookup::Nin | Lookup::All)) => {
            let candidates = expected.as_list().ok_or_else(|| invalid(key, expected))?;
            match lookup {
                Lookup::In => matches_in(actual, candidates),
                Lookup::Nin => !matches_in(actual, candidates),
                _ => !candidates.is_empty() && candidates.iter().all(|candidate| matches_eq(actual, candidate)),
            }
        }
        Some(lookup) if lookup.is_string() => matches_string(actual, expected, lookup),
        Some(Lookup::Near | Lookup::NearSphere) => proximity.within(&path.join(LOOKUP_SEP), actual),
        // bounds are checked together with the near on the same path
        Some(Lookup::MaxDistance | Lookup::MinDistance) => true,
        Some(lookup) => return Err(EvalError::UnsupportedLookup(lookup)),
    })
}

fn evaluate_params<I: Filterable>(item: &I, params: &Params, proximity: &Proximity) -> Result<bool, EvalError> {
    for (key, expected) in params.iter() {
        if !evaluate_entry(item, key, expected, proximity)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn evaluate_condition<I: Filterable>(item: &I, condition: &Condition, proximity: &Proximity) -> Result<bool, EvalError> {
    match condition {
        Condition::Match(params) => evaluate_params(item, params, proximity),
        Condition::And(conditions) => {
            for condition in conditions {
                if !evaluate_condition(item, condition, proximity)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Condition::Or(conditions) => {
            for condition in conditions {
                if evaluate_condition(item, condition, proximity)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
    }
}

pub fn evaluate_fragment<I: Filterable>(item: &I, fragment: &Fragment, proximity: &Proximity) -> Result<bool, EvalError> {
    match fragment {
        Fragment::Params(params) => evaluate_params(item, params, proximity),
        Fragment::Condition(condition) => evaluate_condition(item, condition, proximity),
    }
}

#[derive(Debug, PartialEq)]
pub enum FilterResult<R> {
    Pass(R),
    Skip(R),
    Error(R, EvalError),
}

/// Evaluates every item against the conjunction of a set of fragments
pub struct FilterIterator<I> {
    iter: I,
    fragments: Vec<Fragment>,
    proximity: Proximity,
}

impl<I, R> FilterIterator<I>
where
    I: Iterator<Item = R>,
    R: Filterable,
{
    pub fn new(iter: I, fragments: Vec<Fragment>) -> Result<Self, EvalError> {
        let proximity = Proximity::collect(&fragments)?;
        Ok(Self { iter, fragments, proximity })
    }

    pub fn proximity(&self) -> &Proximity { &self.proximity }

    fn evaluate(&self, item: &R) -> Result<bool, EvalError> {
        for fragment in &self.fragments {
            if !evaluate_fragment(item, fragment, &self.proximity)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl<I, R> Iterator for FilterIterator<I>
where
    I: Iterator<Item = R>,
    R: Filterable,
{
    type Item = FilterResult<R>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.iter.next()?;
        Some(match self.evaluate(&item) {
            Ok(true) => FilterResult::Pass(item),
            Ok(false) => FilterResult::Skip(item),
            Err(e) => FilterResult::Error(item, e),
        })
    }
}
