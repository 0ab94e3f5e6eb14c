use bson::oid::ObjectId;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::Display;
use uuid::Uuid;

/// A native value produced by decoding query input, and compared against stored attributes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, PartialOrd)]
pub enum Value {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    String(String),
    DateTime(NaiveDateTime),
    Date(NaiveDate),
    ObjectId(ObjectId),
    Uuid(Uuid),
    List(Vec<Value>),
    /// Compound value: ranges (`min`/`max`), GeoJSON points, raw sub-queries
    Map(BTreeMap<String, Value>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Null,
    Bool,
    I64,
    F64,
    String,
    DateTime,
    Date,
    ObjectId,
    Uuid,
    List,
    Map,
}

impl ValueType {
    pub fn of(v: &Value) -> Self {
        match v {
            Value::Null => ValueType::Null,
            Value::Bool(_) => ValueType::Bool,
            Value::I64(_) => ValueType::I64,
            Value::F64(_) => ValueType::F64,
            Value::String(_) => ValueType::String,
            Value::DateTime(_) => ValueType::DateTime,
            Value::Date(_) => ValueType::Date,
            Value::ObjectId(_) => ValueType::ObjectId,
            Value::Uuid(_) => ValueType::Uuid,
            Value::List(_) => ValueType::List,
            Value::Map(_) => ValueType::Map,
        }
    }

    pub fn is_numeric(self) -> bool { matches!(self, ValueType::I64 | ValueType::F64) }
}

impl Value {
    /// A GeoJSON point: `{type: "Point", coordinates: [lng, lat]}`
    pub fn point(lng: f64, lat: f64) -> Self {
        let mut map = BTreeMap::new();
        map.insert("type".to_string(), Value::String("Point".to_string()));
        map.insert("coordinates".to_string(), Value::List(vec![Value::F64(lng), Value::F64(lat)]));
        Value::Map(map)
    }

    /// Read `[lng, lat]` back out of a GeoJSON point or a bare coordinate pair.
    pub fn as_point(&self) -> Option<(f64, f64)> {
        let coordinates = match self {
            Value::Map(map) => {
                if map.get("type") != Some(&Value::String("Point".to_string())) {
                    return None;
                }
                map.get("coordinates")?
            }
            list @ Value::List(_) => list,
            _ => return None,
        };
        match coordinates {
            Value::List(pair) if pair.len() == 2 => Some((pair[0].as_f64()?, pair[1].as_f64()?)),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::I64(i) => Some(*i as f64),
            Value::F64(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool { matches!(self, Value::Null) }

    /// Walk nested maps along `path`. Returns None when any step is missing.
    pub fn get_path<S: AsRef<str>>(&self, path: &[S]) -> Option<&Value> {
        let mut current = self;
        for step in path {
            current = current.as_map()?.get(step.as_ref())?;
        }
        Some(current)
    }

    /// Compare two values the way a document store orders them within one type bracket.
    ///
    /// Integers and floats compare across each other; any other mix of types is unordered.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        let left_type = ValueType::of(self);
        let right_type = ValueType::of(other);

        if left_type == right_type {
            return self.partial_cmp(other);
        }

        if left_type.is_numeric() && right_type.is_numeric() {
            return self.as_f64()?.partial_cmp(&other.as_f64()?);
        }

        None
    }

    /// Equality with numeric-family casting (`5 == 5.0`)
    pub fn loosely_eq(&self, other: &Value) -> bool { self.compare(other) == Some(Ordering::Equal) }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(bool) => write!(f, "{:?}", bool),
            Value::I64(int) => write!(f, "{:?}", int),
            Value::F64(float) => write!(f, "{:?}", float),
            Value::String(string) => write!(f, "{:?}", string),
            Value::DateTime(datetime) => write!(f, "{}", datetime.format("%Y-%m-%dT%H:%M:%S%.f")),
            Value::Date(date) => write!(f, "{}", date),
            Value::ObjectId(oid) => write!(f, "ObjectId({})", oid.to_hex()),
            Value::Uuid(uuid) => write!(f, "{}", uuid),
            Value::List(list) => {
                write!(f, "[")?;
                for (i, item) in list.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, item)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, item)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self { Value::Bool(value) }
}
impl From<i32> for Value {
    fn from(value: i32) -> Self { Value::I64(value as i64) }
}
impl From<i64> for Value {
    fn from(value: i64) -> Self { Value::I64(value) }
}
impl From<f64> for Value {
    fn from(value: f64) -> Self { Value::F64(value) }
}
impl From<&str> for Value {
    fn from(value: &str) -> Self { Value::String(value.to_string()) }
}
impl From<String> for Value {
    fn from(value: String) -> Self { Value::String(value) }
}
impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self { Value::DateTime(value) }
}
impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self { Value::Date(value) }
}
impl From<ObjectId> for Value {
    fn from(value: ObjectId) -> Self { Value::ObjectId(value) }
}
impl From<Uuid> for Value {
    fn from(value: Uuid) -> Self { Value::Uuid(value) }
}
impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self { Value::List(value.into_iter().map(Into::into).collect()) }
}

/// Convert JSON into a Value. An object of the single key `$oid` becomes an ObjectId,
/// mirroring extended JSON.
impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::I64(i)
                } else if let Some(f) = n.as_f64() {
                    Value::F64(f)
                } else {
                    Value::String(n.to_string())
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(object) => {
                if object.len() == 1 {
                    if let Some(serde_json::Value::String(hex)) = object.get("$oid") {
                        if let Ok(oid) = ObjectId::parse_str(hex) {
                            return Value::ObjectId(oid);
                        }
                    }
                }
                Value::Map(object.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}
