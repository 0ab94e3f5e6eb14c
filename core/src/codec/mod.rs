//! Codecs turn raw query strings into native [`Value`]s.
//!
//! Every filter owns exactly one codec. The codec's [`Shape`] decides how the filter
//! extracts raw input from a query source: a single string, every occurrence of a key,
//! or a group of `name.suffix` keys.

mod compound;
mod scalar;
mod temporal;

pub use compound::{DictCodec, GeoPointCodec, ListCodec};
pub use scalar::{BooleanCodec, CharCodec, FloatCodec, IntegerCodec, ObjectIdCodec, UuidCodec};
pub use temporal::{truncate_millis, DateCodec, DateTimeCodec};

use docfilter_ast::Value;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// How a codec expects its raw input to be extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// The last value given for the key
    Single,
    /// Every value given for the key, in order
    Sequence,
    /// Every `key.suffix` entry, keyed by suffix
    Group,
}

/// Raw, undecoded query input for one filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Raw {
    One(String),
    Many(Vec<String>),
    Group(BTreeMap<String, String>),
}

impl Raw {
    /// The single string, or `ExpectedSingle` for sequences and groups.
    pub fn single(&self) -> Result<&str, CodecError> {
        match self {
            Raw::One(value) => Ok(value),
            Raw::Many(values) if values.len() == 1 => Ok(&values[0]),
            _ => Err(CodecError::ExpectedSingle),
        }
    }
}

impl fmt::Display for Raw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Raw::One(value) => f.write_str(value),
            Raw::Many(values) => write!(f, "[{}]", values.join(", ")),
            Raw::Group(group) => {
                write!(f, "{{")?;
                for (i, (key, value)) in group.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("{value:?} is not a valid {expected}")]
    Invalid { value: String, expected: &'static str },

    #[error("value may not be blank")]
    Blank,

    #[error("expected a single value")]
    ExpectedSingle,

    #[error("expected a list of values")]
    ExpectedList,

    #[error("expected a mapping of values")]
    ExpectedMap,

    #[error("unexpected keys {0:?}")]
    InvalidKeys(Vec<String>),

    #[error("missing required keys {0:?}")]
    MissingKeys(Vec<String>),

    #[error("{key}: {source}")]
    Item { key: String, source: Box<CodecError> },
}

impl CodecError {
    pub(crate) fn invalid(value: &str, expected: &'static str) -> Self { CodecError::Invalid { value: value.to_string(), expected } }

    pub(crate) fn item(key: impl ToString, source: CodecError) -> Self { CodecError::Item { key: key.to_string(), source: Box::new(source) } }
}

/// Decodes raw query input into a native value.
///
/// A codec may return [`Value::Null`] for input that explicitly means "no value"
/// (the boolean codec does this for `null`); such a value is treated as absent.
pub trait Codec: fmt::Debug + Send + Sync {
    fn shape(&self) -> Shape { Shape::Single }

    fn decode(&self, raw: &Raw) -> Result<Value, CodecError>;
}
