//! Error types for docfilter.
//!
//! `ConfigurationError` is raised while filters and registries are being set up and
//! never at request time. `ValidationError` is raised while parsing one request's query
//! data. `FilterError` is what applying a filter set to a queryset returns.

use crate::codec::CodecError;
use crate::schema::FieldType;
use docfilter_ast::{error::LookupError, Lookup};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("invalid lookup {lookup} for {kind} filter")]
    InvalidLookup { kind: &'static str, lookup: String },

    #[error("invalid range bounds ({lower}, {upper}): lower must be gt/gte and upper lt/lte")]
    InvalidRangeBounds { lower: Lookup, upper: Lookup },

    #[error(transparent)]
    UnknownLookup(#[from] LookupError),

    #[error("{kind} filter does not take the {option} option")]
    UnsupportedOption { kind: &'static str, option: &'static str },

    #[error("field policy may name included fields or excluded fields, not both")]
    ConflictingFieldPolicy,

    #[error("field {field:?} is not defined on document {document}")]
    UnknownField { document: String, field: String },

    #[error(
        "no filter mapping for field {field:?} of type {field_type:?}; exclude the field, declare a filter for it, or extend the mapping"
    )]
    UnmappedField { field: String, field_type: FieldType },

    #[error("collection field {field:?} does not declare an element type")]
    MissingElementType { field: String },
}

/// A query value could not be decoded by its filter
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid value {value:?} for filter {field:?}: {source}")]
pub struct ValidationError {
    pub field: String,
    pub value: String,
    #[source]
    pub source: CodecError,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("filter set for document {expected} applied to a queryset of {actual}")]
    BackendMismatch { expected: String, actual: String },
}
