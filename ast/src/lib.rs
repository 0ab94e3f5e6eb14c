//! Value model, lookup operators and predicate fragments shared by docfilter and its backends.

pub mod ast;
pub mod error;
pub mod lookup;
pub mod value;

pub use ast::{Condition, Fragment, Params, RAW_QUERY_KEY};
pub use lookup::{lookup_key, split_key, Lookup, LOOKUP_SEP};
pub use value::{Value, ValueType};
