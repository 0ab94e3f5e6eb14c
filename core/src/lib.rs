//! # docfilter
//!
//! Declarative filters that turn flat, multi-valued query parameters into document
//! store predicates.
//!
//! A [`Registry`] holds named [`Filter`] templates, declared by hand or derived from a
//! [`DocumentSchema`] by an [`Introspector`]. A [`Filterset`] binds a registry to one
//! request's query data, decodes each filter's value with its codec and folds the
//! compiled [`Fragment`]s into a [`Queryset`].
//!
//! ```
//! use docfilter::{Document, Filter, Filterset, MemoryQueryset, QueryDict, Registry};
//!
//! let registry = Registry::declare([
//!     ("foo", Filter::char().build()?),
//!     ("bar", Filter::integer().named("babar").build()?),
//! ]);
//! let documents = vec![
//!     Document::new("Sample").set("foo", "Foo").set("babar", 123),
//!     Document::new("Sample").set("foo", "Foo").set("babar", 456),
//! ];
//!
//! let filterset = Filterset::new(registry, QueryDict::parse("foo=Foo&babar=123"));
//! let queryset = filterset.filter_queryset(MemoryQueryset::new(documents))?;
//! assert_eq!(queryset.fragments().len(), 2);
//! assert_eq!(queryset.evaluate()?.len(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod codec;
pub mod error;
pub mod filter;
pub mod filterset;
pub mod introspect;
pub mod memory;
pub mod query;
pub mod queryset;
pub mod registry;
pub mod schema;
pub mod selection;
pub mod type_resolver;

pub use error::{ConfigurationError, FilterError, ValidationError};
pub use filter::{BoundFilter, Filter, FilterBuilder, FilterKind, FilterOptions};
pub use filterset::{Filterset, QueryValues};
pub use introspect::Introspector;
pub use memory::{Document, MemoryQueryset};
pub use query::{QueryDict, QuerySource};
pub use queryset::Queryset;
pub use registry::Registry;
pub use schema::{DocumentSchema, FieldType, SchemaField};
pub use type_resolver::FilterMapping;

pub use docfilter_ast as ast;
pub use docfilter_ast::{Condition, Fragment, Lookup, Params, Value};
