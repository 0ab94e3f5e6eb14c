//! Resolution of document field types to filter constructors.
//!
//! A [`FilterMapping`] is consulted by schema introspection for every field it needs to
//! synthesize a filter for. Resolution tries the field's own type, then each of its
//! fallbacks (`Email` falls back to `String`, `SortedList` to `List`, ...). Collection
//! fields resolve through their element type instead: a list of integers is filtered
//! with an integer filter, matching any element.

use crate::error::ConfigurationError;
use crate::filter::{Filter, FilterBuilder};
use crate::schema::{FieldType, SchemaField};
use std::collections::HashMap;

pub type FilterConstructor = fn() -> FilterBuilder;

#[derive(Debug, Clone)]
pub struct FilterMapping {
    table: HashMap<FieldType, FilterConstructor>,
}

impl Default for FilterMapping {
    fn default() -> Self {
        Self::empty()
            .with(FieldType::String, Filter::char)
            .with(FieldType::Int, Filter::integer)
            .with(FieldType::Long, Filter::integer)
            .with(FieldType::Sequence, Filter::integer)
            .with(FieldType::Float, Filter::float)
            .with(FieldType::Decimal, Filter::float)
            .with(FieldType::Boolean, Filter::boolean)
            .with(FieldType::DateTime, Filter::datetime)
            .with(FieldType::ObjectId, Filter::object_id)
            .with(FieldType::Reference, Filter::reference)
            .with(FieldType::Uuid, Filter::uuid)
            .with(FieldType::Point, Filter::geo_near)
    }
}

impl FilterMapping {
    pub fn empty() -> Self { Self { table: HashMap::new() } }

    pub fn with(mut self, field_type: FieldType, constructor: FilterConstructor) -> Self {
        self.insert(field_type, constructor);
        self
    }

    pub fn insert(&mut self, field_type: FieldType, constructor: FilterConstructor) { self.table.insert(field_type, constructor); }

    /// Add or override entries from `other`
    pub fn extend(&mut self, other: FilterMapping) { self.table.extend(other.table); }

    /// The constructor for `field_type`, trying its fallbacks in order
    pub fn resolve_type(&self, field_type: FieldType) -> Option<FilterConstructor> {
        std::iter::once(field_type).chain(field_type.fallbacks().iter().copied()).find_map(|candidate| self.table.get(&candidate).copied())
    }

    /// A filter builder for `field`, sourced from the field's own name.
    pub fn resolve(&self, field: &SchemaField) -> Result<FilterBuilder, ConfigurationError> {
        let field_type = if field.field_type.is_collection() {
            field.element.ok_or_else(|| ConfigurationError::MissingElementType { field: field.name.clone() })?
        } else {
            field.field_type
        };
        let constructor = self.resolve_type(field_type).filter(|_| !field_type.is_collection());
        let constructor = constructor.ok_or_else(|| ConfigurationError::UnmappedField { field: field.name.clone(), field_type })?;
        Ok(constructor().source(field.name.as_str()))
    }
}
