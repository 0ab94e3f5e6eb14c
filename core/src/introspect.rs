//! Derive a registry from a document schema.
//!
//! The scope is either an explicit include list, or every field (the id field first)
//! minus an exclude list. Each field in scope gets the filter declared for it under the
//! same name, if any; otherwise one is synthesized from the field's type through a
//! [`FilterMapping`]. Declared filters whose names are not fields are kept after the
//! fields, in declaration order.

use crate::error::ConfigurationError;
use crate::filter::{Filter, FilterOptions};
use crate::registry::Registry;
use crate::schema::DocumentSchema;
use crate::type_resolver::FilterMapping;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Introspector {
    schema: Arc<DocumentSchema>,
    fields: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
    parents: Vec<Registry>,
    declared: Vec<(String, Filter)>,
    options: HashMap<String, FilterOptions>,
    mapping: FilterMapping,
}

impl Introspector {
    pub fn new(schema: impl Into<Arc<DocumentSchema>>) -> Self {
        Self {
            schema: schema.into(),
            fields: None,
            exclude: None,
            parents: Vec::new(),
            declared: Vec::new(),
            options: HashMap::new(),
            mapping: FilterMapping::default(),
        }
    }

    /// Only these fields, in this order
    pub fn fields<I: IntoIterator<Item = S>, S: Into<String>>(mut self, names: I) -> Self {
        self.fields = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Every field but these
    pub fn exclude<I: IntoIterator<Item = S>, S: Into<String>>(mut self, names: I) -> Self {
        self.exclude = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Inherit the filters of a parent registry
    pub fn inherit(mut self, parent: Registry) -> Self {
        self.parents.push(parent);
        self
    }

    /// Declare a filter explicitly. A declared filter named like a field replaces the
    /// synthesized one and is used verbatim.
    pub fn declare(mut self, name: impl Into<String>, filter: Filter) -> Self {
        self.declared.push((name.into(), filter));
        self
    }

    /// Construction options for the filter synthesized for `field`
    pub fn options(mut self, field: impl Into<String>, options: FilterOptions) -> Self {
        self.options.insert(field.into(), options);
        self
    }

    /// Add or override type mapping entries
    pub fn mapping(mut self, mapping: FilterMapping) -> Self {
        self.mapping.extend(mapping);
        self
    }

    fn scope(&self) -> Result<Vec<String>, ConfigurationError> {
        match (&self.fields, &self.exclude) {
            (Some(_), Some(_)) => Err(ConfigurationError::ConflictingFieldPolicy),
            (Some(fields), None) => Ok(fields.clone()),
            (None, exclude) => {
                let excluded = |name: &str| exclude.as_ref().is_some_and(|exclude| exclude.iter().any(|e| e == name));
                Ok(self.schema.field_names().into_iter().filter(|name| !excluded(name)).map(str::to_string).collect())
            }
        }
    }

    pub fn build(self) -> Result<Registry, ConfigurationError> {
        let scope = self.scope()?;
        let parents: Vec<&Registry> = self.parents.iter().collect();
        let declared = Registry::inherit(&parents, self.declared);

        let mut entries: Vec<(String, Arc<Filter>)> = Vec::new();
        for name in &scope {
            if let Some(filter) = declared.get(name) {
                entries.push((name.clone(), Arc::clone(filter)));
                continue;
            }
            let field = self.schema.get(name).ok_or_else(|| ConfigurationError::UnknownField { document: self.schema.name.clone(), field: name.clone() })?;
            let mut builder = self.mapping.resolve(&field)?;
            if let Some(options) = self.options.get(name) {
                builder = builder.options(options);
            }
            let filter = builder.build()?;
            debug!(document = %self.schema.name, field = %name, kind = filter.kind().name(), "synthesized filter");
            entries.push((name.clone(), Arc::new(filter)));
        }
        for (name, filter) in declared.iter() {
            if !scope.iter().any(|field| field == name) {
                entries.push((name.to_string(), Arc::clone(filter)));
            }
        }

        Ok(Registry::from_entries(entries).with_document(self.schema))
    }
}
