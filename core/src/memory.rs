//! An in-memory [`Queryset`] over plain documents.

use crate::queryset::Queryset;
use crate::schema::DocumentSchema;
use crate::selection::filter::{EvalError, FilterIterator, FilterResult, Filterable};
use bson::oid::ObjectId;
use docfilter_ast::{Fragment, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// A stored document: a collection name and a map of attribute values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    collection: String,
    fields: BTreeMap<String, Value>,
}

impl Document {
    /// An empty document with a fresh object id under `id`
    pub fn new(collection: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert("id".to_string(), Value::ObjectId(ObjectId::new()));
        Self { collection: collection.into(), fields }
    }

    /// A document with the attributes of a JSON object. Non-object JSON yields no attributes.
    pub fn from_json(collection: impl Into<String>, json: serde_json::Value) -> Self {
        let mut document = Self::new(collection);
        if let Value::Map(fields) = Value::from(json) {
            document.fields.extend(fields);
        }
        document
    }

    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> { self.fields.get(name) }

    pub fn id(&self) -> Option<ObjectId> {
        match self.fields.get("id") {
            Some(Value::ObjectId(id)) => Some(*id),
            _ => None,
        }
    }

    /// How another document stores a reference to this one: `{$ref: collection, $id: id}`
    pub fn reference(&self) -> Value {
        let mut reference = BTreeMap::new();
        reference.insert("$ref".to_string(), Value::String(self.collection.clone()));
        reference.insert("$id".to_string(), self.fields.get("id").cloned().unwrap_or(Value::Null));
        Value::Map(reference)
    }
}

impl Filterable for Document {
    fn collection(&self) -> &str { &self.collection }

    fn value(&self, path: &[&str]) -> Option<Value> {
        let (first, rest) = path.split_first()?;
        self.fields.get(*first)?.get_path(rest).cloned()
    }
}

/// Documents plus the fragments applied to them so far. Nothing is evaluated until
/// [`MemoryQueryset::evaluate`] is called.
#[derive(Debug, Clone, Default)]
pub struct MemoryQueryset {
    document: Option<Arc<DocumentSchema>>,
    documents: Vec<Document>,
    fragments: Vec<Fragment>,
}

impl MemoryQueryset {
    pub fn new(documents: impl IntoIterator<Item = Document>) -> Self {
        Self { document: None, documents: documents.into_iter().collect(), fragments: Vec::new() }
    }

    /// Declare the document type the queryset selects
    pub fn with_document(mut self, document: impl Into<Arc<DocumentSchema>>) -> Self {
        self.document = Some(document.into());
        self
    }

    pub fn fragments(&self) -> &[Fragment] { &self.fragments }

    /// Documents matching every applied fragment, in storage order, or nearest first
    /// when a `near` lookup was applied.
    pub fn evaluate(&self) -> Result<Vec<&Document>, EvalError> {
        let iter = FilterIterator::new(self.documents.iter(), self.fragments.clone())?;
        let proximity = iter.proximity().clone();
        let mut matched = Vec::new();
        for result in iter {
            match result {
                FilterResult::Pass(document) => matched.push(document),
                FilterResult::Skip(_) => {}
                FilterResult::Error(_, err) => return Err(err),
            }
        }
        proximity.sort(&mut matched);
        debug!(fragments = self.fragments.len(), total = self.documents.len(), matched = matched.len(), "evaluated in-memory queryset");
        Ok(matched)
    }
}

impl Queryset for MemoryQueryset {
    fn filter(mut self, fragment: &Fragment) -> Self {
        self.fragments.push(fragment.clone());
        self
    }

    fn document(&self) -> Option<&DocumentSchema> { self.document.as_deref() }
}
