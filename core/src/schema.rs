use serde::{Deserialize, Serialize};

/// The declared type of a document field, as the document mapper names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Url,
    Email,
    Int,
    Long,
    Float,
    Decimal,
    Boolean,
    DateTime,
    ComplexDateTime,
    Date,
    ObjectId,
    Uuid,
    /// Auto-incrementing counter
    Sequence,
    Reference,
    LazyReference,
    GenericReference,
    Point,
    List,
    SortedList,
    EmbeddedDocumentList,
    Dict,
    Map,
    EmbeddedDocument,
    Binary,
    File,
    Image,
    Dynamic,
}

impl FieldType {
    /// More general types this one specializes, nearest first
    pub fn fallbacks(self) -> &'static [FieldType] {
        match self {
            FieldType::Url | FieldType::Email | FieldType::ComplexDateTime => &[FieldType::String],
            FieldType::Date => &[FieldType::DateTime],
            FieldType::SortedList | FieldType::EmbeddedDocumentList => &[FieldType::List],
            FieldType::Map => &[FieldType::Dict],
            FieldType::Image => &[FieldType::File],
            _ => &[],
        }
    }

    /// Whether the field holds a list of elements of another type
    pub fn is_collection(self) -> bool { self == FieldType::List || self.fallbacks().contains(&FieldType::List) }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Element type of collection fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<FieldType>,
}

impl SchemaField {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self { Self { name: name.into(), field_type, element: None } }

    pub fn list(name: impl Into<String>, element: FieldType) -> Self { Self { name: name.into(), field_type: FieldType::List, element: Some(element) } }
}

fn default_id_field() -> String { "id".to_string() }

/// A document type's field list, read by schema introspection and by the
/// filter set's backend compatibility check.
///
/// ```
/// # use docfilter::schema::{DocumentSchema, FieldType};
/// let schema: DocumentSchema = serde_json::from_str(r#"{
///     "name": "Article",
///     "fields": [{ "name": "title", "type": "string" }, { "name": "tags", "type": "list", "element": "string" }]
/// }"#).unwrap();
/// assert_eq!(schema.id_field, "id");
/// assert_eq!(schema.get("tags").and_then(|field| field.element), Some(FieldType::String));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSchema {
    pub name: String,
    /// Names of the document types this one inherits from, nearest first
    #[serde(default)]
    pub ancestors: Vec<String>,
    #[serde(default = "default_id_field")]
    pub id_field: String,
    /// Declared fields, excluding the id field
    #[serde(default)]
    pub fields: Vec<SchemaField>,
}

impl DocumentSchema {
    pub fn new(name: impl Into<String>) -> Self { Self { name: name.into(), ancestors: Vec::new(), id_field: default_id_field(), fields: Vec::new() } }

    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.push(SchemaField::new(name, field_type));
        self
    }

    pub fn list_field(mut self, name: impl Into<String>, element: FieldType) -> Self {
        self.fields.push(SchemaField::list(name, element));
        self
    }

    pub fn ancestor(mut self, name: impl Into<String>) -> Self {
        self.ancestors.push(name.into());
        self
    }

    pub fn id_field(mut self, name: impl Into<String>) -> Self {
        self.id_field = name.into();
        self
    }

    /// Look up a declared field, or the id field as an object id
    pub fn get(&self, name: &str) -> Option<SchemaField> {
        if let Some(field) = self.fields.iter().find(|field| field.name == name) {
            return Some(field.clone());
        }
        (name == self.id_field).then(|| SchemaField::new(name, FieldType::ObjectId))
    }

    /// Every field name in declaration order, with the id field first
    pub fn field_names(&self) -> Vec<&str> {
        let mut names = vec![self.id_field.as_str()];
        names.extend(self.fields.iter().map(|field| field.name.as_str()).filter(|name| *name != self.id_field));
        names
    }

    /// Whether documents of this type are also documents of `name`
    pub fn is_a(&self, name: &str) -> bool { self.name == name || self.ancestors.iter().any(|ancestor| ancestor == name) }
}
