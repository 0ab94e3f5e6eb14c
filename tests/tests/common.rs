use tracing::Level;

use bson::oid::ObjectId;
use docfilter::{Document, Filterset, MemoryQueryset, QuerySource, Registry};
use std::collections::HashSet;
use std::sync::Arc;

// Initialize tracing for tests
#[ctor::ctor]
fn init_tracing() { tracing_subscriber::fmt().with_max_level(Level::INFO).with_test_writer().init(); }

/// Query data given as a JSON object, the way a parsed request body arrives
#[allow(unused)]
pub fn json_query(json: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    match json {
        serde_json::Value::Object(map) => map,
        other => panic!("query data must be an object, got {other}"),
    }
}

#[allow(unused)]
pub fn ids<'a>(documents: impl IntoIterator<Item = &'a Document>) -> Vec<ObjectId> { documents.into_iter().filter_map(Document::id).collect() }

/// Run `query` through a filter set over `documents` and return the matching ids in result order
#[allow(unused)]
pub fn run<S: QuerySource>(registry: &Arc<Registry>, query: S, documents: &[Document]) -> anyhow::Result<Vec<ObjectId>> {
    let filterset = Filterset::new(Arc::clone(registry), query);
    let queryset = filterset.filter_queryset(MemoryQueryset::new(documents.to_vec()))?;
    Ok(ids(queryset.evaluate()?))
}

/// Assert the same documents, regardless of order
#[allow(unused)]
pub fn assert_same_docs(actual: Vec<ObjectId>, expected: &[Document]) {
    let actual: HashSet<ObjectId> = actual.into_iter().collect();
    let expected: HashSet<ObjectId> = ids(expected).into_iter().collect();
    assert_eq!(actual, expected);
}
