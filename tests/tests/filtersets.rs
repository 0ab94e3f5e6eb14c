mod common;

use anyhow::Result;
use common::*;
use docfilter::codec::{CodecError, IntegerCodec};
use docfilter::{Document, Filter, FilterKind, Filterset, Fragment, Lookup, Params, QueryDict, QueryValues, Queryset, Registry, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Records every fragment it is narrowed by
#[derive(Debug, Default)]
struct Recorder(Vec<Fragment>);

impl Queryset for Recorder {
    fn filter(mut self, fragment: &Fragment) -> Self {
        self.0.push(fragment.clone());
        self
    }
}

fn kinds(registry: &Registry) -> Vec<&'static str> { registry.iter().map(|(_, filter)| filter.kind().name()).collect() }

#[test]
fn test_declaration() -> Result<()> {
    let registry = Registry::declare([
        ("foo", Filter::char().build()?),
        ("bar", Filter::integer().build()?),
        ("baz", Filter::boolean().named("babaz").build()?),
    ]);
    let filterset = Filterset::new(registry, QueryDict::new());

    assert_eq!(filterset.filters().iter().map(|filter| filter.name()).collect::<Vec<_>>(), vec!["foo", "bar", "baz"]);
    assert_eq!(filterset.filters().iter().map(|filter| filter.key()).collect::<Vec<_>>(), vec!["foo", "bar", "babaz"]);
    assert_eq!(kinds(filterset.registry()), vec!["char", "integer", "boolean"]);
    Ok(())
}

#[test]
fn test_inheritance() -> Result<()> {
    let base = Registry::declare([("foo", Filter::char().build()?), ("bar", Filter::char().build()?)]);
    let derived = Registry::inherit(&[&base], [("bar", Filter::integer().named("babar").build()?), ("baz", Filter::char().build()?)]);
    let filterset = Filterset::new(derived, QueryDict::new());

    assert_eq!(filterset.registry().names().collect::<Vec<_>>(), vec!["foo", "bar", "baz"]);
    assert_eq!(kinds(filterset.registry()), vec!["char", "integer", "char"]);
    assert_eq!(filterset.filters().iter().map(|filter| filter.key()).collect::<Vec<_>>(), vec!["foo", "babar", "baz"]);

    // the base registry is unaffected
    assert_eq!(kinds(&base), vec!["char", "char"]);
    Ok(())
}

#[test]
fn test_parsing() -> Result<()> {
    let registry = Registry::declare([
        ("foo", Filter::char().build()?),
        ("bar", Filter::integer().named("babar").build()?),
        ("baz", Filter::boolean().build()?),
    ]);
    let filterset = Filterset::new(registry, QueryDict::parse("foo=Foo&babar=123&baz=true"));
    let values = filterset.parse_values()?;
    assert_eq!(values, &QueryValues::new().with("foo", "Foo").with("bar", 123).with("baz", true));
    assert_eq!(values.names().collect::<Vec<_>>(), vec!["foo", "bar", "baz"]);
    Ok(())
}

#[test]
fn test_parsing_missed() -> Result<()> {
    let registry = Registry::declare([
        ("foo", Filter::char().build()?),
        ("bar", Filter::integer().build()?),
        ("baz", Filter::boolean().build()?),
    ]);
    let filterset = Filterset::new(registry, QueryDict::parse("foo=Foo&baz=true"));
    assert_eq!(filterset.parse_values()?, &QueryValues::new().with("foo", "Foo").with("baz", true));
    Ok(())
}

#[test]
fn test_parsing_invalid() -> Result<()> {
    let registry = Registry::declare([
        ("foo", Filter::char().build()?),
        ("bar", Filter::integer().build()?),
        ("baz", Filter::boolean().build()?),
    ]);
    let filterset = Filterset::new(registry, QueryDict::parse("foo=Foo&bar=xxx&baz=true"));
    let err = filterset.parse_values().unwrap_err();
    assert_eq!(err.field, "bar");
    assert_eq!(err.value, "xxx");
    assert_eq!(err.source, CodecError::Invalid { value: "xxx".into(), expected: "integer" });

    // nothing is applied when parsing fails
    assert!(filterset.filter_queryset(Recorder::default()).is_err());
    Ok(())
}

#[test]
fn test_filtering_with_values() -> Result<()> {
    let registry = Registry::declare([
        ("foo", Filter::char().build()?),
        ("bar", Filter::integer().source("babar").build()?),
        ("baz", Filter::char().build()?),
    ]);
    let filterset = Filterset::new(registry, QueryDict::new());
    let values = QueryValues::new().with("foo", "Foo").with("bar", 123);
    let recorder = filterset.apply_values(Recorder::default(), &values)?;

    assert_eq!(
        recorder.0,
        vec![Fragment::from(Params::new().with("foo", None, "Foo")), Fragment::from(Params::new().with("babar", None, 123))]
    );
    Ok(())
}

#[test]
fn test_end_to_end() -> Result<()> {
    let registry = Arc::new(Registry::declare([("foo", Filter::char().build()?), ("bar", Filter::integer().named("babar").build()?)]));
    let documents = vec![
        Document::new("Sample").set("foo", "Foo").set("babar", 123),
        Document::new("Sample").set("foo", "Foo").set("babar", 124),
        Document::new("Sample").set("foo", "Bar").set("babar", 123),
    ];

    let matched = run(&registry, QueryDict::parse("foo=Foo&babar=123"), &documents)?;
    assert_eq!(matched, ids(&documents[0..1]));

    let matched = run(&registry, QueryDict::parse("foo=Foo"), &documents)?;
    assert_eq!(matched, ids(&documents[0..2]));

    let matched = run(&registry, QueryDict::new(), &documents)?;
    assert_eq!(matched, ids(&documents));
    Ok(())
}

#[test]
fn test_filtering_is_memoised() -> Result<()> {
    let registry = Registry::declare([("foo", Filter::any().child(IntegerCodec).build()?)]);
    let filterset = Filterset::new(registry, QueryDict::parse("foo=1&foo=2"));

    let first = filterset.parse_values()? as *const QueryValues;
    let second = filterset.parse_values()? as *const QueryValues;
    assert_eq!(first, second);
    assert_eq!(filterset.parse_values()?.get("foo"), Some(&Value::from(vec![1, 2])));
    Ok(())
}

#[test]
fn test_plain_mapping_source() -> Result<()> {
    let registry = Registry::declare([
        ("foo", Filter::char().build()?),
        ("rng", Filter::range().child(IntegerCodec).build()?),
        ("lst", Filter::any().child(IntegerCodec).build()?),
    ]);
    let query: HashMap<String, String> =
        [("foo", "Foo"), ("rng.min", "3"), ("lst", "7")].into_iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    let filterset = Filterset::new(registry, query);
    let fragments = filterset.fragments()?;

    assert_eq!(fragments.iter().map(|(name, _)| *name).collect::<Vec<_>>(), vec!["foo", "rng", "lst"]);
    assert_eq!(fragments[1].1, Fragment::from(Params::new().with("rng", Some(Lookup::Gte), 3)));
    assert_eq!(fragments[2].1, Fragment::from(Params::new().with("lst", Some(Lookup::In), vec![7])));
    Ok(())
}

#[test]
fn test_json_source() -> Result<()> {
    let registry = Registry::declare([
        ("foo", Filter::boolean().build()?),
        ("bar", Filter::any().child(IntegerCodec).build()?),
        ("baz", Filter::range().child(IntegerCodec).build()?),
    ]);
    let query = json_query(serde_json::json!({ "foo": true, "bar": [1, 2], "baz": { "min": 5, "max": 11 } }));
    let filterset = Filterset::new(registry, query);
    let values = filterset.parse_values()?;

    assert_eq!(values.get("foo"), Some(&Value::Bool(true)));
    assert_eq!(values.get("bar"), Some(&Value::from(vec![1, 2])));
    assert_eq!(values.get("baz").and_then(|range| range.get_path(&["max"])), Some(&Value::I64(11)));
    Ok(())
}

#[test]
fn test_shared_registry() -> Result<()> {
    let registry = Arc::new(Registry::declare([("foo", Filter::char().build()?)]));
    let first = Filterset::new(Arc::clone(&registry), QueryDict::parse("foo=a"));
    let second = Filterset::new(Arc::clone(&registry), QueryDict::parse("foo=b"));

    assert_eq!(first.parse_values()?.get("foo"), Some(&Value::from("a")));
    assert_eq!(second.parse_values()?.get("foo"), Some(&Value::from("b")));
    assert_eq!(registry.get("foo").map(|filter| filter.kind()), Some(&FilterKind::Char));
    Ok(())
}
