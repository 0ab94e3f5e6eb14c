//! Filter sets applied end to end against an in-memory queryset.

mod common;

use anyhow::Result;
use bson::oid::ObjectId;
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use common::*;
use docfilter::codec::IntegerCodec;
use docfilter::{Document, Filter, Lookup, QueryDict, Registry};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

fn sample() -> Document { Document::new("SimpleDoc") }

fn registry<const N: usize>(filters: [(&str, Filter); N]) -> Arc<Registry> { Arc::new(Registry::declare(filters)) }

#[test]
fn test_bool() -> Result<()> {
    let objects = vec![sample().set("f_bool", true), sample().set("f_bool", false), sample()];
    let registry = registry([("foo", Filter::boolean().source("f_bool").build()?)]);

    assert_same_docs(run(&registry, json_query(json!({ "foo": true })), &objects)?, &objects[0..1]);
    assert_same_docs(run(&registry, json_query(json!({ "foo": false })), &objects)?, &objects[1..2]);
    assert_same_docs(run(&registry, QueryDict::parse("foo=null"), &objects)?, &objects);
    Ok(())
}

#[test]
fn test_bool_ne() -> Result<()> {
    let objects = vec![sample().set("f_bool", true), sample().set("f_bool", false), sample()];
    let registry = registry([("foo", Filter::boolean().lookup(Lookup::Ne).source("f_bool").build()?)]);

    assert_same_docs(run(&registry, QueryDict::parse("foo=1"), &objects)?, &objects[1..3]);
    Ok(())
}

#[test]
fn test_exists() -> Result<()> {
    let objects = vec![sample(), sample().set("f_int", 1), sample().set("f_int", 2)];
    let registry = registry([("foo", Filter::exists().source("f_int").build()?)]);

    assert_same_docs(run(&registry, json_query(json!({ "foo": true })), &objects)?, &objects[1..]);
    assert_same_docs(run(&registry, json_query(json!({ "foo": false })), &objects)?, &objects[0..1]);
    Ok(())
}

#[test]
fn test_str() -> Result<()> {
    let objects = vec![sample().set("f_str", "foofoo"), sample().set("f_str", "foobar"), sample().set("f_str", "barbaz")];
    let registry = registry([("foo", Filter::char().lookup(Lookup::Contains).source("f_str").build()?)]);

    assert_same_docs(run(&registry, QueryDict::parse("foo=foo"), &objects)?, &objects[0..2]);
    assert_same_docs(run(&registry, QueryDict::parse("foo=bar"), &objects)?, &objects[1..3]);
    Ok(())
}

#[test]
fn test_str_case_insensitive() -> Result<()> {
    let objects = vec![sample().set("f_str", "FooBar"), sample().set("f_str", "barfoo")];
    let registry = registry([("foo", Filter::char().lookup(Lookup::IStartsWith).source("f_str").build()?)]);

    assert_same_docs(run(&registry, QueryDict::parse("foo=foo"), &objects)?, &objects[0..1]);
    Ok(())
}

#[test]
fn test_uuid() -> Result<()> {
    let uuid = Uuid::new_v4();
    let objects = vec![sample().set("f_uuid", Uuid::new_v4()), sample().set("f_uuid", uuid), sample().set("f_uuid", Uuid::new_v4())];
    let registry = registry([("foo", Filter::uuid().source("f_uuid").build()?)]);

    assert_same_docs(run(&registry, QueryDict::new().with("foo", uuid.to_string()), &objects)?, &objects[1..2]);
    assert!(run(&registry, QueryDict::parse("foo=not-a-uuid"), &objects).is_err());
    Ok(())
}

#[test]
fn test_int() -> Result<()> {
    let objects = vec![sample().set("f_int", 10), sample().set("f_int", 20), sample().set("f_int", 30)];
    let registry = registry([
        ("foo", Filter::integer().lookup(Lookup::Gte).source("f_int").build()?),
        ("bar", Filter::integer().lookup(Lookup::Lte).source("f_int").build()?),
    ]);

    assert_same_docs(run(&registry, QueryDict::parse("foo=20"), &objects)?, &objects[1..3]);
    assert_same_docs(run(&registry, QueryDict::parse("bar=20"), &objects)?, &objects[0..2]);
    assert_same_docs(run(&registry, QueryDict::parse("foo=20&bar=20"), &objects)?, &objects[1..2]);
    assert_same_docs(run(&registry, QueryDict::parse("foo=20.0"), &objects)?, &objects[1..3]);
    assert!(run(&registry, QueryDict::parse("foo=20.5"), &objects).is_err());
    Ok(())
}

#[test]
fn test_flt() -> Result<()> {
    let objects = vec![sample().set("f_flt", 0.10), sample().set("f_flt", 0.20), sample().set("f_flt", 0.30)];
    let registry = registry([
        ("foo", Filter::float().lookup(Lookup::Gte).source("f_flt").build()?),
        ("bar", Filter::float().lookup(Lookup::Lte).source("f_flt").build()?),
    ]);

    assert_same_docs(run(&registry, QueryDict::parse("foo=0.2"), &objects)?, &objects[1..3]);
    assert_same_docs(run(&registry, QueryDict::parse("bar=0.2"), &objects)?, &objects[0..2]);
    assert_same_docs(run(&registry, QueryDict::parse("foo=0.2&bar=0.2"), &objects)?, &objects[1..2]);
    Ok(())
}

#[test]
fn test_float_matches_integer_attribute() -> Result<()> {
    let objects = vec![sample().set("f_num", 1), sample().set("f_num", 2)];
    let registry = registry([("foo", Filter::float().lookup(Lookup::Gt).source("f_num").build()?)]);

    assert_same_docs(run(&registry, QueryDict::parse("foo=1.5"), &objects)?, &objects[1..2]);
    Ok(())
}

#[test]
fn test_datetime() -> Result<()> {
    let d0 = NaiveDateTime::parse_from_str("2015-03-04 09:01:02.000", "%Y-%m-%d %H:%M:%S%.f")?;
    let dl = TimeDelta::milliseconds(1);
    let (d1, d2, d3) = (d0 + dl, d0 + dl * 2, d0 + dl * 3);
    let objects = vec![sample().set("f_dt", d1), sample().set("f_dt", d2), sample().set("f_dt", d3)];
    let registry = registry([
        ("dt", Filter::datetime().source("f_dt").build()?),
        ("dt_gt", Filter::datetime().lookup(Lookup::Gt).source("f_dt").build()?),
        ("dt_gte", Filter::datetime().lookup(Lookup::Gte).source("f_dt").build()?),
    ]);

    // sub-millisecond digits are dropped before comparing
    assert_same_docs(run(&registry, QueryDict::parse("dt=2015-03-04T09:01:02.002999"), &objects)?, &objects[1..2]);
    assert_same_docs(run(&registry, QueryDict::parse("dt_gt=2015-03-04T09:01:02.002"), &objects)?, &objects[2..3]);
    assert_same_docs(run(&registry, QueryDict::parse("dt_gte=2015-03-04T09:01:02.002"), &objects)?, &objects[1..3]);
    Ok(())
}

#[test]
fn test_date_matches_whole_day() -> Result<()> {
    let day = NaiveDate::from_ymd_opt(2015, 3, 4).expect("valid date");
    let at = |h, m| day.and_hms_opt(h, m, 0).expect("valid time");
    let next_day = NaiveDate::from_ymd_opt(2015, 3, 5).expect("valid date").and_hms_opt(0, 0, 0).expect("valid time");
    let objects = vec![sample().set("f_dt", at(0, 0)), sample().set("f_dt", at(23, 59)), sample().set("f_dt", next_day)];
    let registry = registry([("day", Filter::date().source("f_dt").build()?)]);

    assert_same_docs(run(&registry, QueryDict::parse("day=2015-03-04"), &objects)?, &objects[0..2]);
    assert!(run(&registry, QueryDict::parse("day=2015-03-04T10:00"), &objects).is_err());
    Ok(())
}

#[test]
fn test_oid() -> Result<()> {
    let oid = ObjectId::new();
    let objects = vec![sample().set("f_oid", ObjectId::new()), sample().set("f_oid", oid), sample().set("f_oid", ObjectId::new())];
    let registry = registry([("foo", Filter::object_id().source("f_oid").build()?)]);

    assert_same_docs(run(&registry, QueryDict::new().with("foo", oid.to_hex()), &objects)?, &objects[1..2]);
    Ok(())
}

#[test]
fn test_reference() -> Result<()> {
    let targets = vec![Document::new("Target"), Document::new("Target")];
    let objects = vec![sample().set("f_ref", targets[0].reference()), sample().set("f_ref", targets[1].reference()), sample()];
    let registry = registry([("owner", Filter::reference().source("f_ref").build()?)]);
    let target_id = targets[1].id().map(|id| id.to_hex()).unwrap_or_default();

    assert_same_docs(run(&registry, QueryDict::new().with("owner", target_id), &objects)?, &objects[1..2]);
    Ok(())
}

#[test]
fn test_list() -> Result<()> {
    let objects = vec![sample().set("f_str", "foo"), sample().set("f_str", "bar"), sample().set("f_str", "baz")];
    let registry = registry([("foo", Filter::any().source("f_str").build()?), ("bar", Filter::none().source("f_str").build()?)]);

    assert_same_docs(run(&registry, QueryDict::parse("foo=bar&foo=baz"), &objects)?, &objects[1..3]);
    assert_same_docs(run(&registry, QueryDict::parse("bar=bar&bar=baz"), &objects)?, &objects[0..1]);
    assert_same_docs(run(&registry, json_query(json!({ "foo": ["bar", "baz"] })), &objects)?, &objects[1..3]);
    Ok(())
}

#[test]
fn test_none_on_list_attribute() -> Result<()> {
    let deep = || Document::new("DeepDoc");
    let objects = vec![deep().set("f_list", vec![1, 2]), deep().set("f_list", vec![2, 3]), deep().set("f_list", vec![3, 4])];
    let registry = registry([("foo", Filter::none().child(IntegerCodec).source("f_list").build()?)]);

    assert_same_docs(run(&registry, QueryDict::parse("foo=1&foo=2"), &objects)?, &objects[2..3]);
    Ok(())
}

#[test]
fn test_all_on_list_attribute() -> Result<()> {
    let deep = || Document::new("DeepDoc");
    let objects = vec![deep().set("f_list", vec![1, 2]), deep().set("f_list", vec![2, 3]), deep().set("f_list", vec![1, 2, 3])];
    let registry = registry([("foo", Filter::all().child(IntegerCodec).source("f_list").build()?)]);

    assert_same_docs(run(&registry, QueryDict::parse("foo=2&foo=3"), &objects)?, &objects[1..3]);
    Ok(())
}

#[test]
fn test_range() -> Result<()> {
    let objects: Vec<Document> = [3, 5, 7, 11, 13].into_iter().map(|i| sample().set("f_int", i)).collect();
    let registry = registry([
        ("foo", Filter::range().child(IntegerCodec).source("f_int").build()?),
        ("bar", Filter::range().child(IntegerCodec).bounds(Lookup::Gt, Lookup::Lt).source("f_int").build()?),
    ]);

    assert_same_docs(run(&registry, QueryDict::parse("foo.min=5&foo.max=11"), &objects)?, &objects[1..4]);
    assert_same_docs(run(&registry, QueryDict::parse("bar.min=5&bar.max=11"), &objects)?, &objects[2..3]);
    assert_same_docs(run(&registry, QueryDict::parse("foo.min=11"), &objects)?, &objects[3..5]);
    assert_same_docs(run(&registry, json_query(json!({ "foo": { "min": 5, "max": 11 } })), &objects)?, &objects[1..4]);
    assert!(run(&registry, QueryDict::parse("foo.mid=5"), &objects).is_err());
    Ok(())
}

#[test]
fn test_range_collapse() -> Result<()> {
    let objects: Vec<Document> = [3, 5, 7].into_iter().map(|i| sample().set("f_int", i)).collect();
    let registry = registry([("foo", Filter::range().child(IntegerCodec).bounds(Lookup::Gt, Lookup::Lt).collapse().source("f_int").build()?)]);

    assert_same_docs(run(&registry, QueryDict::parse("foo.min=5&foo.max=5"), &objects)?, &objects[1..2]);
    Ok(())
}

#[test]
fn test_range_intersection() -> Result<()> {
    let objects = vec![
        sample().set("low", 1).set("high", 4),
        sample().set("low", 6).set("high", 9),
        sample().set("low", 3),
        sample().set("high", 2),
        sample(),
    ];
    let registry = registry([("span", Filter::range_intersection("low", "high").child(IntegerCodec).build()?)]);

    assert_same_docs(run(&registry, QueryDict::parse("span.min=3&span.max=5"), &objects)?, &[objects[0].clone(), objects[2].clone(), objects[4].clone()]);
    assert_same_docs(run(&registry, QueryDict::parse("span.min=5"), &objects)?, &[objects[1].clone(), objects[2].clone(), objects[4].clone()]);
    assert_same_docs(run(&registry, QueryDict::parse("span.max=2"), &objects)?, &[objects[0].clone(), objects[3].clone(), objects[4].clone()]);
    Ok(())
}

#[test]
fn test_nested_source() -> Result<()> {
    let objects = vec![
        Document::from_json("DeepDoc", json!({ "bar": { "baz": 1 } })),
        Document::from_json("DeepDoc", json!({ "bar": { "baz": 2 } })),
    ];
    let registry = registry([("foo", Filter::integer().source("bar.baz").build()?)]);

    assert_same_docs(run(&registry, QueryDict::parse("foo=2"), &objects)?, &objects[1..2]);
    Ok(())
}
