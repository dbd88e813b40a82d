//! Loads structures through a session and queries them back.

use structdb_core::config::StoreConfig;
use structdb_core::lambdas::Expr;
use structdb_core::query::{QueryCommand, QueryGenerator};
use structdb_core::{StructureError, Value};

use crate::helpers::{memory_session, CodedItem, StringItem};

fn string_value(json: &str) -> String {
    let body: serde_json::Value = serde_json::from_str(json).unwrap();
    body["StringValue"].as_str().unwrap().to_string()
}

#[test]
fn test_insert_then_query_by_string_member() {
    let (session, backend, _) = memory_session(&StoreConfig::default());
    let mut items: Vec<StringItem> = ["A", "B", "C", "D"].into_iter().map(StringItem::new).collect();

    let summary = session.insert_many(&mut items).unwrap();
    assert_eq!(summary.structures, 4);
    assert_eq!(summary.indexes, 4);
    assert_eq!(
        items.iter().map(|i| i.id).collect::<Vec<_>>(),
        vec![1, 2, 3, 4]
    );

    let query = QueryCommand::builder()
        .where_(&Expr::member("StringValue").eq("C"))
        .unwrap()
        .build();
    let schema = session.schema_for::<StringItem>().unwrap();

    let info = QueryGenerator::new().generate_where(&query, &schema).unwrap();
    assert!(info.sql.contains("si.[StringValue] = @p0"), "{}", info.sql);
    assert_eq!(info.parameter("@p0"), Some(&Value::Text("C".into())));

    let rows = backend.query(&schema, &query).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, Value::Integer(3));
    assert_eq!(string_value(&rows[0].json), "C");
}

#[test]
fn test_batched_parallel_load_is_fully_queryable() {
    let config = StoreConfig {
        max_batch_size: 7,
        parallel_inserts: true,
        ..Default::default()
    };
    let (session, backend, _) = memory_session(&config);
    let mut items: Vec<StringItem> = (0..50).map(|i| StringItem::new(&format!("v{:02}", i))).collect();

    let summary = session.insert_many(&mut items).unwrap();
    assert_eq!(summary.batches, 8);
    assert_eq!(backend.row_count("StringItemStructures"), 50);
    assert_eq!(backend.row_count("StringItemIndexes"), 50);

    let schema = session.schema_for::<StringItem>().unwrap();
    let query = QueryCommand::builder()
        .where_(&Expr::member("StringValue").starts_with("v4"))
        .unwrap()
        .build();
    let mut found: Vec<String> = backend
        .query(&schema, &query)
        .unwrap()
        .iter()
        .map(|row| string_value(&row.json))
        .collect();
    found.sort();
    assert_eq!(found.len(), 10);
    assert_eq!(found[0], "v40");
    assert_eq!(backend.count(&schema, &QueryCommand::default()).unwrap(), 50);
}

#[test]
fn test_second_load_continues_identity_range() {
    let (session, backend, _) = memory_session(&StoreConfig::default());
    let mut first = vec![StringItem::new("A"), StringItem::new("B")];
    let mut second = vec![StringItem::new("C")];

    session.insert_many(&mut first).unwrap();
    session.insert_many(&mut second).unwrap();

    assert_eq!(second[0].id, 3);
    assert_eq!(
        structdb_core::client::IdentitySeedStore::read_seed(backend.as_ref(), "StringItem").unwrap(),
        Some(4)
    );
}

#[test]
fn test_unique_code_is_enforced_across_session_calls() {
    let (session, backend, _) = memory_session(&StoreConfig::default());
    session.insert_many(&mut [CodedItem::new("X-1")]).unwrap();

    let err = session
        .insert_many(&mut [CodedItem::new("X-2"), CodedItem::new("X-1")])
        .unwrap_err();
    assert!(
        matches!(&err, StructureError::UniqueConstraintViolation { path, .. } if path == "Code"),
        "{:?}",
        err
    );
    assert_eq!(backend.row_count("CodedItemStructures"), 1);
    assert_eq!(backend.row_count("CodedItemIndexes"), 1);

    session.insert_many(&mut [CodedItem::new("X-2")]).unwrap();
    assert_eq!(backend.row_count("CodedItemStructures"), 2);
}
