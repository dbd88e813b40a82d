//! Session façade behavior against recording clients.

use structdb_core::config::StoreConfig;
use structdb_core::lambdas::{Expr, SortSelector};
use structdb_core::query::{QueryCommand, QueryGenerator};
use structdb_core::{StructureError, Value};

use crate::helpers::{memory_session, StringItem};

#[test]
fn test_query_sends_generated_sql_and_deserializes_bodies() {
    let (session, _, executor) = memory_session(&StoreConfig::default());
    *executor.bodies.lock() = vec![
        r#"{"Id":7,"StringValue":"X"}"#.to_string(),
        r#"{"Id":9,"StringValue":"Y"}"#.to_string(),
    ];

    let query = QueryCommand::builder()
        .where_(&Expr::member("StringValue").ne("Z"))
        .unwrap()
        .order_by(&[SortSelector::asc(Expr::member("Id"))])
        .unwrap()
        .take(2)
        .build();
    let items: Vec<StringItem> = session.query(&query).unwrap();

    assert_eq!(
        items,
        vec![
            StringItem {
                id: 7,
                string_value: "X".into()
            },
            StringItem {
                id: 9,
                string_value: "Y".into()
            },
        ]
    );

    let schema = session.schema_for::<StringItem>().unwrap();
    let expected = QueryGenerator::new().generate(&query, &schema).unwrap();
    let commands = executor.commands.lock();
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0], expected);
    assert!(commands[0].sql.starts_with("select top(@p1)"), "{}", commands[0].sql);
}

#[test]
fn test_count_reads_scalar() {
    let (session, _, executor) = memory_session(&StoreConfig::default());
    *executor.scalar.lock() = Some(Value::Integer(12));

    let query = QueryCommand::builder()
        .where_(&Expr::member("StringValue").is_not_null())
        .unwrap()
        .build();
    assert_eq!(session.count::<StringItem>(&query).unwrap(), 12);
    assert!(executor.commands.lock()[0].sql.starts_with("select count(*) from [StringItemStructures] s where"));

    *executor.scalar.lock() = Some(Value::Text("twelve".into()));
    assert!(matches!(
        session.count::<StringItem>(&query),
        Err(StructureError::Backend(_))
    ));
}

#[test]
fn test_unknown_member_fails_before_reaching_executor() {
    let (session, _, executor) = memory_session(&StoreConfig::default());
    let query = QueryCommand::builder()
        .where_(&Expr::member("Missing").eq(1))
        .unwrap()
        .build();

    let result: Result<Vec<StringItem>, _> = session.query(&query);
    assert!(matches!(result, Err(StructureError::MemberNotIndexed { .. })));
    assert!(executor.commands.lock().is_empty());
}

#[test]
fn test_forget_schema_resynchronizes_dropped_tables() {
    let (session, backend, _) = memory_session(&StoreConfig::default());
    session.insert_many(&mut [StringItem::new("A")]).unwrap();

    let schema = session.schema_for::<StringItem>().unwrap();
    let names = structdb_core::schema::DbSchemaNames::for_schema(&schema);
    let shape = structdb_core::client::ShapeInspector::columns(backend.as_ref(), &names).unwrap();
    assert!(shape.iter().any(|c| c.name == "StringValue"));

    // Dropping the tables behind the session's back needs an explicit forget.
    backend.drop_structure(&schema);
    session.forget_schema::<StringItem>();
    session.insert_many(&mut [StringItem::new("B")]).unwrap();

    let shape = structdb_core::client::ShapeInspector::columns(backend.as_ref(), &names).unwrap();
    assert!(shape.iter().any(|c| c.name == "StringValue"));
    assert_eq!(backend.row_count("StringItemStructures"), 1);
}
