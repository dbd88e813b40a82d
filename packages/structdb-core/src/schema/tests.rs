use super::*;
use crate::structure::{IdType, MemberDescriptor, MemberKind, TypeDescriptor, UniqueMode};
use crate::value::{DataType, Value};
use crate::StructureError;
use ntest::timeout;
use serde_json::json;

fn order_descriptor() -> TypeDescriptor {
    TypeDescriptor::new("Order")
        .member(MemberDescriptor::scalar("Id", DataType::Int64))
        .member(MemberDescriptor::scalar("OrderNo", DataType::Text).unique(UniqueMode::PerType))
        .member(MemberDescriptor::object(
            "Customer",
            vec![
                MemberDescriptor::scalar("Name", DataType::Text),
                MemberDescriptor::object(
                    "Address",
                    vec![MemberDescriptor::scalar("City", DataType::Text)],
                ),
            ],
        ))
        .member(MemberDescriptor::sequence(
            "Lines",
            MemberKind::object(vec![
                MemberDescriptor::scalar("ProductNo", DataType::Text),
                MemberDescriptor::scalar("Quantity", DataType::Int32),
            ]),
        ))
        .member(
            MemberDescriptor::sequence("Tags", MemberKind::scalar(DataType::Text))
                .unique(UniqueMode::PerInstance),
        )
}

fn reflect(descriptor: &TypeDescriptor) -> StructureType {
    StructureTypeReflector::new().reflect(descriptor).unwrap()
}

#[timeout(1000)]
#[test]
fn test_reflect_flattens_nested_and_sequence_members() {
    let reflected = reflect(&order_descriptor());

    assert_eq!(
        reflected.id_member,
        Some(IdMember {
            path: "Id".to_string(),
            id_type: IdType::Identity
        })
    );

    let paths: Vec<&str> = reflected
        .index_members
        .iter()
        .map(|m| m.path.as_str())
        .collect();
    assert_eq!(
        paths,
        vec![
            "OrderNo",
            "Customer.Name",
            "Customer.Address.City",
            "Lines.ProductNo",
            "Lines.Quantity",
            "Tags"
        ]
    );

    let enumerable: Vec<bool> = reflected
        .index_members
        .iter()
        .map(|m| m.is_element_of_enumerable)
        .collect();
    assert_eq!(enumerable, vec![false, false, false, true, true, true]);
    assert_eq!(reflected.index_members[5].unique, Some(UniqueMode::PerInstance));
}

#[timeout(1000)]
#[test]
fn test_reflect_id_conventions() {
    let by_structure_id = TypeDescriptor::new("Car")
        .member(MemberDescriptor::scalar("Id", DataType::Int64))
        .member(MemberDescriptor::scalar("StructureId", DataType::Uuid))
        .member(MemberDescriptor::scalar("Make", DataType::Text));
    let reflected = reflect(&by_structure_id);
    let id = reflected.id_member.unwrap();
    assert_eq!(id.path, "StructureId");
    assert_eq!(id.id_type, IdType::Guid);
    // The losing convention candidate stays indexable.
    assert!(reflected.index_members.iter().any(|m| m.path == "Id"));

    let by_type_name = TypeDescriptor::new("Car")
        .member(MemberDescriptor::nullable("CarId", DataType::Int64))
        .member(MemberDescriptor::scalar("Make", DataType::Text));
    assert_eq!(reflect(&by_type_name).id_member.unwrap().path, "CarId");

    let annotated = TypeDescriptor::new("Car")
        .member(MemberDescriptor::scalar("Key", DataType::Uuid).id())
        .member(MemberDescriptor::scalar("Id", DataType::Int64));
    assert_eq!(reflect(&annotated).id_member.unwrap().path, "Key");
}

#[timeout(1000)]
#[test]
fn test_reflect_without_id_member() {
    let descriptor =
        TypeDescriptor::new("Note").member(MemberDescriptor::scalar("Text", DataType::Text));
    let reflected = reflect(&descriptor);
    assert!(reflected.id_member.is_none());
    assert_eq!(reflected.index_members.len(), 1);
}

#[timeout(1000)]
#[test]
fn test_reflect_rejects_ambiguous_id() {
    let descriptor = TypeDescriptor::new("Car")
        .member(MemberDescriptor::scalar("A", DataType::Int64).id())
        .member(MemberDescriptor::scalar("B", DataType::Int64).id());
    let err = StructureTypeReflector::new().reflect(&descriptor).unwrap_err();
    assert!(matches!(err, SchemaError::AmbiguousIdMember { .. }));
}

#[timeout(1000)]
#[test]
fn test_reflect_rejects_reserved_column_names() {
    let descriptor = TypeDescriptor::new("Shelf")
        .member(MemberDescriptor::scalar("Id", DataType::Int64))
        .member(MemberDescriptor::scalar("SortOrder", DataType::Int32));
    let err = StructureTypeReflector::new().reflect(&descriptor).unwrap_err();
    match err {
        SchemaError::ReservedColumnName { path, column, .. } => {
            assert_eq!(path, "SortOrder");
            assert_eq!(column, "SortOrder");
        }
        other => panic!("Expected ReservedColumnName, got {:?}", other),
    }

    // Not the id once another member is annotated, so it would be an index column.
    let descriptor = TypeDescriptor::new("Shelf")
        .member(MemberDescriptor::scalar("Key", DataType::Int64).id())
        .member(MemberDescriptor::scalar("StructureId", DataType::Int64));
    let err = StructureTypeReflector::new().reflect(&descriptor).unwrap_err();
    assert!(matches!(err, SchemaError::ReservedColumnName { column, .. } if column == "StructureId"));

    let nested = TypeDescriptor::new("Shelf")
        .member(MemberDescriptor::scalar("Id", DataType::Int64))
        .member(MemberDescriptor::object(
            "Box",
            vec![MemberDescriptor::scalar("Label", DataType::Text)],
        ))
        .member(MemberDescriptor::scalar("SortOrderHint", DataType::Int32));
    assert!(StructureTypeReflector::new().reflect(&nested).is_ok());
}

#[timeout(1000)]
#[test]
fn test_reflect_rejects_paths_sharing_a_column() {
    let descriptor = TypeDescriptor::new("Crate")
        .member(MemberDescriptor::scalar("Id", DataType::Int64))
        .member(MemberDescriptor::object(
            "A",
            vec![MemberDescriptor::scalar("B", DataType::Text)],
        ))
        .member(MemberDescriptor::scalar("A_B", DataType::Int64));
    let err = SchemaBuilder::new().create_schema_from(&descriptor).unwrap_err();
    match err {
        SchemaError::ColumnNameCollision {
            first,
            second,
            column,
            ..
        } => {
            assert_eq!(first, "A.B");
            assert_eq!(second, "A_B");
            assert_eq!(column, "A_B");
        }
        other => panic!("Expected ColumnNameCollision, got {:?}", other),
    }

    let twice = TypeDescriptor::new("Crate")
        .member(MemberDescriptor::scalar("Id", DataType::Int64))
        .member(MemberDescriptor::scalar("Label", DataType::Text))
        .member(MemberDescriptor::scalar("Label", DataType::Text));
    assert!(matches!(
        StructureTypeReflector::new().reflect(&twice),
        Err(SchemaError::DuplicateMemberPath { .. })
    ));
}

#[timeout(1000)]
#[test]
fn test_reflect_rejects_unsupported_id_type() {
    let descriptor = TypeDescriptor::new("Car")
        .member(MemberDescriptor::scalar("Id", DataType::Text))
        .member(MemberDescriptor::scalar("Make", DataType::Text));
    let err = StructureTypeReflector::new().reflect(&descriptor).unwrap_err();
    match err {
        SchemaError::UnsupportedIdType { member, found, .. } => {
            assert_eq!(member, "Id");
            assert_eq!(found, "Text");
        }
        other => panic!("Expected UnsupportedIdType, got {:?}", other),
    }
}

#[timeout(1000)]
#[test]
fn test_reflect_function_members() {
    let rejected = TypeDescriptor::new("Car")
        .member(MemberDescriptor::scalar("Id", DataType::Int64))
        .member(MemberDescriptor::object(
            "Engine",
            vec![MemberDescriptor::function("OnStart")],
        ));
    let err = StructureTypeReflector::new().reflect(&rejected).unwrap_err();
    match err {
        SchemaError::UnsupportedMemberType { member, .. } => assert_eq!(member, "Engine.OnStart"),
        other => panic!("Expected UnsupportedMemberType, got {:?}", other),
    }

    let excluded = TypeDescriptor::new("Car")
        .member(MemberDescriptor::scalar("Id", DataType::Int64))
        .member(MemberDescriptor::function("OnStart").excluded())
        .member(MemberDescriptor::scalar("Make", DataType::Text));
    let reflected = reflect(&excluded);
    assert_eq!(reflected.index_members.len(), 1);
}

#[timeout(1000)]
#[test]
fn test_create_schema_missing_members() {
    let builder = SchemaBuilder::new();

    let no_id =
        TypeDescriptor::new("Note").member(MemberDescriptor::scalar("Text", DataType::Text));
    assert!(matches!(
        builder.create_schema_from(&no_id),
        Err(SchemaError::MissingIdMember { .. })
    ));

    let only_id = TypeDescriptor::new("Note")
        .member(MemberDescriptor::scalar("Id", DataType::Int64))
        .member(MemberDescriptor::scalar("Secret", DataType::Text).excluded());
    assert!(matches!(
        builder.create_schema_from(&only_id),
        Err(SchemaError::MissingIndexableMembers { .. })
    ));
}

#[timeout(1000)]
#[test]
fn test_create_schema_is_deterministic() {
    let builder = SchemaBuilder::new();
    let a = builder.create_schema_from(&order_descriptor()).unwrap();
    let b = builder.create_schema_from(&order_descriptor()).unwrap();

    assert_eq!(a, b);
    assert_eq!(a.hash.len(), 8);
    assert!(a.hash.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(a.id_accessor.id_type, IdType::Identity);

    let ordinals: Vec<usize> = a.index_accessors.iter().map(|x| x.ordinal).collect();
    assert_eq!(ordinals, (1..=6).collect::<Vec<_>>());
    assert_eq!(a.field_count(), 7);
    assert_eq!(a.index_accessor_at(3).unwrap().path, "Customer.Address.City");
    assert_eq!(a.index_accessor_at(3).unwrap().name, "Customer_Address_City");
    assert!(a.index_accessor_at(0).is_none());
}

#[timeout(1000)]
#[test]
fn test_hash_differs_by_name() {
    let builder = SchemaBuilder::new();
    let order = builder.create_schema_from(&order_descriptor()).unwrap();
    let mut renamed = order_descriptor();
    renamed.name = "Invoice".to_string();
    let invoice = builder.create_schema_from(&renamed).unwrap();
    assert_ne!(order.hash, invoice.hash);
}

#[timeout(1000)]
#[test]
fn test_is_id_path() {
    let descriptor = TypeDescriptor::new("Item")
        .member(MemberDescriptor::scalar("ItemId", DataType::Int64))
        .member(MemberDescriptor::scalar("IdTmp", DataType::Int64))
        .member(MemberDescriptor::scalar("TmpId", DataType::Int64));
    let schema = SchemaBuilder::new().create_schema_from(&descriptor).unwrap();

    assert!(schema.is_id_path("Id"));
    assert!(schema.is_id_path("ItemId"));
    assert!(!schema.is_id_path("IdTmp"));
    assert!(!schema.is_id_path("TmpId"));
}

#[timeout(1000)]
#[test]
fn test_index_accessor_values_scalar() {
    let schema = SchemaBuilder::new()
        .create_schema_from(&order_descriptor())
        .unwrap();
    let city = schema.index_accessor("Customer.Address.City").unwrap();

    let doc = json!({"Customer": {"Name": "Ann", "Address": {"City": "Oslo"}}});
    assert_eq!(city.values(&doc).unwrap(), vec![Value::Text("Oslo".into())]);

    let missing = json!({"Customer": null});
    assert_eq!(city.values(&missing).unwrap(), vec![Value::Null]);
}

#[timeout(1000)]
#[test]
fn test_index_accessor_values_enumerable_cardinality() {
    let schema = SchemaBuilder::new()
        .create_schema_from(&order_descriptor())
        .unwrap();
    let quantity = schema.index_accessor("Lines.Quantity").unwrap();

    let three = json!({"Lines": [
        {"ProductNo": "a", "Quantity": 1},
        {"ProductNo": "b", "Quantity": 2},
        {"ProductNo": "c", "Quantity": 3}
    ]});
    assert_eq!(
        quantity.values(&three).unwrap(),
        vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]
    );

    let empty = json!({"Lines": []});
    assert!(quantity.values(&empty).unwrap().is_empty());
}

#[timeout(1000)]
#[test]
fn test_index_accessor_scalar_holding_sequence_fails() {
    let schema = SchemaBuilder::new()
        .create_schema_from(&order_descriptor())
        .unwrap();
    let order_no = schema.index_accessor("OrderNo").unwrap();

    let err = order_no.values(&json!({"OrderNo": ["a", "b"]})).unwrap_err();
    match err {
        StructureError::IndexExtractionFailed { path, .. } => assert_eq!(path, "OrderNo"),
        other => panic!("Expected IndexExtractionFailed, got {:?}", other),
    }
}

#[timeout(1000)]
#[test]
fn test_names_for_schema() {
    let schema = SchemaBuilder::new()
        .create_schema_from(&order_descriptor())
        .unwrap();
    let names = DbSchemaNames::for_schema(&schema);

    assert_eq!(names.structures_table, "OrderStructures");
    assert_eq!(names.indexes_table, "OrderIndexes");
    assert_eq!(
        names.unique_index("OrderNo"),
        format!("UQ_Order_{}_OrderNo", schema.hash)
    );

    let columns = DbSchemaNames::index_columns(&schema);
    assert_eq!(columns.first().map(String::as_str), Some(STRUCTURE_ID_COLUMN));
    assert_eq!(columns.last().map(String::as_str), Some(SORT_ORDER_COLUMN));
    assert_eq!(columns.len(), schema.field_count() + 1);
}

#[timeout(1000)]
#[test]
fn test_registry_builds_once() {
    let registry = StructureSchemas::new();
    let first = registry
        .get_or_register_descriptor(&order_descriptor())
        .unwrap();
    let second = registry
        .get_or_register_descriptor(&order_descriptor())
        .unwrap();

    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert!(registry.contains("Order"));
    assert_eq!(registry.names(), vec!["Order".to_string()]);

    assert!(registry.remove("Order").is_some());
    assert!(registry.get("Order").is_none());
}
