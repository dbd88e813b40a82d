//! Tests for persistence module.

use std::fs;
use std::sync::Arc;
use tempfile::tempdir;

use crate::bulk::IdentityGenerator;
use crate::client::IdentitySeedStore;
use crate::config::StoreConfig;
use crate::persistence::io_utils::{classify_io_error, retry_io_operation};
use crate::persistence::FileIdentitySeedStore;
use crate::schema::SchemaBuilder;
use crate::structure::{MemberDescriptor, TypeDescriptor};
use crate::value::DataType;
use crate::StructureError;
use ntest::timeout;

fn config_in(dir: &std::path::Path) -> StoreConfig {
    StoreConfig {
        data_dir: dir.to_path_buf(),
        persistence_retry_delay_ms: 0,
        ..Default::default()
    }
}

#[timeout(1000)]
#[test]
fn test_write_and_reopen_seeds() {
    let temp_dir = tempdir().unwrap();
    let config = config_in(temp_dir.path());

    let store = FileIdentitySeedStore::open(&config).unwrap();
    assert_eq!(store.read_seed("Order").unwrap(), None);
    store.write_seed("Order", 51).unwrap();
    store.write_seed("Customer", 3).unwrap();
    // Lower marks never move the seed back.
    store.write_seed("Order", 10).unwrap();

    assert!(store.path().exists());
    assert!(!temp_dir.path().join("identity_seeds.json.tmp").exists());

    let reopened = FileIdentitySeedStore::open(&config).unwrap();
    assert_eq!(reopened.read_seed("Order").unwrap(), Some(51));
    assert_eq!(reopened.read_seed("Customer").unwrap(), Some(3));
    assert_eq!(reopened.seeds().len(), 2);
}

#[timeout(1000)]
#[test]
fn test_corruption_detection_with_checksum() {
    let temp_dir = tempdir().unwrap();
    let config = config_in(temp_dir.path());

    let store = FileIdentitySeedStore::open(&config).unwrap();
    store.write_seed("Order", 51).unwrap();

    let contents = fs::read_to_string(store.path()).unwrap();
    fs::write(store.path(), contents.replace("51", "52")).unwrap();

    match FileIdentitySeedStore::open(&config) {
        Err(StructureError::DataCorruption(msg)) => assert!(msg.contains("Checksum mismatch")),
        other => panic!("Expected DataCorruption, got {:?}", other),
    }
}

#[timeout(1000)]
#[test]
fn test_identity_generator_resumes_from_store() {
    let temp_dir = tempdir().unwrap();
    let config = config_in(temp_dir.path());
    let schema = SchemaBuilder::new()
        .create_schema_from(
            &TypeDescriptor::new("Order")
                .member(MemberDescriptor::scalar("Id", DataType::Int64))
                .member(MemberDescriptor::scalar("No", DataType::Text)),
        )
        .unwrap();

    {
        let store = Arc::new(FileIdentitySeedStore::open(&config).unwrap());
        let identities = IdentityGenerator::with_store(1, store);
        assert_eq!(identities.check_out_and_get_seed(&schema, 10).unwrap(), 1);
        assert_eq!(identities.check_out_and_get_seed(&schema, 5).unwrap(), 11);
    }

    let store = Arc::new(FileIdentitySeedStore::open(&config).unwrap());
    let identities = IdentityGenerator::with_store(1, store);
    assert_eq!(identities.check_out_and_get_seed(&schema, 1).unwrap(), 16);
}

#[timeout(1000)]
#[test]
fn test_classify_io_error() {
    let transient = classify_io_error(
        std::io::Error::new(std::io::ErrorKind::Interrupted, "interrupted"),
        "ctx",
    );
    assert!(matches!(transient, StructureError::TransientIoError(_)));

    let missing = classify_io_error(
        std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        "ctx",
    );
    assert!(matches!(missing, StructureError::IoError(msg) if msg.starts_with("ctx: ")));
}

#[timeout(1000)]
#[test]
fn test_retry_only_transient_errors() {
    let attempts = std::cell::Cell::new(0);
    let result = retry_io_operation(
        || {
            attempts.set(attempts.get() + 1);
            if attempts.get() < 3 {
                Err(StructureError::TransientIoError("busy".into()))
            } else {
                Ok(attempts.get())
            }
        },
        3,
        0,
        "test",
    );
    assert_eq!(result.unwrap(), 3);

    attempts.set(0);
    let result: Result<(), _> = retry_io_operation(
        || {
            attempts.set(attempts.get() + 1);
            Err(StructureError::IoError("denied".into()))
        },
        3,
        0,
        "test",
    );
    assert!(result.is_err());
    assert_eq!(attempts.get(), 1);

    attempts.set(0);
    let result: Result<(), _> = retry_io_operation(
        || {
            attempts.set(attempts.get() + 1);
            Err(StructureError::TransientIoError("busy".into()))
        },
        2,
        0,
        "test",
    );
    assert!(result.is_err());
    assert_eq!(attempts.get(), 3);
}
