//! Identity checkout under contention and across restarts.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use tempfile::tempdir;

use structdb_core::bulk::IdentityGenerator;
use structdb_core::config::StoreConfig;
use structdb_core::memory::MemoryBackend;
use structdb_core::persistence::FileIdentitySeedStore;
use structdb_core::schema::{SchemaBuilder, StructureSchema, StructureSchemas};
use structdb_core::session::{Session, SessionClients};

use crate::helpers::{RecordingExecutor, StringItem};

fn item_schema() -> StructureSchema {
    SchemaBuilder::new().create_schema_for::<StringItem>().unwrap()
}

#[test]
fn test_concurrent_checkouts_cover_contiguous_range() {
    const THREADS: usize = 8;
    const CHECKOUTS: usize = 100;
    const RANGE: usize = 3;

    let generator = Arc::new(IdentityGenerator::new(100));
    let schema = Arc::new(item_schema());

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let generator = Arc::clone(&generator);
            let schema = Arc::clone(&schema);
            thread::spawn(move || {
                (0..CHECKOUTS)
                    .map(|_| generator.check_out_and_get_seed(&schema, RANGE).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        for start in handle.join().unwrap() {
            for id in start..start + RANGE as i64 {
                assert!(ids.insert(id), "identity {} handed out twice", id);
            }
        }
    }

    let total = (THREADS * CHECKOUTS * RANGE) as i64;
    assert_eq!(ids.len() as i64, total);
    assert_eq!(ids.iter().min(), Some(&100));
    assert_eq!(ids.iter().max(), Some(&(100 + total - 1)));
    assert_eq!(generator.peek("StringItem"), Some(100 + total));
}

#[test]
fn test_file_seeds_survive_session_restart() -> anyhow::Result<()> {
    let temp_dir = tempdir()?;
    let config = StoreConfig {
        data_dir: temp_dir.path().to_path_buf(),
        ..Default::default()
    };

    let open_session = || -> anyhow::Result<Session> {
        let backend = Arc::new(MemoryBackend::new());
        let mut clients = SessionClients::new(
            backend.clone(),
            backend.clone(),
            backend.clone(),
            Arc::new(RecordingExecutor::default()),
        );
        clients.seeds = Some(Arc::new(FileIdentitySeedStore::open(&config)?));
        Ok(Session::new(&config, Arc::new(StructureSchemas::new()), clients))
    };

    let mut first = vec![StringItem::new("A"), StringItem::new("B")];
    open_session()?.insert_many(&mut first)?;
    assert_eq!(first[1].id, 2);

    let mut second = vec![StringItem::new("C")];
    open_session()?.insert_many(&mut second)?;
    assert_eq!(second[0].id, 3);

    let store = FileIdentitySeedStore::open(&config)?;
    assert_eq!(store.seeds().get("StringItem"), Some(&4));
    Ok(())
}
