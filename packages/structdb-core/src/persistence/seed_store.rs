//! File-backed identity seed store.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crc32fast::Hasher;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::client::IdentitySeedStore;
use crate::config::StoreConfig;
use crate::error::{Result, StructureError};

use super::io_utils::{classify_io_error, retry_io_operation};

const SEED_FILE: &str = "identity_seeds.json";
const SEED_FILE_TMP: &str = "identity_seeds.json.tmp";
const SEED_FILE_VERSION: u32 = 1;

/// Seed file format.
#[derive(Debug, Serialize, Deserialize)]
struct SeedFile {
    /// File format version
    version: u32,
    /// Next unused identity per structure name
    seeds: BTreeMap<String, i64>,
    /// CRC-32 of the serialized `seeds`
    checksum: u32,
}

fn seeds_checksum(seeds: &BTreeMap<String, i64>) -> Result<u32> {
    let bytes = serde_json::to_vec(seeds)?;
    let mut hasher = Hasher::new();
    hasher.update(&bytes);
    Ok(hasher.finalize())
}

/// Persists identity high-water marks as a checksummed JSON file in the
/// data directory. Every write replaces the file through a temp file and
/// an atomic rename.
#[derive(Debug)]
pub struct FileIdentitySeedStore {
    data_dir: PathBuf,
    max_retries: u32,
    retry_delay_ms: u64,
    seeds: Mutex<BTreeMap<String, i64>>,
}

impl FileIdentitySeedStore {
    /// Opens the store, loading an existing seed file if there is one.
    ///
    /// # Returns
    /// `Result<Self>`; fails with `DataCorruption` when the file's checksum
    /// does not match its contents.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let seeds = retry_io_operation(
            || load_seeds(&config.data_dir),
            config.persistence_max_retries,
            config.persistence_retry_delay_ms,
            "load_identity_seeds",
        )?;
        Ok(Self {
            data_dir: config.data_dir.clone(),
            max_retries: config.persistence_max_retries,
            retry_delay_ms: config.persistence_retry_delay_ms,
            seeds: Mutex::new(seeds),
        })
    }

    pub fn path(&self) -> PathBuf {
        self.data_dir.join(SEED_FILE)
    }

    /// Snapshot of every persisted seed.
    pub fn seeds(&self) -> BTreeMap<String, i64> {
        self.seeds.lock().clone()
    }

    fn save(&self, seeds: &BTreeMap<String, i64>) -> Result<()> {
        retry_io_operation(
            || save_seeds(&self.data_dir, seeds),
            self.max_retries,
            self.retry_delay_ms,
            "save_identity_seeds",
        )
    }
}

impl IdentitySeedStore for FileIdentitySeedStore {
    fn read_seed(&self, structure: &str) -> Result<Option<i64>> {
        Ok(self.seeds.lock().get(structure).copied())
    }

    fn write_seed(&self, structure: &str, next: i64) -> Result<()> {
        let mut seeds = self.seeds.lock();
        if seeds.get(structure).is_some_and(|current| *current >= next) {
            return Ok(());
        }
        let previous = seeds.insert(structure.to_string(), next);
        if let Err(err) = self.save(&seeds) {
            match previous {
                Some(value) => seeds.insert(structure.to_string(), value),
                None => seeds.remove(structure),
            };
            return Err(err);
        }
        Ok(())
    }
}

fn load_seeds(data_dir: &Path) -> Result<BTreeMap<String, i64>> {
    let path = data_dir.join(SEED_FILE);
    if !path.exists() {
        return Ok(BTreeMap::new());
    }

    let mut file =
        File::open(&path).map_err(|e| classify_io_error(e, "Failed to open seed file"))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| classify_io_error(e, "Failed to read seed file"))?;

    let seed_file: SeedFile = serde_json::from_str(&contents).map_err(|e| {
        StructureError::DataCorruption(format!("Failed to parse seed file: {}", e))
    })?;
    if seed_file.version != SEED_FILE_VERSION {
        return Err(StructureError::SerializationError(format!(
            "Unsupported seed file version: {}",
            seed_file.version
        )));
    }

    let actual = seeds_checksum(&seed_file.seeds)?;
    if actual != seed_file.checksum {
        return Err(StructureError::DataCorruption(format!(
            "Checksum mismatch for seed file: expected {:08x}, got {:08x}",
            seed_file.checksum, actual
        )));
    }
    Ok(seed_file.seeds)
}

fn save_seeds(data_dir: &Path, seeds: &BTreeMap<String, i64>) -> Result<()> {
    let seed_file = SeedFile {
        version: SEED_FILE_VERSION,
        seeds: seeds.clone(),
        checksum: seeds_checksum(seeds)?,
    };
    let json = serde_json::to_string_pretty(&seed_file)?;

    fs::create_dir_all(data_dir)
        .map_err(|e| classify_io_error(e, "Failed to create data directory"))?;

    let temp_path = data_dir.join(SEED_FILE_TMP);
    let mut file = File::create(&temp_path)
        .map_err(|e| classify_io_error(e, "Failed to create temp seed file"))?;
    file.write_all(json.as_bytes())
        .map_err(|e| classify_io_error(e, "Failed to write seed file"))?;
    file.sync_all()
        .map_err(|e| classify_io_error(e, "Failed to sync seed file"))?;

    fs::rename(&temp_path, data_dir.join(SEED_FILE))
        .map_err(|e| classify_io_error(e, "Failed to rename seed file"))?;
    Ok(())
}
