//! Store configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum number of structures per bulk-copy batch
    pub max_batch_size: usize,
    /// Load the structures and indexes streams concurrently
    pub parallel_inserts: bool,
    /// Directory holding the identity seed file
    pub data_dir: PathBuf,
    /// First value handed out for a structure that has no seed yet
    pub identity_seed_start: i64,
    /// Maximum retry attempts for transient I/O errors
    pub persistence_max_retries: u32,
    /// Delay between retry attempts in milliseconds
    pub persistence_retry_delay_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 1000,
            parallel_inserts: false,
            data_dir: PathBuf::from("./data"),
            identity_seed_start: 1,
            persistence_max_retries: 3,      // Default retry attempts
            persistence_retry_delay_ms: 100, // 100ms delay between retries
        }
    }
}
