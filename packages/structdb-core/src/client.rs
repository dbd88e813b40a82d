//! Boundary contracts for the external collaborators the core drives.
//!
//! Physical implementations (a relational driver, a bulk-copy API, a
//! durable counter store) live outside this crate. `memory::MemoryBackend`
//! implements them in memory.

use serde_json::Value as Json;

use crate::bulk::RowSource;
use crate::error::Result;
use crate::query::SqlCommandInfo;
use crate::schema::DbSchemaNames;
use crate::sync::{DbColumn, DbUniqueIndex, SchemaChange};
use crate::value::Value;

/// High-throughput physical loader.
pub trait BulkCopyClient: Send + Sync {
    /// Loads every row of `rows` into `table`.
    ///
    /// # Arguments
    /// * `table` - Destination table name
    /// * `columns` - Column names in row ordinal order
    /// * `rows` - Ordinal-addressed row source
    ///
    /// # Returns
    /// `Result<usize>` with the number of rows written.
    fn write(&self, table: &str, columns: &[String], rows: &mut dyn RowSource) -> Result<usize>;
}

/// Reports the live physical shape of a structure's index table.
pub trait ShapeInspector: Send + Sync {
    /// Columns currently present, in physical order.
    fn columns(&self, names: &DbSchemaNames) -> Result<Vec<DbColumn>>;

    /// Unique indexes currently defined on the index table.
    fn unique_indexes(&self, names: &DbSchemaNames) -> Result<Vec<DbUniqueIndex>>;
}

/// Applies schema changes to the physical shape.
pub trait SchemaWriter: Send + Sync {
    fn apply(&self, names: &DbSchemaNames, changes: &[SchemaChange]) -> Result<()>;
}

/// Relational execution client consuming compiled commands.
pub trait SqlExecutor: Send + Sync {
    /// Runs a select and returns the serialized body of each row, in order.
    fn read_json(&self, command: &SqlCommandInfo) -> Result<Vec<String>>;

    /// Runs a command returning a single value.
    fn execute_scalar(&self, command: &SqlCommandInfo) -> Result<Value>;
}

/// Durable high-water marks backing the identity generator.
pub trait IdentitySeedStore: Send + Sync {
    /// Next unused identity for a structure, `None` when never persisted.
    fn read_seed(&self, structure: &str) -> Result<Option<i64>>;

    /// Records `next` as the next unused identity. Lower values than the
    /// stored one are ignored.
    fn write_seed(&self, structure: &str, next: i64) -> Result<()>;
}

/// Turns a document projection into its persisted body and back.
pub trait StructureSerializer: Send + Sync {
    fn serialize(&self, projection: &Json) -> Result<String>;

    fn deserialize(&self, body: &str) -> Result<Json>;
}

/// Compact JSON text bodies.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSerializer;

impl StructureSerializer for JsonSerializer {
    fn serialize(&self, projection: &Json) -> Result<String> {
        Ok(serde_json::to_string(projection)?)
    }

    fn deserialize(&self, body: &str) -> Result<Json> {
        Ok(serde_json::from_str(body)?)
    }
}
