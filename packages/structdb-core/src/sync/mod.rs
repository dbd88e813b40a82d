//! Schema synchronization: diffing a schema against the live index table
//! shape and applying the result.

mod change;
mod synchronizer;

pub use change::{DbColumn, DbUniqueIndex, SchemaChange};
pub use synchronizer::{diff, SchemaSynchronizer};
