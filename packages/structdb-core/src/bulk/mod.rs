//! Bulk structure loading: id assignment, index extraction, batching and
//! the ordinal-addressed streams handed to the bulk-copy client.

mod builder;
mod identity;
mod indexes;
mod inserter;
mod readers;

pub use builder::{StructureBuilder, StructureRow};
pub use identity::IdentityGenerator;
pub use indexes::{IndexesExtractor, StructureIndex, UniquenessGuard};
pub use inserter::{BulkInserter, BulkTargets, InsertSummary};
pub use readers::{IndexesReader, RowSource, StructuresReader};
