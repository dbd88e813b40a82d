//! Batched bulk loading of documents of one structure type.

use crate::client::{BulkCopyClient, StructureSerializer};
use crate::config::StoreConfig;
use crate::error::Result;
use crate::schema::{DbSchemaNames, StructureSchema};
use crate::structure::Structure;

use super::builder::{StructureBuilder, StructureRow};
use super::identity::IdentityGenerator;
use super::indexes::UniquenessGuard;
use super::readers::{IndexesReader, StructuresReader};

/// Counts reported by one insert call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertSummary {
    pub batches: usize,
    pub structures: usize,
    pub indexes: usize,
}

/// Destination clients of the two streams.
///
/// In parallel mode each stream runs on its own client; the same client may
/// be passed twice.
#[derive(Clone, Copy)]
pub struct BulkTargets<'a> {
    pub structures: &'a dyn BulkCopyClient,
    pub indexes: &'a dyn BulkCopyClient,
}

impl<'a> BulkTargets<'a> {
    pub fn single(client: &'a dyn BulkCopyClient) -> Self {
        Self {
            structures: client,
            indexes: client,
        }
    }
}

/// Bulk structure loader.
#[derive(Debug, Clone)]
pub struct BulkInserter {
    max_batch_size: usize,
    parallel: bool,
    builder: StructureBuilder,
}

impl BulkInserter {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            max_batch_size: config.max_batch_size.max(1),
            parallel: config.parallel_inserts,
            builder: StructureBuilder::new(),
        }
    }

    /// Loads `items` in batches of at most `max_batch_size`.
    ///
    /// Ids are assigned and written back onto the documents. The schema's
    /// physical shape must already be synchronized.
    ///
    /// `PerType` unique values are checked across the batches of this call;
    /// values stored by earlier calls are rejected by the index table's
    /// unique indexes. Sequential mode writes a batch's index rows before its
    /// structure rows, so a batch the index stream rejects leaves no
    /// structures behind.
    ///
    /// # Returns
    /// `Result<InsertSummary>`; the first failing batch aborts the call and
    /// earlier batches stay written.
    pub fn insert<T: Structure>(
        &self,
        schema: &StructureSchema,
        items: &mut [T],
        identities: &IdentityGenerator,
        serializer: &dyn StructureSerializer,
        targets: BulkTargets<'_>,
    ) -> Result<InsertSummary> {
        let names = DbSchemaNames::for_schema(schema);
        let mut guard = UniquenessGuard::new();
        let mut summary = InsertSummary::default();

        for (number, batch) in items.chunks_mut(self.max_batch_size).enumerate() {
            let ids = self.builder.assign_ids(schema, batch, identities)?;
            let rows = self.builder.build_all(schema, &ids, batch, serializer)?;
            for row in &rows {
                guard.check(schema, &row.indexes)?;
            }

            let (structures, indexes) = if self.parallel {
                self.write_parallel(schema, &names, &rows, targets)?
            } else {
                let indexes = write_indexes(schema, &names, &rows, targets.indexes)?;
                (write_structures(&names, &rows, targets.structures)?, indexes)
            };

            tracing::debug!(
                "Loaded batch {} of '{}': {} structure(s), {} index row(s)",
                number,
                schema.name,
                structures,
                indexes
            );
            summary.batches += 1;
            summary.structures += structures;
            summary.indexes += indexes;
        }

        Ok(summary)
    }

    /// Runs both streams concurrently. There is no atomicity across them: a
    /// failed index stream leaves written structures behind, and applying
    /// the batch's indexes again is the retry path.
    fn write_parallel(
        &self,
        schema: &StructureSchema,
        names: &DbSchemaNames,
        rows: &[StructureRow],
        targets: BulkTargets<'_>,
    ) -> Result<(usize, usize)> {
        let (structures, indexes) = join(
            || write_structures(names, rows, targets.structures),
            || write_indexes(schema, names, rows, targets.indexes),
        )?;

        match (&structures, &indexes) {
            (Ok(_), Err(err)) => tracing::error!(
                "Index stream of '{}' failed after its structures were written: {}",
                names.structure_name,
                err
            ),
            (Err(err), Ok(_)) => tracing::error!(
                "Structure stream of '{}' failed after its indexes were written: {}",
                names.structure_name,
                err
            ),
            _ => {}
        }
        Ok((structures?, indexes?))
    }
}

fn write_structures(
    names: &DbSchemaNames,
    rows: &[StructureRow],
    client: &dyn BulkCopyClient,
) -> Result<usize> {
    let mut reader = StructuresReader::new(rows);
    client.write(&names.structures_table, &StructuresReader::columns(), &mut reader)
}

fn write_indexes(
    schema: &StructureSchema,
    names: &DbSchemaNames,
    rows: &[StructureRow],
    client: &dyn BulkCopyClient,
) -> Result<usize> {
    let mut reader = IndexesReader::new(schema, rows);
    if reader.is_empty() {
        return Ok(0);
    }
    client.write(&names.indexes_table, &IndexesReader::columns(schema), &mut reader)
}

#[cfg(feature = "parallel")]
fn join<A, B, RA, RB>(a: A, b: B) -> Result<(RA, RB)>
where
    A: FnOnce() -> RA + Send,
    B: FnOnce() -> RB + Send,
    RA: Send,
    RB: Send,
{
    Ok(rayon::join(a, b))
}

#[cfg(not(feature = "parallel"))]
fn join<A, B, RA, RB>(a: A, b: B) -> Result<(RA, RB)>
where
    A: FnOnce() -> RA + Send,
    B: FnOnce() -> RB + Send,
    RA: Send,
    RB: Send,
{
    std::thread::scope(|scope| {
        let handle = scope.spawn(a);
        let second = b();
        let first = handle
            .join()
            .map_err(|_| {
                crate::error::StructureError::Backend("Bulk copy worker panicked".to_string())
            })?;
        Ok((first, second))
    })
}
