//! Keeps the physical index table shape in step with a schema.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::client::{SchemaWriter, ShapeInspector};
use crate::error::Result;
use crate::schema::{DbSchemaNames, StructureSchema};
use crate::structure::UniqueMode;

use super::change::{DbColumn, DbUniqueIndex, SchemaChange};

/// Computes the changes turning `existing` into the schema's index shape.
///
/// Column additions come first in schema ordinal order, then unique index
/// additions for `PerType` accessors, then unique index drops, then column
/// drops in existing column order. System columns are never dropped.
pub fn diff(
    schema: &StructureSchema,
    existing: &[DbColumn],
    existing_unique: &[DbUniqueIndex],
) -> Vec<SchemaChange> {
    let present: HashSet<&str> = existing.iter().map(|c| c.name.as_str()).collect();
    let wanted: HashSet<&str> = schema
        .index_accessors
        .iter()
        .map(|a| a.name.as_str())
        .collect();

    let adds = schema
        .index_accessors
        .iter()
        .filter(|a| !present.contains(a.name.as_str()))
        .map(|a| SchemaChange::AddColumn {
            name: a.name.clone(),
            db_type: a.data_type.db_type().to_string(),
        });

    let drops = existing
        .iter()
        .filter(|c| !DbSchemaNames::is_system_column(&c.name) && !wanted.contains(c.name.as_str()))
        .map(|c| SchemaChange::DropColumn {
            name: c.name.clone(),
            db_type: c.db_type.clone(),
        });

    let names = DbSchemaNames::for_schema(schema);
    let wanted_unique: Vec<DbUniqueIndex> = schema
        .unique_accessors()
        .filter(|a| a.unique_mode == Some(UniqueMode::PerType))
        .map(|a| DbUniqueIndex::new(names.unique_index(&a.name), a.name.clone()))
        .collect();

    let unique_adds = wanted_unique
        .iter()
        .filter(|u| !existing_unique.iter().any(|e| e.name == u.name))
        .map(|u| SchemaChange::AddUniqueIndex {
            name: u.name.clone(),
            column: u.column.clone(),
        });

    let unique_drops = existing_unique
        .iter()
        .filter(|e| !wanted_unique.iter().any(|u| u.name == e.name))
        .map(|e| SchemaChange::DropUniqueIndex {
            name: e.name.clone(),
            column: e.column.clone(),
        });

    adds.chain(unique_adds)
        .chain(unique_drops)
        .chain(drops)
        .collect()
}

/// Schema synchronizer with a per-structure cache of the last applied hash.
///
/// Reads of the cache are lock-free; updates publish a new snapshot.
#[derive(Debug, Default)]
pub struct SchemaSynchronizer {
    applied: ArcSwap<HashMap<String, String>>,
}

impl SchemaSynchronizer {
    pub fn new() -> Self {
        Self {
            applied: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    /// Brings the physical shape in line with `schema`.
    ///
    /// # Arguments
    /// * `schema` - Desired schema
    /// * `inspector` - Reports the live columns and unique indexes
    /// * `writer` - Applies the computed changes
    ///
    /// # Returns
    /// `Result<Vec<SchemaChange>>` with the applied changes; empty when the
    /// schema hash was already applied or nothing differs.
    pub fn upsert(
        &self,
        schema: &StructureSchema,
        inspector: &dyn ShapeInspector,
        writer: &dyn SchemaWriter,
    ) -> Result<Vec<SchemaChange>> {
        if self.is_applied(schema) {
            tracing::debug!("Schema for '{}' already applied, skipping", schema.name);
            return Ok(Vec::new());
        }

        let names = DbSchemaNames::for_schema(schema);
        let existing = inspector.columns(&names)?;
        let existing_unique = inspector.unique_indexes(&names)?;
        let changes = diff(schema, &existing, &existing_unique);

        if !changes.is_empty() {
            tracing::debug!(
                "Applying {} schema change(s) to '{}'",
                changes.len(),
                names.indexes_table
            );
            for change in changes.iter().filter(|c| c.is_destructive()) {
                tracing::warn!(
                    "Destructive change on '{}'.'{}': {:?}",
                    names.indexes_table,
                    change.column(),
                    change
                );
            }
            writer.apply(&names, &changes)?;
        }

        let name = schema.name.clone();
        let hash = schema.hash.clone();
        self.applied.rcu(move |current| {
            let mut next = HashMap::clone(current);
            next.insert(name.clone(), hash.clone());
            next
        });

        Ok(changes)
    }

    /// Whether `schema`'s hash is the last one applied for its name.
    pub fn is_applied(&self, schema: &StructureSchema) -> bool {
        self.applied
            .load()
            .get(&schema.name)
            .is_some_and(|hash| *hash == schema.hash)
    }

    /// Drops the cached hash of one structure, forcing the next upsert to diff.
    pub fn forget(&self, name: &str) {
        self.applied.rcu(|current| {
            let mut next = HashMap::clone(current);
            next.remove(name);
            next
        });
    }

    pub fn clear(&self) {
        self.applied.store(Arc::new(HashMap::new()));
    }
}
