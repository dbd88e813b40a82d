//! Index row extraction and uniqueness checks.

use std::collections::HashSet;

use serde_json::Value as Json;

use crate::error::{Result, StructureError};
use crate::schema::{IndexAccessor, StructureSchema};
use crate::structure::{StructureId, UniqueMode};
use crate::value::Value;

/// One index row: a single value of one accessor on one structure.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureIndex {
    /// Owning structure
    pub structure_id: StructureId,
    /// Accessor ordinal (1-based)
    pub ordinal: usize,
    /// Accessor column name
    pub name: String,
    pub value: Value,
    /// Element position for enumerable accessors
    pub sort_order: Option<usize>,
}

/// Reads index rows off document projections.
#[derive(Debug, Default, Clone, Copy)]
pub struct IndexesExtractor;

impl IndexesExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extracts every index row of one document.
    ///
    /// Scalar accessors yield exactly one row; enumerable accessors yield one
    /// row per element present. `PerInstance` unique accessors are checked here.
    pub fn extract(
        &self,
        schema: &StructureSchema,
        structure_id: StructureId,
        projection: &Json,
    ) -> Result<Vec<StructureIndex>> {
        let mut rows = Vec::with_capacity(schema.index_accessors.len());
        for accessor in &schema.index_accessors {
            let values = accessor.values(projection)?;
            if accessor.unique_mode == Some(UniqueMode::PerInstance) {
                ensure_distinct(schema, accessor, &values)?;
            }
            for (position, value) in values.into_iter().enumerate() {
                rows.push(StructureIndex {
                    structure_id,
                    ordinal: accessor.ordinal,
                    name: accessor.name.clone(),
                    value,
                    sort_order: accessor.is_element_of_enumerable.then_some(position),
                });
            }
        }
        Ok(rows)
    }
}

fn ensure_distinct(schema: &StructureSchema, accessor: &IndexAccessor, values: &[Value]) -> Result<()> {
    let mut seen = HashSet::with_capacity(values.len());
    for value in values.iter().filter(|v| !v.is_null()) {
        if !seen.insert(value.identity_key()) {
            return Err(violation(schema, accessor, value));
        }
    }
    Ok(())
}

fn violation(schema: &StructureSchema, accessor: &IndexAccessor, value: &Value) -> StructureError {
    StructureError::UniqueConstraintViolation {
        structure: schema.name.clone(),
        path: accessor.path.clone(),
        value: value.to_string(),
    }
}

/// Tracks `PerType` unique values across the batches of one insert call.
#[derive(Debug, Default)]
pub struct UniquenessGuard {
    seen: HashSet<(usize, String)>,
}

impl UniquenessGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the unique values of one document's rows, failing on a repeat.
    /// Repeats within the same document are allowed for enumerable accessors.
    pub fn check(&mut self, schema: &StructureSchema, rows: &[StructureIndex]) -> Result<()> {
        let mut current: HashSet<(usize, String)> = HashSet::new();
        for row in rows.iter().filter(|r| !r.value.is_null()) {
            let Some(accessor) = schema.index_accessor_at(row.ordinal) else {
                continue;
            };
            if accessor.unique_mode != Some(UniqueMode::PerType) {
                continue;
            }
            let key = (row.ordinal, row.value.identity_key());
            if self.seen.contains(&key) {
                return Err(violation(schema, accessor, &row.value));
            }
            current.insert(key);
        }
        self.seen.extend(current);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
