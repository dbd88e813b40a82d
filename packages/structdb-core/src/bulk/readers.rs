//! Ordinal-addressed row sources over built structure rows.

use crate::error::{Result, StructureError};
use crate::schema::{DbSchemaNames, StructureSchema};
use crate::value::Value;

use super::builder::StructureRow;
use super::indexes::StructureIndex;

/// Forward-only row cursor read by ordinal, consumed by bulk-copy clients.
pub trait RowSource {
    /// Number of ordinals per row.
    fn field_count(&self) -> usize;

    /// Advances to the next row; `false` once exhausted.
    fn read(&mut self) -> bool;

    /// Value at `ordinal` of the current row.
    fn get(&self, ordinal: usize) -> Result<Value>;
}

fn no_current_row() -> StructureError {
    StructureError::Backend("Row source read before the first row or after the last".to_string())
}

fn ordinal_out_of_range(ordinal: usize, count: usize) -> StructureError {
    StructureError::Backend(format!(
        "Ordinal {} out of range for {} field(s)",
        ordinal, count
    ))
}

/// Rows of the structures table: `StructureId`, `Json`.
#[derive(Debug)]
pub struct StructuresReader<'a> {
    rows: &'a [StructureRow],
    position: Option<usize>,
}

impl<'a> StructuresReader<'a> {
    pub fn new(rows: &'a [StructureRow]) -> Self {
        Self {
            rows,
            position: None,
        }
    }

    pub fn columns() -> Vec<String> {
        DbSchemaNames::structure_columns()
            .iter()
            .map(|c| c.to_string())
            .collect()
    }

    fn current(&self) -> Result<&'a StructureRow> {
        self.position
            .and_then(|p| self.rows.get(p))
            .ok_or_else(no_current_row)
    }
}

impl RowSource for StructuresReader<'_> {
    fn field_count(&self) -> usize {
        2
    }

    fn read(&mut self) -> bool {
        let next = self.position.map_or(0, |p| p + 1);
        self.position = Some(next.min(self.rows.len()));
        next < self.rows.len()
    }

    fn get(&self, ordinal: usize) -> Result<Value> {
        let row = self.current()?;
        match ordinal {
            0 => Ok(row.id.to_value()),
            1 => Ok(Value::Text(row.json.clone())),
            _ => Err(ordinal_out_of_range(ordinal, 2)),
        }
    }
}

/// Rows of the sparse indexes table.
///
/// Ordinal 0 is the owner id, ordinal `n` the value column of accessor `n`,
/// and the last ordinal the sort order. Each row sets only its own
/// accessor's column; the others read as `Null`. A logical
/// `(owner id, index ordinal, value, sort order)` index row therefore has
/// no ordinal column of its own: the index ordinal is the position of the
/// one non-null value column.
#[derive(Debug)]
pub struct IndexesReader<'a> {
    indexes: Vec<&'a StructureIndex>,
    field_count: usize,
    position: Option<usize>,
}

impl<'a> IndexesReader<'a> {
    pub fn new(schema: &StructureSchema, rows: &'a [StructureRow]) -> Self {
        Self {
            indexes: rows.iter().flat_map(|r| r.indexes.iter()).collect(),
            field_count: schema.field_count() + 1,
            position: None,
        }
    }

    pub fn columns(schema: &StructureSchema) -> Vec<String> {
        DbSchemaNames::index_columns(schema)
    }

    /// Total number of rows the reader yields.
    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }
}

impl RowSource for IndexesReader<'_> {
    fn field_count(&self) -> usize {
        self.field_count
    }

    fn read(&mut self) -> bool {
        let next = self.position.map_or(0, |p| p + 1);
        self.position = Some(next.min(self.indexes.len()));
        next < self.indexes.len()
    }

    fn get(&self, ordinal: usize) -> Result<Value> {
        let index = self
            .position
            .and_then(|p| self.indexes.get(p))
            .ok_or_else(no_current_row)?;

        let sort_order = self.field_count - 1;
        match ordinal {
            0 => Ok(index.structure_id.to_value()),
            o if o == sort_order => Ok(index
                .sort_order
                .map_or(Value::Null, |s| Value::Integer(s as i64))),
            o if o == index.ordinal => Ok(index.value.clone()),
            o if o < sort_order => Ok(Value::Null),
            o => Err(ordinal_out_of_range(o, self.field_count)),
        }
    }
}
