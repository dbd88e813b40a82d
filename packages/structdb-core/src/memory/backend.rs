//! In-memory tables implementing the external client contracts.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::bulk::RowSource;
use crate::client::{BulkCopyClient, IdentitySeedStore, SchemaWriter, ShapeInspector};
use crate::error::{Result, StructureError};
use crate::schema::{DbSchemaNames, StructureSchema, SORT_ORDER_COLUMN, STRUCTURE_ID_COLUMN};
use crate::sync::{DbColumn, DbUniqueIndex, SchemaChange};
use crate::value::Value;

/// One in-memory table: rows of named column values, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    rows: Vec<HashMap<String, Value>>,
}

impl MemoryTable {
    pub fn rows(&self) -> &[HashMap<String, Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Registered shape of one index table.
#[derive(Debug, Clone)]
struct TableShape {
    structure: String,
    columns: Vec<DbColumn>,
    unique: Vec<DbUniqueIndex>,
}

impl TableShape {
    fn new(structure: &str) -> Self {
        Self {
            structure: structure.to_string(),
            columns: vec![
                DbColumn::new(STRUCTURE_ID_COLUMN, "sql_variant"),
                DbColumn::new(SORT_ORDER_COLUMN, "int"),
            ],
            unique: Vec::new(),
        }
    }
}

/// In-memory relational backend.
///
/// Index tables registered through `SchemaWriter` have a fixed column
/// shape; bulk copies into them naming an unknown column fail the way a
/// relational server would. Unique indexes reject a non-null value already
/// stored under another owner; one owner may repeat a value across its
/// enumerable elements.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: RwLock<HashMap<String, MemoryTable>>,
    shapes: RwLock<HashMap<String, TableShape>>,
    seeds: RwLock<HashMap<String, i64>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a table, `None` if nothing was ever written to it.
    pub fn table(&self, name: &str) -> Option<MemoryTable> {
        self.tables.read().get(name).cloned()
    }

    pub fn row_count(&self, name: &str) -> usize {
        self.tables.read().get(name).map_or(0, MemoryTable::len)
    }

    /// Drops every table and shape of a structure.
    pub fn drop_structure(&self, schema: &StructureSchema) {
        let names = DbSchemaNames::for_schema(schema);
        {
            let mut tables = self.tables.write();
            tables.remove(&names.structures_table);
            tables.remove(&names.indexes_table);
        }
        self.shapes.write().remove(&names.indexes_table);
    }

    pub(crate) fn with_tables<R>(&self, f: impl FnOnce(&HashMap<String, MemoryTable>) -> R) -> R {
        f(&self.tables.read())
    }
}

impl BulkCopyClient for MemoryBackend {
    fn write(&self, table: &str, columns: &[String], rows: &mut dyn RowSource) -> Result<usize> {
        if columns.len() != rows.field_count() {
            return Err(StructureError::Backend(format!(
                "Column list of {} name(s) does not match {} field(s) for table '{}'",
                columns.len(),
                rows.field_count(),
                table
            )));
        }
        let shape = self.shapes.read().get(table).cloned();
        if let Some(shape) = &shape {
            if let Some(missing) = columns
                .iter()
                .find(|c| !shape.columns.iter().any(|s| &s.name == *c))
            {
                return Err(StructureError::Backend(format!(
                    "Invalid column name '{}' for table '{}'",
                    missing, table
                )));
            }
        }

        // Rows are staged so a failing source leaves the table untouched.
        let mut staged = Vec::new();
        while rows.read() {
            let mut row = HashMap::with_capacity(columns.len());
            for (ordinal, column) in columns.iter().enumerate() {
                row.insert(column.clone(), rows.get(ordinal)?);
            }
            staged.push(row);
        }

        let count = staged.len();
        let mut tables = self.tables.write();
        let target = tables.entry(table.to_string()).or_default();
        if let Some(shape) = &shape {
            for index in &shape.unique {
                ensure_unique(&shape.structure, &index.column, target.rows.iter().chain(&staged))?;
            }
        }
        target.rows.extend(staged);
        Ok(count)
    }
}

/// Fails on the first non-null `column` value owned by two structures.
fn ensure_unique<'a>(
    structure: &str,
    column: &str,
    rows: impl Iterator<Item = &'a HashMap<String, Value>>,
) -> Result<()> {
    let mut owners: HashMap<String, String> = HashMap::new();
    for row in rows {
        let Some(value) = row.get(column).filter(|v| !v.is_null()) else {
            continue;
        };
        let owner = row
            .get(STRUCTURE_ID_COLUMN)
            .map(Value::identity_key)
            .unwrap_or_default();
        match owners.get(&value.identity_key()) {
            Some(first) if *first != owner => {
                return Err(StructureError::UniqueConstraintViolation {
                    structure: structure.to_string(),
                    path: column.to_string(),
                    value: value.to_string(),
                });
            }
            Some(_) => {}
            None => {
                owners.insert(value.identity_key(), owner);
            }
        }
    }
    Ok(())
}

impl ShapeInspector for MemoryBackend {
    fn columns(&self, names: &DbSchemaNames) -> Result<Vec<DbColumn>> {
        Ok(self
            .shapes
            .read()
            .get(&names.indexes_table)
            .map(|shape| shape.columns.clone())
            .unwrap_or_default())
    }

    fn unique_indexes(&self, names: &DbSchemaNames) -> Result<Vec<DbUniqueIndex>> {
        Ok(self
            .shapes
            .read()
            .get(&names.indexes_table)
            .map(|shape| shape.unique.clone())
            .unwrap_or_default())
    }
}

impl SchemaWriter for MemoryBackend {
    fn apply(&self, names: &DbSchemaNames, changes: &[SchemaChange]) -> Result<()> {
        let mut shapes = self.shapes.write();
        let shape = shapes
            .entry(names.indexes_table.clone())
            .or_insert_with(|| TableShape::new(&names.structure_name));

        let mut dropped = Vec::new();
        for change in changes {
            match change {
                SchemaChange::AddColumn { name, db_type } => {
                    if !shape.columns.iter().any(|c| &c.name == name) {
                        shape.columns.push(DbColumn::new(name.clone(), db_type.clone()));
                    }
                }
                SchemaChange::DropColumn { name, .. } => {
                    if DbSchemaNames::is_system_column(name) {
                        return Err(StructureError::Backend(format!(
                            "Refusing to drop system column '{}'",
                            name
                        )));
                    }
                    shape.columns.retain(|c| &c.name != name);
                    shape.unique.retain(|u| &u.column != name);
                    dropped.push(name.clone());
                }
                SchemaChange::AddUniqueIndex { name, column } => {
                    if !shape.columns.iter().any(|c| &c.name == column) {
                        return Err(StructureError::Backend(format!(
                            "Cannot create unique index '{}' on missing column '{}'",
                            name, column
                        )));
                    }
                    if !shape.unique.iter().any(|u| &u.name == name) {
                        if let Some(table) = self.tables.read().get(&names.indexes_table) {
                            ensure_unique(&shape.structure, change.column(), table.rows.iter())?;
                        }
                        shape.unique.push(DbUniqueIndex::new(name.clone(), column.clone()));
                    }
                }
                SchemaChange::DropUniqueIndex { name, .. } => {
                    shape.unique.retain(|u| &u.name != name);
                }
            }
        }
        drop(shapes);

        if dropped.is_empty() {
            return Ok(());
        }
        if let Some(table) = self.tables.write().get_mut(&names.indexes_table) {
            for row in &mut table.rows {
                for name in &dropped {
                    row.remove(name);
                }
            }
        }
        Ok(())
    }
}

impl IdentitySeedStore for MemoryBackend {
    fn read_seed(&self, structure: &str) -> Result<Option<i64>> {
        Ok(self.seeds.read().get(structure).copied())
    }

    fn write_seed(&self, structure: &str, next: i64) -> Result<()> {
        let mut seeds = self.seeds.write();
        let entry = seeds.entry(structure.to_string()).or_insert(next);
        *entry = (*entry).max(next);
        Ok(())
    }
}
