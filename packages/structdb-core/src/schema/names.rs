//! Deterministic relational object names for a structure.

use super::schema::StructureSchema;

/// Fixed column holding the owning structure's id.
pub const STRUCTURE_ID_COLUMN: &str = "StructureId";
/// Fixed column holding the serialized body.
pub const JSON_COLUMN: &str = "Json";
/// Fixed column holding an element's position within its sequence.
pub const SORT_ORDER_COLUMN: &str = "SortOrder";

/// Column name for a dotted member path.
pub fn column_name_for_path(path: &str) -> String {
    path.replace('.', "_")
}

/// Relational object names used by one structure type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbSchemaNames {
    pub structure_name: String,
    pub structures_table: String,
    pub indexes_table: String,
    hash: Option<String>,
}

impl DbSchemaNames {
    pub fn for_schema(schema: &StructureSchema) -> Self {
        let mut names = Self::for_name(&schema.name);
        names.hash = Some(schema.hash.clone());
        names
    }

    /// Names for a structure known only by name, e.g. an include target.
    pub fn for_name(structure_name: &str) -> Self {
        Self {
            structure_name: structure_name.to_string(),
            structures_table: format!("{}Structures", structure_name),
            indexes_table: format!("{}Indexes", structure_name),
            hash: None,
        }
    }

    /// Name of the unique index guarding `column`.
    pub fn unique_index(&self, column: &str) -> String {
        match &self.hash {
            Some(hash) => format!("UQ_{}_{}_{}", self.structure_name, hash, column),
            None => format!("UQ_{}_{}", self.structure_name, column),
        }
    }

    /// Columns of the structures table in projection order.
    pub fn structure_columns() -> [&'static str; 2] {
        [STRUCTURE_ID_COLUMN, JSON_COLUMN]
    }

    /// Columns of the indexes table in projection order.
    pub fn index_columns(schema: &StructureSchema) -> Vec<String> {
        let mut columns = Vec::with_capacity(schema.index_accessors.len() + 2);
        columns.push(STRUCTURE_ID_COLUMN.to_string());
        columns.extend(schema.index_accessors.iter().map(|a| a.name.clone()));
        columns.push(SORT_ORDER_COLUMN.to_string());
        columns
    }

    /// Columns every indexes table has regardless of the schema.
    pub fn is_system_column(column: &str) -> bool {
        column == STRUCTURE_ID_COLUMN || column == SORT_ORDER_COLUMN
    }
}
