use serde::{Deserialize, Serialize};

/// One column of a live index table, as reported by the shape inspector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbColumn {
    /// Column name
    pub name: String,
    /// Relational column type
    pub db_type: String,
}

impl DbColumn {
    pub fn new(name: impl Into<String>, db_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            db_type: db_type.into(),
        }
    }
}

/// One unique index of a live index table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbUniqueIndex {
    /// Index name
    pub name: String,
    /// Indexed column
    pub column: String,
}

impl DbUniqueIndex {
    pub fn new(name: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column: column.into(),
        }
    }
}

/// Represents a single change to a structure's index table shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemaChange {
    /// Add a column for a new index accessor
    AddColumn {
        /// Column name
        name: String,
        /// Relational column type
        db_type: String,
    },
    /// Drop a column no accessor maps to anymore
    DropColumn {
        /// Column name
        name: String,
        /// Relational column type as found
        db_type: String,
    },
    /// Create the unique index guarding a `PerType` unique column
    AddUniqueIndex {
        /// Index name
        name: String,
        /// Indexed column
        column: String,
    },
    /// Drop a unique index no accessor asks for anymore
    DropUniqueIndex {
        /// Index name
        name: String,
        /// Indexed column
        column: String,
    },
}

impl SchemaChange {
    /// Column the change touches.
    pub fn column(&self) -> &str {
        match self {
            SchemaChange::AddColumn { name, .. } | SchemaChange::DropColumn { name, .. } => name,
            SchemaChange::AddUniqueIndex { column, .. }
            | SchemaChange::DropUniqueIndex { column, .. } => column,
        }
    }

    pub fn is_destructive(&self) -> bool {
        matches!(
            self,
            SchemaChange::DropColumn { .. } | SchemaChange::DropUniqueIndex { .. }
        )
    }
}
