//! Immutable relational mapping description of one structure type.

use super::accessors::{IdAccessor, IndexAccessor};

/// Immutable schema of one structure type.
///
/// Built once per type and shared read-only; nothing mutates it after
/// construction. Ordinal 0 of every row projection is the id, ordinal `n`
/// is `index_accessors[n - 1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureSchema {
    /// Document type name
    pub name: String,
    /// Stable hex digest of `name`
    pub hash: String,
    /// Id accessor
    pub id_accessor: IdAccessor,
    /// Index accessors in ordinal order, never empty
    pub index_accessors: Vec<IndexAccessor>,
}

impl StructureSchema {
    /// Looks up an index accessor by dotted member path.
    pub fn index_accessor(&self, path: &str) -> Option<&IndexAccessor> {
        self.index_accessors.iter().find(|a| a.path == path)
    }

    /// Looks up an index accessor by projection ordinal (1-based).
    pub fn index_accessor_at(&self, ordinal: usize) -> Option<&IndexAccessor> {
        ordinal
            .checked_sub(1)
            .and_then(|i| self.index_accessors.get(i))
    }

    /// Accessors carrying a uniqueness annotation.
    pub fn unique_accessors(&self) -> impl Iterator<Item = &IndexAccessor> {
        self.index_accessors.iter().filter(|a| a.is_unique())
    }

    /// Whether a member path refers to the structure id.
    ///
    /// Exactly `Id` always does, as does the id member's own name. Names
    /// that merely start or end with `Id` (e.g. `IdTmp`, `TmpId`) do not.
    pub fn is_id_path(&self, path: &str) -> bool {
        path == "Id" || path == self.id_accessor.path
    }

    /// Number of ordinals in a row projection (id plus index accessors).
    pub fn field_count(&self) -> usize {
        self.index_accessors.len() + 1
    }
}
