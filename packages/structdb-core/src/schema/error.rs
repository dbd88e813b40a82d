/// Error type for reflecting document types and building schemas.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SchemaError {
    #[error("Structure '{structure}' has no id member")]
    MissingIdMember { structure: String },

    #[error("Structure '{structure}' has more than one id member: {members:?}")]
    AmbiguousIdMember {
        structure: String,
        members: Vec<String>,
    },

    #[error("Structure '{structure}' has no indexable members")]
    MissingIndexableMembers { structure: String },

    #[error("Id member '{member}' of structure '{structure}' has unsupported type {found}")]
    UnsupportedIdType {
        structure: String,
        member: String,
        found: String,
    },

    #[error("Member '{member}' of structure '{structure}' has unsupported type {found}")]
    UnsupportedMemberType {
        structure: String,
        member: String,
        found: String,
    },

    #[error("Structure '{structure}' declares member path '{path}' twice")]
    DuplicateMemberPath { structure: String, path: String },

    #[error("Member '{path}' of structure '{structure}' maps to reserved column '{column}'")]
    ReservedColumnName {
        structure: String,
        path: String,
        column: String,
    },

    #[error("Members '{first}' and '{second}' of structure '{structure}' both map to column '{column}'")]
    ColumnNameCollision {
        structure: String,
        first: String,
        second: String,
        column: String,
    },
}
