//! Structure store error types.

use thiserror::Error;

use crate::schema::SchemaError;

/// Structure store operation errors.
#[derive(Error, Debug, Clone)]
pub enum StructureError {
    /// Document type could not be turned into a schema
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Expression or node shape the parsers/compiler do not handle
    #[error("Unsupported node type: {node}")]
    UnsupportedNodeType { node: String },

    /// Member path referenced by a query is neither the id nor an index accessor
    #[error("Member '{path}' is not indexed for structure '{structure}'")]
    MemberNotIndexed { structure: String, path: String },

    /// Index values could not be read off a document
    #[error("Index extraction failed for '{path}': {reason}")]
    IndexExtractionFailed { path: String, reason: String },

    /// Document carries an id of a kind the schema does not use
    #[error("Unsupported id kind for structure '{structure}': expected {expected}, got {got}")]
    UnsupportedIdKind {
        structure: String,
        expected: String,
        got: String,
    },

    /// Query parameters the backend cannot represent
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Identity range would run past the largest storable id
    #[error("Identity range exhausted for structure '{structure}'")]
    IdentityOverflow { structure: String },

    /// Unique member value seen twice within its uniqueness scope
    #[error("Unique constraint violated for '{structure}'.'{path}' with value {value}")]
    UniqueConstraintViolation {
        structure: String,
        path: String,
        value: String,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Failure reported by an external client (bulk copy, execution, shape inspection)
    #[error("Backend error: {0}")]
    Backend(String),

    /// Lock poisoned
    #[error("Lock poisoned")]
    LockPoisoned,

    /// Data corruption detected
    #[error("Data corruption detected: {0}")]
    DataCorruption(String),

    /// Disk full error during persistence
    #[error("Disk full: {0}")]
    DiskFull(String),

    /// I/O error during persistence
    #[error("I/O error: {0}")]
    IoError(String),

    /// Transient I/O error that may succeed on retry
    #[error("Transient I/O error: {0}")]
    TransientIoError(String),
}

impl StructureError {
    pub(crate) fn unsupported_node(node: impl Into<String>) -> Self {
        Self::UnsupportedNodeType { node: node.into() }
    }

    pub(crate) fn extraction(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::IndexExtractionFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for StructureError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StructureError>;
