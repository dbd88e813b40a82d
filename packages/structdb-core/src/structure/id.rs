use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::value::Value;

/// Kind of identifier a structure type uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdType {
    /// 64-bit sequential id handed out through range checkout
    Identity,
    /// 128-bit UUID generated without coordination
    Guid,
}

impl fmt::Display for IdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdType::Identity => f.write_str("Identity"),
            IdType::Guid => f.write_str("Guid"),
        }
    }
}

/// Identifier value of one structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StructureId {
    Identity(i64),
    Guid(Uuid),
}

impl StructureId {
    /// Generates a fresh random UUID id.
    pub fn new_guid() -> Self {
        StructureId::Guid(Uuid::new_v4())
    }

    pub fn id_type(&self) -> IdType {
        match self {
            StructureId::Identity(_) => IdType::Identity,
            StructureId::Guid(_) => IdType::Guid,
        }
    }

    /// `false` for the default values (`0` and the nil UUID).
    pub fn is_assigned(&self) -> bool {
        match self {
            StructureId::Identity(v) => *v != 0,
            StructureId::Guid(v) => !v.is_nil(),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            StructureId::Identity(v) => Value::Integer(*v),
            StructureId::Guid(v) => Value::Uuid(*v),
        }
    }
}

impl fmt::Display for StructureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructureId::Identity(v) => write!(f, "{}", v),
            StructureId::Guid(v) => write!(f, "{}", v),
        }
    }
}
