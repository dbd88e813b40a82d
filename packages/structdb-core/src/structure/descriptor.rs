//! Type descriptors consumed by the structure type reflector.

use serde::{Deserialize, Serialize};

use crate::value::DataType;

/// Scope in which a member value must be unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UniqueMode {
    /// Unique across all structures of the type
    PerType,
    /// Unique among sibling values within one structure
    PerInstance,
}

/// Shape of a member's value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MemberKind {
    /// Flat value of a known data type
    Scalar { data_type: DataType, nullable: bool },
    /// Nested object flattened into dotted paths
    Object(Vec<MemberDescriptor>),
    /// Sequence whose elements have the inner kind
    Sequence(Box<MemberKind>),
    /// Function/closure value; never indexable
    Function,
}

impl MemberKind {
    pub fn scalar(data_type: DataType) -> Self {
        MemberKind::Scalar {
            data_type,
            nullable: false,
        }
    }

    pub fn object(members: Vec<MemberDescriptor>) -> Self {
        MemberKind::Object(members)
    }

    fn describe(&self) -> String {
        match self {
            MemberKind::Scalar { data_type, nullable } if *nullable => format!("{}?", data_type),
            MemberKind::Scalar { data_type, .. } => data_type.to_string(),
            MemberKind::Object(_) => "Object".to_string(),
            MemberKind::Sequence(inner) => format!("Sequence<{}>", inner.describe()),
            MemberKind::Function => "Function".to_string(),
        }
    }
}

/// One member of a document type together with its annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberDescriptor {
    /// Member name as it appears in the serialized document
    pub name: String,
    /// Value shape
    pub kind: MemberKind,
    /// Explicit id annotation
    pub is_id: bool,
    /// Excluded from indexing
    pub excluded: bool,
    /// Uniqueness annotation
    pub unique: Option<UniqueMode>,
}

impl MemberDescriptor {
    pub fn new(name: impl Into<String>, kind: MemberKind) -> Self {
        Self {
            name: name.into(),
            kind,
            is_id: false,
            excluded: false,
            unique: None,
        }
    }

    pub fn scalar(name: impl Into<String>, data_type: DataType) -> Self {
        Self::new(name, MemberKind::scalar(data_type))
    }

    pub fn nullable(name: impl Into<String>, data_type: DataType) -> Self {
        Self::new(
            name,
            MemberKind::Scalar {
                data_type,
                nullable: true,
            },
        )
    }

    pub fn object(name: impl Into<String>, members: Vec<MemberDescriptor>) -> Self {
        Self::new(name, MemberKind::Object(members))
    }

    pub fn sequence(name: impl Into<String>, element: MemberKind) -> Self {
        Self::new(name, MemberKind::Sequence(Box::new(element)))
    }

    pub fn function(name: impl Into<String>) -> Self {
        Self::new(name, MemberKind::Function)
    }

    /// Marks the member as the structure id.
    pub fn id(mut self) -> Self {
        self.is_id = true;
        self
    }

    /// Excludes the member from indexing.
    pub fn excluded(mut self) -> Self {
        self.excluded = true;
        self
    }

    pub fn unique(mut self, mode: UniqueMode) -> Self {
        self.unique = Some(mode);
        self
    }

    /// Human-readable kind, used in error messages.
    pub fn kind_name(&self) -> String {
        self.kind.describe()
    }
}

/// Descriptor of a document type: its name and ordered members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub name: String,
    pub members: Vec<MemberDescriptor>,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    /// Appends a member, builder style.
    pub fn member(mut self, member: MemberDescriptor) -> Self {
        self.members.push(member);
        self
    }
}
