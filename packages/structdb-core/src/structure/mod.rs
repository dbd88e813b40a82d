//! Document types, their descriptors, and structure identifiers.

mod descriptor;
mod id;

pub use descriptor::{MemberDescriptor, MemberKind, TypeDescriptor, UniqueMode};
pub use id::{IdType, StructureId};

use serde::Serialize;

/// A document type that can be persisted as a structure.
///
/// Implemented once per concrete document type. `describe` feeds the
/// reflector; the id methods are the read/write capability the schema's
/// `IdAccessor` dispatches to, so no runtime reflection is involved.
pub trait Structure: Serialize + Send + Sync {
    /// Describes the members of the document type.
    fn describe() -> TypeDescriptor
    where
        Self: Sized;

    /// Returns the current id, `None` when the document has none yet.
    fn structure_id(&self) -> Option<StructureId>;

    /// Writes an assigned id back onto the document.
    fn set_structure_id(&mut self, id: StructureId);
}
