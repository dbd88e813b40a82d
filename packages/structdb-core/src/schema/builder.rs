//! Builds immutable structure schemas from reflected types.

use crc32fast::Hasher;

use crate::structure::{Structure, TypeDescriptor};

use super::accessors::{IdAccessor, IndexAccessor};
use super::error::SchemaError;
use super::reflector::{StructureType, StructureTypeReflector};
use super::schema::StructureSchema;

/// Builds `StructureSchema`s. Pure and deterministic.
#[derive(Debug, Default, Clone, Copy)]
pub struct SchemaBuilder {
    reflector: StructureTypeReflector,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self {
            reflector: StructureTypeReflector::new(),
        }
    }

    /// Creates a schema from a reflected structure type.
    ///
    /// # Arguments
    /// * `structure_type` - Output of the reflector
    ///
    /// # Returns
    /// `Result<StructureSchema, SchemaError>`; fails with `MissingIdMember`
    /// or `MissingIndexableMembers`.
    pub fn create_schema(&self, structure_type: &StructureType) -> Result<StructureSchema, SchemaError> {
        let id_member = structure_type
            .id_member
            .as_ref()
            .ok_or_else(|| SchemaError::MissingIdMember {
                structure: structure_type.name.clone(),
            })?;

        if structure_type.index_members.is_empty() {
            return Err(SchemaError::MissingIndexableMembers {
                structure: structure_type.name.clone(),
            });
        }

        let index_accessors = structure_type
            .index_members
            .iter()
            .enumerate()
            .map(|(i, member)| {
                IndexAccessor::new(
                    i + 1,
                    member.path.clone(),
                    member.data_type,
                    member.is_element_of_enumerable,
                    member.unique,
                )
            })
            .collect();

        Ok(StructureSchema {
            name: structure_type.name.clone(),
            hash: compute_hash(&structure_type.name),
            id_accessor: IdAccessor::new(id_member.path.clone(), id_member.id_type),
            index_accessors,
        })
    }

    /// Reflects a descriptor and builds its schema in one step.
    pub fn create_schema_from(&self, descriptor: &TypeDescriptor) -> Result<StructureSchema, SchemaError> {
        let structure_type = self.reflector.reflect(descriptor)?;
        self.create_schema(&structure_type)
    }

    /// Builds the schema of a `Structure` implementor.
    pub fn create_schema_for<T: Structure>(&self) -> Result<StructureSchema, SchemaError> {
        self.create_schema_from(&T::describe())
    }
}

/// CRC-32 of the structure name as 8 lowercase hex characters.
pub(crate) fn compute_hash(name: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(name.as_bytes());
    format!("{:08x}", hasher.finalize())
}
