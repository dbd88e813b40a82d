//! Structure type reflector: flattens a type descriptor into a member map.

use std::collections::HashMap;

use crate::structure::{IdType, MemberDescriptor, MemberKind, TypeDescriptor, UniqueMode};
use crate::value::DataType;

use super::error::SchemaError;
use super::names::{column_name_for_path, DbSchemaNames};

/// The id member of a reflected type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdMember {
    /// Member name on the document
    pub path: String,
    /// Identity or Guid
    pub id_type: IdType,
}

/// One flattened, indexable member path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexMember {
    /// Dotted path from the document root
    pub path: String,
    /// Scalar data type of the leaf
    pub data_type: DataType,
    /// Set when any segment of the path is reached through a sequence
    pub is_element_of_enumerable: bool,
    /// Uniqueness annotation
    pub unique: Option<UniqueMode>,
}

/// Reflected metadata for a document type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureType {
    pub name: String,
    /// Absent while an incomplete type is inspected; the schema builder rejects it
    pub id_member: Option<IdMember>,
    /// Indexable members in declaration order
    pub index_members: Vec<IndexMember>,
}

/// Inspects type descriptors and produces `StructureType`s.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructureTypeReflector;

impl StructureTypeReflector {
    pub fn new() -> Self {
        Self
    }

    /// Reflects a descriptor into a flattened member map.
    ///
    /// # Arguments
    /// * `descriptor` - Document type descriptor
    ///
    /// # Returns
    /// `Result<StructureType, SchemaError>`; fails on more than one id
    /// member, an unsupported id type, a member that cannot be flattened,
    /// or an index column that is reserved or derived from two paths.
    pub fn reflect(&self, descriptor: &TypeDescriptor) -> Result<StructureType, SchemaError> {
        let id_member = self.find_id_member(descriptor)?;
        let id_name = id_member.as_ref().map(|id| id.path.as_str());

        let mut index_members = Vec::new();
        for member in &descriptor.members {
            if Some(member.name.as_str()) == id_name {
                continue;
            }
            self.flatten(
                &descriptor.name,
                member,
                None,
                false,
                member.unique,
                &mut index_members,
            )?;
        }

        let mut columns: HashMap<String, &str> = HashMap::new();
        for member in &index_members {
            let column = column_name_for_path(&member.path);
            if DbSchemaNames::is_system_column(&column) {
                return Err(SchemaError::ReservedColumnName {
                    structure: descriptor.name.clone(),
                    path: member.path.clone(),
                    column,
                });
            }
            if let Some(first) = columns.insert(column.clone(), member.path.as_str()) {
                if first == member.path {
                    return Err(SchemaError::DuplicateMemberPath {
                        structure: descriptor.name.clone(),
                        path: member.path.clone(),
                    });
                }
                return Err(SchemaError::ColumnNameCollision {
                    structure: descriptor.name.clone(),
                    first: first.to_string(),
                    second: member.path.clone(),
                    column,
                });
            }
        }

        Ok(StructureType {
            name: descriptor.name.clone(),
            id_member,
            index_members,
        })
    }

    /// Resolves the id: the annotated member, else `StructureId`,
    /// `<TypeName>Id`, `Id` by convention.
    fn find_id_member(&self, descriptor: &TypeDescriptor) -> Result<Option<IdMember>, SchemaError> {
        let annotated: Vec<&MemberDescriptor> =
            descriptor.members.iter().filter(|m| m.is_id).collect();

        let candidate = match annotated.len() {
            0 => {
                let type_id = format!("{}Id", descriptor.name);
                ["StructureId", type_id.as_str(), "Id"]
                    .iter()
                    .find_map(|name| descriptor.members.iter().find(|m| m.name == *name))
            }
            1 => Some(annotated[0]),
            _ => {
                return Err(SchemaError::AmbiguousIdMember {
                    structure: descriptor.name.clone(),
                    members: annotated.iter().map(|m| m.name.clone()).collect(),
                })
            }
        };

        let Some(member) = candidate else {
            return Ok(None);
        };

        let id_type = match &member.kind {
            MemberKind::Scalar {
                data_type: DataType::Int64,
                ..
            } => IdType::Identity,
            MemberKind::Scalar {
                data_type: DataType::Uuid,
                ..
            } => IdType::Guid,
            _ => {
                return Err(SchemaError::UnsupportedIdType {
                    structure: descriptor.name.clone(),
                    member: member.name.clone(),
                    found: member.kind_name(),
                })
            }
        };

        Ok(Some(IdMember {
            path: member.name.clone(),
            id_type,
        }))
    }

    fn flatten(
        &self,
        structure: &str,
        member: &MemberDescriptor,
        parent: Option<&str>,
        through_enumerable: bool,
        unique: Option<UniqueMode>,
        out: &mut Vec<IndexMember>,
    ) -> Result<(), SchemaError> {
        if member.excluded {
            return Ok(());
        }

        let path = match parent {
            Some(parent) => format!("{}.{}", parent, member.name),
            None => member.name.clone(),
        };

        self.flatten_kind(
            structure,
            &member.kind,
            &path,
            through_enumerable,
            unique,
            out,
        )
    }

    fn flatten_kind(
        &self,
        structure: &str,
        kind: &MemberKind,
        path: &str,
        through_enumerable: bool,
        unique: Option<UniqueMode>,
        out: &mut Vec<IndexMember>,
    ) -> Result<(), SchemaError> {
        match kind {
            MemberKind::Scalar { data_type, .. } => {
                out.push(IndexMember {
                    path: path.to_string(),
                    data_type: *data_type,
                    is_element_of_enumerable: through_enumerable,
                    unique,
                });
                Ok(())
            }
            MemberKind::Object(children) => {
                for child in children {
                    self.flatten(structure, child, Some(path), through_enumerable, child.unique, out)?;
                }
                Ok(())
            }
            // One accessor stands for every element; cardinality is resolved at extraction.
            MemberKind::Sequence(element) => {
                self.flatten_kind(structure, element, path, true, unique, out)
            }
            MemberKind::Function => Err(SchemaError::UnsupportedMemberType {
                structure: structure.to_string(),
                member: path.to_string(),
                found: "Function".to_string(),
            }),
        }
    }
}
