//! Id and index accessors held by a structure schema.

use serde_json::Value as Json;

use crate::error::{Result, StructureError};
use crate::structure::{IdType, Structure, StructureId, UniqueMode};
use crate::value::{DataType, Value};

/// Reads and writes the id of a structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdAccessor {
    /// Member name of the id on the document
    pub path: String,
    /// Kind of id the schema uses
    pub id_type: IdType,
}

impl IdAccessor {
    pub fn new(path: impl Into<String>, id_type: IdType) -> Self {
        Self {
            path: path.into(),
            id_type,
        }
    }

    /// Returns the document's id, or `None` when it still holds a default value.
    pub fn get_value<T: Structure>(&self, item: &T) -> Option<StructureId> {
        item.structure_id().filter(StructureId::is_assigned)
    }

    pub fn set_value<T: Structure>(&self, item: &mut T, id: StructureId) {
        item.set_structure_id(id);
    }

    /// Fails with `UnsupportedIdKind` when `id` is not of this accessor's kind.
    pub fn ensure_kind(&self, structure: &str, id: &StructureId) -> Result<()> {
        if id.id_type() != self.id_type {
            return Err(StructureError::UnsupportedIdKind {
                structure: structure.to_string(),
                expected: self.id_type.to_string(),
                got: id.id_type().to_string(),
            });
        }
        Ok(())
    }
}

/// Describes one flattened, indexable member path of a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexAccessor {
    /// Position in the row projection; ordinal 0 is reserved for the id
    pub ordinal: usize,
    /// Dotted member path
    pub path: String,
    /// Column name derived from the path
    pub name: String,
    /// Scalar data type of the leaf
    pub data_type: DataType,
    /// May yield several values per structure
    pub is_element_of_enumerable: bool,
    /// Uniqueness annotation
    pub unique_mode: Option<UniqueMode>,
    segments: Vec<String>,
}

impl IndexAccessor {
    pub(crate) fn new(
        ordinal: usize,
        path: String,
        data_type: DataType,
        is_element_of_enumerable: bool,
        unique_mode: Option<UniqueMode>,
    ) -> Self {
        let segments = path.split('.').map(str::to_string).collect();
        Self {
            ordinal,
            name: super::names::column_name_for_path(&path),
            path,
            data_type,
            is_element_of_enumerable,
            unique_mode,
            segments,
        }
    }

    pub fn is_unique(&self) -> bool {
        self.unique_mode.is_some()
    }

    /// Reads the value(s) of this member off a document's JSON projection.
    ///
    /// A scalar accessor yields exactly one value (`Null` when absent). An
    /// enumerable accessor yields one value per element present, possibly none.
    pub fn values(&self, projection: &Json) -> Result<Vec<Value>> {
        let mut out = Vec::new();
        self.collect(projection, 0, &mut out)?;
        if !self.is_element_of_enumerable && out.is_empty() {
            out.push(Value::Null);
        }
        Ok(out)
    }

    fn collect(&self, node: &Json, depth: usize, out: &mut Vec<Value>) -> Result<()> {
        if depth == self.segments.len() {
            return match node {
                Json::Array(items) if self.is_element_of_enumerable => {
                    for item in items {
                        self.collect(item, depth, out)?;
                    }
                    Ok(())
                }
                _ => {
                    let value = Value::from_json(node, self.data_type)
                        .map_err(|reason| StructureError::extraction(&self.path, reason))?;
                    out.push(value);
                    Ok(())
                }
            };
        }

        let segment = &self.segments[depth];
        match node {
            Json::Object(map) => match map.get(segment) {
                Some(child) => self.collect(child, depth + 1, out),
                None => Ok(()),
            },
            Json::Null => Ok(()),
            Json::Array(items) if self.is_element_of_enumerable => {
                for item in items {
                    self.collect(item, depth, out)?;
                }
                Ok(())
            }
            Json::Array(_) => Err(StructureError::extraction(
                &self.path,
                format!("expected an object at '{}', found a sequence", segment),
            )),
            other => Err(StructureError::extraction(
                &self.path,
                format!("expected an object at '{}', found {}", segment, other),
            )),
        }
    }
}
