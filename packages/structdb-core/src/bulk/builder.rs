//! Turns documents into structure rows: id assignment, serialization and
//! index extraction.

use crate::client::StructureSerializer;
use crate::error::Result;
use crate::schema::StructureSchema;
use crate::structure::{IdType, Structure, StructureId};

use super::identity::IdentityGenerator;
use super::indexes::{IndexesExtractor, StructureIndex};

/// A document ready for bulk copy.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureRow {
    pub id: StructureId,
    /// Persisted body produced by the serializer
    pub json: String,
    pub indexes: Vec<StructureIndex>,
}

/// Builds structure rows for one schema.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructureBuilder {
    extractor: IndexesExtractor,
}

impl StructureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns ids to the documents lacking one.
    ///
    /// Identity schemas check out one range sized to the documents lacking
    /// an id (no checkout when none do). Guid schemas generate a UUID per
    /// document. Documents already carrying an id keep it, but it must be of
    /// the schema's kind.
    ///
    /// # Returns
    /// `Result<Vec<StructureId>>` with the id of every document, in order.
    pub fn assign_ids<T: Structure>(
        &self,
        schema: &StructureSchema,
        items: &mut [T],
        identities: &IdentityGenerator,
    ) -> Result<Vec<StructureId>> {
        let accessor = &schema.id_accessor;
        let existing: Vec<Option<StructureId>> =
            items.iter().map(|item| accessor.get_value(item)).collect();
        for id in existing.iter().flatten() {
            accessor.ensure_kind(&schema.name, id)?;
        }

        let missing = existing.iter().filter(|id| id.is_none()).count();
        let mut next = match (accessor.id_type, missing) {
            (IdType::Identity, n) if n > 0 => identities.check_out_and_get_seed(schema, n)?,
            _ => 0,
        };

        let mut ids = Vec::with_capacity(items.len());
        for (item, current) in items.iter_mut().zip(existing) {
            let id = match current {
                Some(id) => id,
                None => {
                    let id = match accessor.id_type {
                        IdType::Identity => {
                            let id = StructureId::Identity(next);
                            // The checked-out range ends at or below i64::MAX.
                            next += 1;
                            id
                        }
                        IdType::Guid => StructureId::new_guid(),
                    };
                    accessor.set_value(item, id);
                    id
                }
            };
            ids.push(id);
        }
        Ok(ids)
    }

    /// Serializes one document and extracts its index rows.
    pub fn build<T: Structure>(
        &self,
        schema: &StructureSchema,
        id: StructureId,
        item: &T,
        serializer: &dyn StructureSerializer,
    ) -> Result<StructureRow> {
        let projection = serde_json::to_value(item)?;
        let indexes = self.extractor.extract(schema, id, &projection)?;
        Ok(StructureRow {
            id,
            json: serializer.serialize(&projection)?,
            indexes,
        })
    }

    /// Builds the rows of a batch whose ids are already assigned.
    #[cfg(feature = "parallel")]
    pub fn build_all<T: Structure>(
        &self,
        schema: &StructureSchema,
        ids: &[StructureId],
        items: &[T],
        serializer: &dyn StructureSerializer,
    ) -> Result<Vec<StructureRow>> {
        use rayon::prelude::*;

        items
            .par_iter()
            .zip(ids.par_iter())
            .map(|(item, id)| self.build(schema, *id, item, serializer))
            .collect()
    }

    /// Builds the rows of a batch whose ids are already assigned.
    #[cfg(not(feature = "parallel"))]
    pub fn build_all<T: Structure>(
        &self,
        schema: &StructureSchema,
        ids: &[StructureId],
        items: &[T],
        serializer: &dyn StructureSerializer,
    ) -> Result<Vec<StructureRow>> {
        items
            .iter()
            .zip(ids)
            .map(|(item, id)| self.build(schema, *id, item, serializer))
            .collect()
    }
}
