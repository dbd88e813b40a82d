use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::structure::{Structure, TypeDescriptor};

use super::builder::SchemaBuilder;
use super::error::SchemaError;
use super::schema::StructureSchema;

/// Registry of built structure schemas.
///
/// Owned by the caller: create it at startup, share it, drop it at shutdown.
/// Hands out shared read-only schemas keyed by structure name.
#[derive(Debug, Default)]
pub struct StructureSchemas {
    builder: SchemaBuilder,
    schemas: RwLock<HashMap<String, Arc<StructureSchema>>>,
}

impl StructureSchemas {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self {
            builder: SchemaBuilder::new(),
            schemas: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the schema for `T`, building it on first use.
    pub fn get_or_register<T: Structure>(&self) -> Result<Arc<StructureSchema>, SchemaError> {
        self.get_or_register_descriptor(&T::describe())
    }

    /// Returns the schema for a descriptor, building it on first use.
    pub fn get_or_register_descriptor(
        &self,
        descriptor: &TypeDescriptor,
    ) -> Result<Arc<StructureSchema>, SchemaError> {
        if let Some(schema) = self.schemas.read().get(&descriptor.name) {
            return Ok(Arc::clone(schema));
        }

        let schema = Arc::new(self.builder.create_schema_from(descriptor)?);
        let mut schemas = self.schemas.write();
        // Another caller may have won the race; keep the first schema.
        let entry = schemas
            .entry(descriptor.name.clone())
            .or_insert_with(|| Arc::clone(&schema));
        Ok(Arc::clone(entry))
    }

    /// Retrieves a schema by structure name.
    pub fn get(&self, name: &str) -> Option<Arc<StructureSchema>> {
        self.schemas.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.read().contains_key(name)
    }

    /// Removes a schema, returning it if it was registered.
    pub fn remove(&self, name: &str) -> Option<Arc<StructureSchema>> {
        self.schemas.write().remove(name)
    }

    pub fn clear(&self) {
        self.schemas.write().clear();
    }

    /// Returns all registered structure names.
    pub fn names(&self) -> Vec<String> {
        self.schemas.read().keys().cloned().collect()
    }
}
