//! Session façade wiring the registry, synchronizer, loader and query
//! generator to a set of external clients.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::bulk::{BulkInserter, BulkTargets, IdentityGenerator, InsertSummary};
use crate::client::{
    BulkCopyClient, IdentitySeedStore, JsonSerializer, SchemaWriter, ShapeInspector, SqlExecutor,
    StructureSerializer,
};
use crate::config::StoreConfig;
use crate::error::{Result, StructureError};
use crate::query::{QueryCommand, QueryGenerator};
use crate::schema::{StructureSchema, StructureSchemas};
use crate::structure::Structure;
use crate::sync::SchemaSynchronizer;
use crate::value::Value;

/// External clients a session drives.
#[derive(Clone)]
pub struct SessionClients {
    /// Bulk-copy client for the structures stream
    pub bulk_copy: Arc<dyn BulkCopyClient>,
    /// Separately connected client for the indexes stream in parallel mode;
    /// `bulk_copy` is used when absent
    pub index_bulk_copy: Option<Arc<dyn BulkCopyClient>>,
    pub inspector: Arc<dyn ShapeInspector>,
    pub writer: Arc<dyn SchemaWriter>,
    pub executor: Arc<dyn SqlExecutor>,
    /// Durable identity state; identities restart from the configured seed when absent
    pub seeds: Option<Arc<dyn IdentitySeedStore>>,
    pub serializer: Arc<dyn StructureSerializer>,
}

impl SessionClients {
    /// Clients with the default JSON serializer and no seed store.
    pub fn new(
        bulk_copy: Arc<dyn BulkCopyClient>,
        inspector: Arc<dyn ShapeInspector>,
        writer: Arc<dyn SchemaWriter>,
        executor: Arc<dyn SqlExecutor>,
    ) -> Self {
        Self {
            bulk_copy,
            index_bulk_copy: None,
            inspector,
            writer,
            executor,
            seeds: None,
            serializer: Arc::new(JsonSerializer),
        }
    }
}

/// Entry point for storing and querying structures.
///
/// Schemas are synchronized before every load that targets them, so a
/// loader never races synchronization.
pub struct Session {
    schemas: Arc<StructureSchemas>,
    synchronizer: SchemaSynchronizer,
    identities: IdentityGenerator,
    inserter: BulkInserter,
    generator: QueryGenerator,
    clients: SessionClients,
}

impl Session {
    pub fn new(config: &StoreConfig, schemas: Arc<StructureSchemas>, clients: SessionClients) -> Self {
        let identities = match &clients.seeds {
            Some(store) => IdentityGenerator::with_store(config.identity_seed_start, Arc::clone(store)),
            None => IdentityGenerator::new(config.identity_seed_start),
        };
        Self {
            schemas,
            synchronizer: SchemaSynchronizer::new(),
            identities,
            inserter: BulkInserter::new(config),
            generator: QueryGenerator::new(),
            clients,
        }
    }

    /// Schema of `T`, built and registered on first use.
    pub fn schema_for<T: Structure>(&self) -> Result<Arc<StructureSchema>> {
        Ok(self.schemas.get_or_register::<T>()?)
    }

    /// Stores `items`, assigning ids to those lacking one.
    ///
    /// # Returns
    /// `Result<InsertSummary>`; ids are written back onto `items`.
    pub fn insert_many<T: Structure>(&self, items: &mut [T]) -> Result<InsertSummary> {
        let schema = self.schema_for::<T>()?;
        self.synchronizer.upsert(
            &schema,
            self.clients.inspector.as_ref(),
            self.clients.writer.as_ref(),
        )?;

        let structures = self.clients.bulk_copy.as_ref();
        let indexes = self
            .clients
            .index_bulk_copy
            .as_deref()
            .unwrap_or(structures);
        self.inserter.insert(
            &schema,
            items,
            &self.identities,
            self.clients.serializer.as_ref(),
            BulkTargets {
                structures,
                indexes,
            },
        )
    }

    /// Runs a query and deserializes every selected structure.
    pub fn query<T: Structure + DeserializeOwned>(&self, query: &QueryCommand) -> Result<Vec<T>> {
        let schema = self.schema_for::<T>()?;
        let command = self.generator.generate(query, &schema)?;
        let bodies = self.clients.executor.read_json(&command)?;
        bodies
            .iter()
            .map(|body| {
                let projection = self.clients.serializer.deserialize(body)?;
                Ok(serde_json::from_value(projection)?)
            })
            .collect()
    }

    /// Counts the structures matching a query's predicate.
    pub fn count<T: Structure>(&self, query: &QueryCommand) -> Result<i64> {
        let schema = self.schema_for::<T>()?;
        let command = self.generator.generate_count(query, &schema)?;
        match self.clients.executor.execute_scalar(&command)? {
            Value::Integer(count) => Ok(count),
            other => Err(StructureError::Backend(format!(
                "Count returned {} instead of an integer",
                other
            ))),
        }
    }

    /// Forgets the applied shape of `T`, e.g. after its tables were dropped.
    pub fn forget_schema<T: Structure>(&self) {
        self.synchronizer.forget(&T::describe().name);
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("schemas", &self.schemas.names())
            .field("identities", &self.identities)
            .field("inserter", &self.inserter)
            .finish()
    }
}
