//! Contiguous identity range checkout.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::client::IdentitySeedStore;
use crate::error::{Result, StructureError};
use crate::schema::StructureSchema;
use crate::structure::IdType;

/// Hands out disjoint identity ranges per structure.
///
/// One atomic counter per structure name; the pre-increment value of a
/// checkout is the start of the caller's range. Safe under concurrent callers.
pub struct IdentityGenerator {
    counters: RwLock<HashMap<String, Arc<AtomicI64>>>,
    store: Option<Arc<dyn IdentitySeedStore>>,
    seed_start: i64,
}

impl IdentityGenerator {
    /// Creates a generator without durable state, starting every structure at `seed_start`.
    pub fn new(seed_start: i64) -> Self {
        Self {
            counters: RwLock::new(HashMap::new()),
            store: None,
            seed_start,
        }
    }

    /// Creates a generator resuming from and persisting to `store`.
    pub fn with_store(seed_start: i64, store: Arc<dyn IdentitySeedStore>) -> Self {
        Self {
            counters: RwLock::new(HashMap::new()),
            store: Some(store),
            seed_start,
        }
    }

    /// Reserves `count` consecutive identities for the schema's structure.
    ///
    /// The range is reserved before the seed store records it. When the
    /// store fails the range stays reserved in memory and is never handed
    /// out, and the next successful checkout records a mark past it.
    ///
    /// # Arguments
    /// * `schema` - Schema of an identity-keyed structure
    /// * `count` - Size of the range
    ///
    /// # Returns
    /// `Result<i64>` with the first identity of the range; the range is
    /// `[start, start + count)` and `start + count` never exceeds `i64::MAX`.
    pub fn check_out_and_get_seed(&self, schema: &StructureSchema, count: usize) -> Result<i64> {
        if schema.id_accessor.id_type != IdType::Identity {
            return Err(StructureError::UnsupportedIdKind {
                structure: schema.name.clone(),
                expected: IdType::Identity.to_string(),
                got: schema.id_accessor.id_type.to_string(),
            });
        }
        let overflow = || StructureError::IdentityOverflow {
            structure: schema.name.clone(),
        };
        let count = i64::try_from(count).map_err(|_| overflow())?;

        let counter = self.counter(&schema.name)?;
        let start = counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                current.checked_add(count)
            })
            .map_err(|_| overflow())?;

        if count > 0 {
            if let Some(store) = &self.store {
                if let Err(err) = store.write_seed(&schema.name, start + count) {
                    tracing::warn!(
                        "Identities {}..{} of '{}' discarded, seed not persisted: {}",
                        start,
                        start + count,
                        schema.name,
                        err
                    );
                    return Err(err);
                }
            }
        }
        Ok(start)
    }

    /// Next identity that would be handed out, if the structure was seen.
    pub fn peek(&self, structure: &str) -> Option<i64> {
        self.counters
            .read()
            .get(structure)
            .map(|c| c.load(Ordering::SeqCst))
    }

    fn counter(&self, structure: &str) -> Result<Arc<AtomicI64>> {
        if let Some(counter) = self.counters.read().get(structure) {
            return Ok(Arc::clone(counter));
        }

        let mut counters = self.counters.write();
        if let Some(counter) = counters.get(structure) {
            return Ok(Arc::clone(counter));
        }
        let initial = match &self.store {
            Some(store) => store.read_seed(structure)?.unwrap_or(self.seed_start),
            None => self.seed_start,
        };
        let counter = Arc::new(AtomicI64::new(initial.max(self.seed_start)));
        counters.insert(structure.to_string(), Arc::clone(&counter));
        Ok(counter)
    }
}

impl fmt::Debug for IdentityGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityGenerator")
            .field("structures", &self.counters.read().len())
            .field("durable", &self.store.is_some())
            .field("seed_start", &self.seed_start)
            .finish()
    }
}
