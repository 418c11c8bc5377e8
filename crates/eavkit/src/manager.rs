//! # Attribute Manager
//!
//! Authoritative source of attribute definitions: a read-through wrapper around the
//! [`AttributeCache`] backed by a [`MetadataStore`].
//!
//! - A cached entity type is served from the cache without touching the store.
//! - A miss queries the store once, keys the result by code and caches it.
//! - A failed query propagates as `MetadataUnavailable` and leaves the cache as it
//!   was. Nothing partial is ever cached.
//!
//! Concurrent misses for the same type may each query the store; the last
//! `set` wins, and since every `set` is a full overwrite the outcome is the same.

use crate::attributes::AttributeDefinitionSet;
use crate::cache::AttributeCache;
use crate::error::{EavError, Result};
use crate::store::MetadataStore;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct AttributeManager<M: MetadataStore> {
    store: M,
    cache: Arc<AttributeCache>,
}

impl<M: MetadataStore> AttributeManager<M> {
    /// A manager over the process-wide cache.
    pub fn new(store: M) -> Self {
        Self::with_cache(store, AttributeCache::global())
    }

    pub fn with_cache(store: M, cache: Arc<AttributeCache>) -> Self {
        Self { store, cache }
    }

    pub fn cache(&self) -> &Arc<AttributeCache> {
        &self.cache
    }

    pub fn store(&self) -> &M {
        &self.store
    }

    /// Definitions of `entity_type`, from the cache or the metadata store.
    pub fn get(&self, entity_type: &str) -> Result<Arc<AttributeDefinitionSet>> {
        if self.cache.exists(entity_type) {
            debug!(entity_type, "attribute cache hit");
            return Ok(self.cache.get(entity_type));
        }

        debug!(entity_type, "attribute cache miss");
        self.refresh(entity_type)
    }

    /// Fetch from the metadata store and overwrite the cache entry, whether or
    /// not one exists.
    pub fn refresh(&self, entity_type: &str) -> Result<Arc<AttributeDefinitionSet>> {
        let definitions = self
            .store
            .fetch_definitions(entity_type)
            .map_err(|e| {
                warn!(entity_type, error = %e, "attribute metadata fetch failed");
                EavError::metadata(entity_type, e)
            })?;

        let set = Arc::new(AttributeDefinitionSet::from_definitions(definitions));
        debug!(entity_type, count = set.len(), "caching attribute definitions");
        self.cache.set(entity_type, set.clone());
        Ok(set)
    }

    /// Invalidate `entity_type`; the next `get` goes to the metadata store.
    pub fn forget(&self, entity_type: &str) {
        self.cache.forget(entity_type);
    }
}
