//! # Attribute Cache
//!
//! Maps an entity type to its [`AttributeDefinitionSet`]. Definitions change rarely
//! but are needed every time an entity instance is constructed, so reads must be
//! cheap and side-effect free.
//!
//! ## Semantics
//!
//! - **No expiry**: entries are stored "forever". Invalidation is always explicit.
//! - **Evict before write**: [`AttributeCache::set`] forgets the existing entry and
//!   then stores the new one, so no stale or merged definitions survive an update.
//! - **Namespaced keys**: entries live under `"{prefix}.{entity_type}"`
//!   (prefix `eav` by default), so several caches can share one repository.
//!
//! ## Process-wide Registry
//!
//! [`AttributeCache::global`] is the cache shared by everything in the process.
//! Tests call [`AttributeCache::reset_global`] to start from an empty cache.

use crate::attributes::AttributeDefinitionSet;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

pub const DEFAULT_PREFIX: &str = "eav";

/// Key/value storage behind an [`AttributeCache`].
pub trait CacheRepository: Send + Sync {
    fn has(&self, key: &str) -> bool;

    fn get(&self, key: &str) -> Option<Arc<AttributeDefinitionSet>>;

    fn forget(&self, key: &str);

    /// Store `value` with no expiry.
    fn forever(&self, key: &str, value: Arc<AttributeDefinitionSet>);

    /// Drop every entry.
    fn flush(&self);
}

/// In-process repository.
#[derive(Default)]
pub struct MemoryRepository {
    entries: RwLock<HashMap<String, Arc<AttributeDefinitionSet>>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl CacheRepository for MemoryRepository {
    fn has(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    fn get(&self, key: &str) -> Option<Arc<AttributeDefinitionSet>> {
        self.entries.read().get(key).cloned()
    }

    fn forget(&self, key: &str) {
        self.entries.write().remove(key);
    }

    fn forever(&self, key: &str, value: Arc<AttributeDefinitionSet>) {
        self.entries.write().insert(key.to_string(), value);
    }

    fn flush(&self) {
        self.entries.write().clear();
    }
}

static GLOBAL_REPOSITORY: Lazy<Arc<MemoryRepository>> =
    Lazy::new(|| Arc::new(MemoryRepository::new()));

static GLOBAL: Lazy<Arc<AttributeCache>> = Lazy::new(|| {
    Arc::new(AttributeCache::with_repository(
        GLOBAL_REPOSITORY.clone(),
        DEFAULT_PREFIX,
    ))
});

/// Held by tests that read or reset the process-wide repository.
#[cfg(test)]
pub(crate) static GLOBAL_TEST_LOCK: Lazy<parking_lot::Mutex<()>> =
    Lazy::new(|| parking_lot::Mutex::new(()));

/// Entity type → definition set cache.
pub struct AttributeCache {
    repository: Arc<dyn CacheRepository>,
    prefix: String,
}

impl Default for AttributeCache {
    fn default() -> Self {
        Self::new()
    }
}

impl AttributeCache {
    /// A private cache over its own in-process repository.
    pub fn new() -> Self {
        Self::with_repository(Arc::new(MemoryRepository::new()), DEFAULT_PREFIX)
    }

    pub fn with_repository(repository: Arc<dyn CacheRepository>, prefix: &str) -> Self {
        Self {
            repository,
            prefix: prefix.to_string(),
        }
    }

    /// The process-wide cache (prefix `eav`).
    pub fn global() -> Arc<AttributeCache> {
        GLOBAL.clone()
    }

    /// A view over the process-wide repository under a different prefix.
    pub fn shared(prefix: &str) -> Self {
        Self::with_repository(GLOBAL_REPOSITORY.clone(), prefix)
    }

    /// Empty the process-wide repository, for every prefix.
    pub fn reset_global() {
        GLOBAL_REPOSITORY.flush();
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn key(&self, entity_type: &str) -> String {
        format!("{}.{}", self.prefix, entity_type)
    }

    pub fn exists(&self, entity_type: &str) -> bool {
        self.repository.has(&self.key(entity_type))
    }

    /// The cached set, or an empty set when nothing is cached.
    ///
    /// Use [`exists`](Self::exists) to tell "absent" from "cached empty".
    pub fn get(&self, entity_type: &str) -> Arc<AttributeDefinitionSet> {
        self.repository
            .get(&self.key(entity_type))
            .unwrap_or_default()
    }

    pub fn set(&self, entity_type: &str, definitions: Arc<AttributeDefinitionSet>) {
        let key = self.key(entity_type);
        self.repository.forget(&key);
        self.repository.forever(&key, definitions);
    }

    pub fn forget(&self, entity_type: &str) {
        self.repository.forget(&self.key(entity_type));
    }

    /// Drop every entry in the underlying repository.
    pub fn flush(&self) {
        self.repository.flush();
    }
}
