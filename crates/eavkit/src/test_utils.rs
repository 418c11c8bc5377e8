//! Fixtures shared by unit and integration tests.
//!
//! Every fixture runs over a private [`AttributeCache`], so tests never see each
//! other's cached definitions through the process-wide repository.

use crate::api::EavApi;
use crate::attributes::AttributeDefinition;
use crate::cache::AttributeCache;
use crate::config::EavConfig;
use crate::error::Result;
use crate::interactor::Interactor;
use crate::model::{EntityRef, WritePolicy};
use crate::store::mem_backend::MemBackend;
use std::sync::Arc;
use uuid::Uuid;

pub type MemApi = EavApi<Arc<MemBackend>, Arc<MemBackend>>;

/// The attributes most tests use: a `color` string and a `tags` string collection.
pub fn product_definitions() -> Vec<AttributeDefinition> {
    vec![
        AttributeDefinition::new("product", "color", "string"),
        AttributeDefinition::new("product", "tags", "string").collection(),
    ]
}

pub struct TestEnv {
    pub backend: Arc<MemBackend>,
    pub cache: Arc<AttributeCache>,
    pub api: MemApi,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnv {
    /// A memory backend seeded with [`product_definitions`].
    pub fn new() -> Self {
        Self::with_definitions(product_definitions())
    }

    pub fn with_definitions<I>(definitions: I) -> Self
    where
        I: IntoIterator<Item = AttributeDefinition>,
    {
        Self::build(definitions, EavConfig::default())
    }

    pub fn with_policy(policy: WritePolicy) -> Self {
        let write_policy = match policy {
            WritePolicy::Immediate => "immediate",
            WritePolicy::Deferred => "deferred",
        };
        Self::build(
            product_definitions(),
            EavConfig {
                write_policy: write_policy.to_string(),
                ..Default::default()
            },
        )
    }

    fn build<I>(definitions: I, config: EavConfig) -> Self
    where
        I: IntoIterator<Item = AttributeDefinition>,
    {
        let backend = Arc::new(MemBackend::new().with_definitions(definitions));
        let cache = Arc::new(AttributeCache::new());
        let api = match EavApi::with_cache(backend.clone(), backend.clone(), config, cache.clone())
        {
            Ok(api) => api,
            Err(e) => panic!("invalid test configuration: {e}"),
        };
        Self {
            backend,
            cache,
            api,
        }
    }

    /// An interactor for a fresh entity of `entity_type`.
    pub fn attach_new(&self, entity_type: &str) -> Result<Interactor<Arc<MemBackend>>> {
        self.api.attach(EntityRef::new(entity_type, Uuid::new_v4()))
    }
}
