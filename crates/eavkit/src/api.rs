//! # API Facade
//!
//! [`EavApi`] is the single entry point a host application wires up once. It
//! holds the pieces that are shared across entity instances:
//!
//! - the [`AttributeManager`] (definitions, read through the attribute cache)
//! - the [`RelationBuilder`] (and with it the data type registry)
//! - the value store, shared by every interactor it creates
//! - the loaded [`EavConfig`]
//!
//! and hands out per-instance objects:
//!
//! - [`EavApi::definitions`]: the definition set of an entity type
//! - [`EavApi::attach`]: an [`Interactor`] for one entity, relations already built
//! - [`EavApi::model`]: a native record wrapped into an [`EavModel`]
//!
//! ## Generic Over Stores
//!
//! `EavApi<M: MetadataStore, S: ValueStore>` is generic over both backends:
//! - Production: `EavApi<FsBackend, FsBackend>` or a host's own stores
//! - Testing: `EavApi<Arc<MemBackend>, Arc<MemBackend>>`, one backend for both
//!
//! Business logic lives in the modules the facade delegates to; the facade
//! itself only wires them together.

use crate::attributes::AttributeDefinitionSet;
use crate::cache::AttributeCache;
use crate::config::EavConfig;
use crate::entity::{EavModel, NativeRecord};
use crate::error::Result;
use crate::interactor::Interactor;
use crate::manager::AttributeManager;
use crate::model::{EntityRef, WritePolicy};
use crate::relation::RelationBuilder;
use crate::store::{MetadataStore, ValueStore};
use crate::value::ValueBuilder;
use std::sync::Arc;
use tracing::debug;

pub struct EavApi<M: MetadataStore, S: ValueStore> {
    manager: AttributeManager<M>,
    relations: RelationBuilder,
    values: Arc<S>,
    config: EavConfig,
    policy: WritePolicy,
}

impl<M: MetadataStore, S: ValueStore> EavApi<M, S> {
    /// A facade with the default configuration over the process-wide cache.
    pub fn new(metadata: M, values: S) -> Self {
        Self {
            manager: AttributeManager::new(metadata),
            relations: RelationBuilder::default(),
            values: Arc::new(values),
            config: EavConfig::default(),
            policy: WritePolicy::default(),
        }
    }

    /// A facade configured by `config`. The cache is the process-wide one,
    /// namespaced by `config.cache_prefix`.
    pub fn from_config(metadata: M, values: S, config: EavConfig) -> Result<Self> {
        let cache = Arc::new(AttributeCache::shared(&config.cache_prefix));
        Self::with_cache(metadata, values, config, cache)
    }

    /// Like [`from_config`](Self::from_config), over an explicit cache.
    pub fn with_cache(
        metadata: M,
        values: S,
        config: EavConfig,
        cache: Arc<AttributeCache>,
    ) -> Result<Self> {
        let policy = config.write_policy()?;
        let types = config.type_registry()?;
        Ok(Self {
            manager: AttributeManager::with_cache(metadata, cache),
            relations: RelationBuilder::new(ValueBuilder::with_types(types)),
            values: Arc::new(values),
            config,
            policy,
        })
    }

    pub fn config(&self) -> &EavConfig {
        &self.config
    }

    pub fn manager(&self) -> &AttributeManager<M> {
        &self.manager
    }

    pub fn value_store(&self) -> &Arc<S> {
        &self.values
    }

    pub fn write_policy(&self) -> WritePolicy {
        self.policy
    }

    /// Attribute definitions of `entity_type`.
    pub fn definitions(&self, entity_type: &str) -> Result<Arc<AttributeDefinitionSet>> {
        self.manager.get(entity_type)
    }

    /// An interactor for `entity`, with its attribute relations built.
    pub fn attach(&self, entity: EntityRef) -> Result<Interactor<S>> {
        let definitions = self.manager.get(&entity.entity_type)?;
        let mut interactor = Interactor::new(
            entity,
            definitions,
            self.values.clone(),
            self.relations.clone(),
            self.policy,
        );
        interactor.boot()?;
        debug!(
            entity_type = %interactor.entity().entity_type,
            entity_id = %interactor.entity().entity_id,
            "attached attributes"
        );
        Ok(interactor)
    }

    /// Wrap `native` with its dynamic attributes.
    pub fn model<N: NativeRecord>(&self, native: N) -> Result<EavModel<N, S>> {
        let entity = EntityRef::new(native.entity_type(), native.entity_id());
        let interactor = self.attach(entity)?;
        EavModel::new(native, interactor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{AttrValue, AttributeDefinition, DataType};
    use crate::error::EavError;
    use crate::store::mem_backend::MemBackend;
    use std::collections::HashMap;
    use uuid::Uuid;

    fn backend() -> Arc<MemBackend> {
        Arc::new(MemBackend::new().with_definitions([
            AttributeDefinition::new("product", "color", "string"),
            AttributeDefinition::new("product", "tags", "string").collection(),
        ]))
    }

    fn api_with(
        backend: Arc<MemBackend>,
        config: EavConfig,
    ) -> Result<EavApi<Arc<MemBackend>, Arc<MemBackend>>> {
        EavApi::with_cache(
            backend.clone(),
            backend,
            config,
            Arc::new(AttributeCache::new()),
        )
    }

    #[test]
    fn definitions_are_read_through_the_cache() {
        let backend = backend();
        let api = api_with(backend.clone(), EavConfig::default()).unwrap();

        let first = api.definitions("product").unwrap();
        let second = api.definitions("product").unwrap();
        assert_eq!(first.codes().collect::<Vec<_>>(), vec!["color", "tags"]);
        assert_eq!(first, second);
        assert_eq!(backend.fetch_count(), 1);
    }

    #[test]
    fn attach_returns_booted_interactor() {
        let api = api_with(backend(), EavConfig::default()).unwrap();
        let interactor = api.attach(EntityRef::new("product", Uuid::new_v4())).unwrap();

        assert!(interactor.is_booted());
        assert_eq!(interactor.registry().len(), 2);
        assert_eq!(interactor.write_policy(), WritePolicy::Immediate);
    }

    #[test]
    fn attach_for_unknown_type_has_no_attributes() {
        let api = api_with(backend(), EavConfig::default()).unwrap();
        let mut interactor = api.attach(EntityRef::new("order", Uuid::new_v4())).unwrap();
        assert!(interactor.registry().is_empty());
        assert!(!interactor.get("color").unwrap().is_attribute());
    }

    #[test]
    fn config_sets_policy_and_types() {
        let backend = Arc::new(
            MemBackend::new()
                .with_definitions([AttributeDefinition::new("product", "price", "money")]),
        );
        let mut aliases = HashMap::new();
        aliases.insert("money".to_string(), "decimal".to_string());
        let config = EavConfig {
            write_policy: "deferred".to_string(),
            type_aliases: Some(aliases),
            ..Default::default()
        };
        let api = api_with(backend, config).unwrap();

        let mut interactor = api.attach(EntityRef::new("product", Uuid::new_v4())).unwrap();
        assert_eq!(interactor.write_policy(), WritePolicy::Deferred);
        assert_eq!(
            interactor.registry().get("price").unwrap().table().data_type,
            DataType::Decimal
        );
        interactor.set("price", 12i64).unwrap();
        assert!(interactor.is_dirty());
    }

    #[test]
    fn bad_config_is_rejected() {
        let config = EavConfig {
            write_policy: "later".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            api_with(backend(), config),
            Err(EavError::Config(_))
        ));
    }

    #[test]
    fn metadata_failure_surfaces_from_attach() {
        let backend = backend();
        backend.set_simulate_metadata_error(true);
        let api = api_with(backend, EavConfig::default()).unwrap();
        assert!(matches!(
            api.attach(EntityRef::new("product", Uuid::new_v4())),
            Err(EavError::MetadataUnavailable { .. })
        ));
    }

    #[test]
    fn interactors_share_the_value_store() {
        let api = api_with(backend(), EavConfig::default()).unwrap();
        let entity = EntityRef::new("product", Uuid::new_v4());

        let mut writer = api.attach(entity.clone()).unwrap();
        writer.set("color", "blue").unwrap();

        let mut reader = api.attach(entity).unwrap();
        assert_eq!(
            reader.get("color").unwrap().attribute(),
            Some(AttrValue::from("blue"))
        );
    }

    fn widget_backend(code: &str) -> Arc<MemBackend> {
        Arc::new(
            MemBackend::new()
                .with_definitions([AttributeDefinition::new("api-widget", code, "string")]),
        )
    }

    #[test]
    fn from_config_prefixes_stay_separate() {
        let _lock = crate::cache::GLOBAL_TEST_LOCK.lock();
        let backend_a = widget_backend("color");
        let backend_b = widget_backend("size");
        let config = |prefix: &str| EavConfig {
            cache_prefix: prefix.to_string(),
            ..Default::default()
        };

        let api_a =
            EavApi::from_config(backend_a.clone(), backend_a.clone(), config("api-tenant-a"))
                .unwrap();
        let api_b =
            EavApi::from_config(backend_b.clone(), backend_b.clone(), config("api-tenant-b"))
                .unwrap();

        assert!(api_a.definitions("api-widget").unwrap().contains("color"));
        assert!(api_b.definitions("api-widget").unwrap().contains("size"));
        assert!(!api_a.definitions("api-widget").unwrap().contains("size"));

        // Both live in the process-wide repository under their own prefix
        assert!(AttributeCache::shared("api-tenant-a").exists("api-widget"));
        assert!(AttributeCache::shared("api-tenant-b").exists("api-widget"));
        assert!(!AttributeCache::global().exists("api-widget"));
        assert_eq!(backend_a.fetch_count(), 1);
        assert_eq!(backend_b.fetch_count(), 1);

        AttributeCache::reset_global();
        assert!(!AttributeCache::shared("api-tenant-a").exists("api-widget"));
        assert!(!AttributeCache::shared("api-tenant-b").exists("api-widget"));
    }

    #[test]
    fn new_reads_through_the_global_cache() {
        let _lock = crate::cache::GLOBAL_TEST_LOCK.lock();
        AttributeCache::reset_global();
        let backend = widget_backend("color");
        let api = EavApi::new(backend.clone(), backend.clone());

        api.attach(EntityRef::new("api-widget", Uuid::new_v4())).unwrap();
        assert!(AttributeCache::global().exists("api-widget"));

        let again = EavApi::new(backend.clone(), backend.clone());
        again.attach(EntityRef::new("api-widget", Uuid::new_v4())).unwrap();
        assert_eq!(backend.fetch_count(), 1);
        AttributeCache::reset_global();
    }
}
