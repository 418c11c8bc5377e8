//! # Interactor
//!
//! The per-instance façade between a host entity and its dynamic attributes.
//!
//! ## Precedence
//!
//! [`Interactor::is_attribute`] is checked before any native-field handling, so
//! a dynamic attribute shadows a native field with the same name. For keys that
//! are not attributes, `get` / `set` return [`Resolution::Native`] and the caller
//! handles the key itself. An unknown key is never an error.
//!
//! ## Write Policy
//!
//! - [`WritePolicy::Immediate`]: `set` persists before returning. A failed write
//!   is returned to the caller and the binding stays dirty.
//! - [`WritePolicy::Deferred`]: `set` only changes memory; [`Interactor::flush`]
//!   writes every dirty binding.
//!
//! The policy starts from configuration and can be changed per instance.

use crate::attributes::{AttrValue, AttributeDefinitionSet};
use crate::error::{EavError, Result};
use crate::model::{EntityRef, WritePolicy};
use crate::relation::{AttributeRelationRegistry, RelationBuilder};
use crate::store::ValueStore;
use crate::value::{AttributeBinding, BindingState};
use std::sync::Arc;
use tracing::debug;

/// Outcome of routing a key through the interactor.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<T> {
    /// The key is a dynamic attribute and was handled.
    Attribute(T),
    /// The key is not an attribute; native handling applies.
    Native,
}

impl<T> Resolution<T> {
    pub fn is_attribute(&self) -> bool {
        matches!(self, Resolution::Attribute(_))
    }

    pub fn attribute(self) -> Option<T> {
        match self {
            Resolution::Attribute(value) => Some(value),
            Resolution::Native => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolution<U> {
        match self {
            Resolution::Attribute(value) => Resolution::Attribute(f(value)),
            Resolution::Native => Resolution::Native,
        }
    }
}

pub struct Interactor<S: ValueStore> {
    entity: EntityRef,
    definitions: Arc<AttributeDefinitionSet>,
    registry: AttributeRelationRegistry,
    relations: RelationBuilder,
    store: Arc<S>,
    policy: WritePolicy,
}

fn unregistered(code: &str) -> EavError {
    EavError::Store(format!("No binding registered for attribute '{}'", code))
}

impl<S: ValueStore> Interactor<S> {
    /// Create an interactor. Relations are built on [`boot`](Self::boot) or on
    /// first attribute access, whichever comes first.
    pub fn new(
        entity: EntityRef,
        definitions: Arc<AttributeDefinitionSet>,
        store: Arc<S>,
        relations: RelationBuilder,
        policy: WritePolicy,
    ) -> Self {
        Self {
            entity,
            definitions,
            registry: AttributeRelationRegistry::new(),
            relations,
            store,
            policy,
        }
    }

    /// Build the attribute relations. Returns `false` when already built.
    pub fn boot(&mut self) -> Result<bool> {
        self.relations
            .build(&self.entity, &self.definitions, &mut self.registry)
    }

    pub fn is_booted(&self) -> bool {
        self.registry.is_booted()
    }

    pub fn entity(&self) -> &EntityRef {
        &self.entity
    }

    pub fn definitions(&self) -> &Arc<AttributeDefinitionSet> {
        &self.definitions
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn write_policy(&self) -> WritePolicy {
        self.policy
    }

    pub fn set_write_policy(&mut self, policy: WritePolicy) {
        self.policy = policy;
    }

    /// The registry as it is, booted or not.
    pub fn registry(&self) -> &AttributeRelationRegistry {
        &self.registry
    }

    /// The registry, booting it first if needed.
    pub fn relations(&mut self) -> Result<&mut AttributeRelationRegistry> {
        self.boot()?;
        Ok(&mut self.registry)
    }

    pub fn is_attribute(&self, key: &str) -> bool {
        self.definitions.contains(key)
    }

    /// Current state of the binding for `key`, if it is a built attribute.
    pub fn state(&self, key: &str) -> Option<BindingState> {
        self.registry.get(key).map(AttributeBinding::state)
    }

    pub fn is_dirty(&self) -> bool {
        self.registry.iter().any(|(_, b)| b.is_dirty())
    }

    /// Read an attribute. The first read of each attribute loads it from the
    /// value store; later reads reuse the loaded value.
    pub fn get(&mut self, key: &str) -> Result<Resolution<AttrValue>> {
        if !self.is_attribute(key) {
            return Ok(Resolution::Native);
        }
        self.boot()?;
        let store = &*self.store;
        let binding = self.registry.get_mut(key).ok_or_else(|| unregistered(key))?;
        binding.value(store).map(Resolution::Attribute)
    }

    /// Assign an attribute. Collections append; scalars overwrite.
    pub fn set(&mut self, key: &str, value: impl Into<AttrValue>) -> Result<Resolution<()>> {
        self.write(key, value.into(), false)
    }

    /// Assign an attribute, discarding previous collection members.
    pub fn replace(&mut self, key: &str, value: impl Into<AttrValue>) -> Result<Resolution<()>> {
        self.write(key, value.into(), true)
    }

    fn write(&mut self, key: &str, value: AttrValue, replace: bool) -> Result<Resolution<()>> {
        if !self.is_attribute(key) {
            return Ok(Resolution::Native);
        }
        self.boot()?;
        let store = &*self.store;
        let binding = self.registry.get_mut(key).ok_or_else(|| unregistered(key))?;

        if replace {
            binding.replace(store, value)?;
        } else {
            binding.assign(store, value)?;
        }

        if self.policy == WritePolicy::Immediate {
            binding.flush(store)?;
            debug!(code = key, entity_id = %self.entity.entity_id, "attribute written through");
        }
        Ok(Resolution::Attribute(()))
    }

    /// Load one attribute without reading it.
    pub fn load(&mut self, key: &str) -> Result<Resolution<()>> {
        if !self.is_attribute(key) {
            return Ok(Resolution::Native);
        }
        self.boot()?;
        let store = &*self.store;
        let binding = self.registry.get_mut(key).ok_or_else(|| unregistered(key))?;
        binding.load(store)?;
        Ok(Resolution::Attribute(()))
    }

    /// Link every loaded collection attribute to this entity.
    pub fn link_collections(&mut self) -> Result<usize> {
        self.boot()?;
        self.registry.link_loaded_collections(&self.entity)
    }

    /// Persist every dirty binding, in definition order.
    ///
    /// Stops at the first failure; bindings not yet reached stay dirty.
    /// Returns the number of bindings written.
    pub fn flush(&mut self) -> Result<usize> {
        let store = &*self.store;
        let mut written = 0;
        for (_, binding) in self.registry.iter_mut() {
            if binding.is_dirty() {
                binding.flush(store)?;
                written += 1;
            }
        }
        if written > 0 {
            debug!(entity_id = %self.entity.entity_id, written, "flushed attributes");
        }
        Ok(written)
    }

    /// Load every attribute in one pass and link the collections.
    pub fn load_all(&mut self) -> Result<()> {
        self.boot()?;
        let store = &*self.store;
        for (_, binding) in self.registry.iter_mut() {
            binding.load(store)?;
        }
        self.registry.link_loaded_collections(&self.entity)?;
        Ok(())
    }
}
