//! # Relation Building
//!
//! Each entity instance gets one binding per declared attribute, registered under
//! the attribute's code in its [`AttributeRelationRegistry`]. The registry is what
//! the interactor routes reads and writes through, and what the host entity's
//! dispatch table resolves names against.
//!
//! Building happens at most once per instance: the registry carries a `booted`
//! flag, and [`RelationBuilder::build`] is a no-op once it is set. The flag belongs
//! to the instance, so no synchronization is involved.

use crate::attributes::AttributeDefinitionSet;
use crate::error::Result;
use crate::model::EntityRef;
use crate::value::{AttributeBinding, ValueBuilder};
use indexmap::IndexMap;
use tracing::debug;

/// Per-instance `code -> binding` table.
#[derive(Debug, Clone, Default)]
pub struct AttributeRelationRegistry {
    bindings: IndexMap<String, AttributeBinding>,
    booted: bool,
}

impl AttributeRelationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_booted(&self) -> bool {
        self.booted
    }

    pub fn contains(&self, code: &str) -> bool {
        self.bindings.contains_key(code)
    }

    pub fn get(&self, code: &str) -> Option<&AttributeBinding> {
        self.bindings.get(code)
    }

    pub fn get_mut(&mut self, code: &str) -> Option<&mut AttributeBinding> {
        self.bindings.get_mut(code)
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeBinding)> {
        self.bindings.iter().map(|(code, b)| (code.as_str(), b))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut AttributeBinding)> {
        self.bindings.iter_mut().map(|(code, b)| (code.as_str(), b))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Link every collection binding that has been loaded.
    ///
    /// Collections already linked are skipped. Returns how many were linked now.
    pub fn link_loaded_collections(&mut self, entity: &EntityRef) -> Result<usize> {
        let mut linked = 0;
        for binding in self.bindings.values_mut() {
            if !binding.is_collection() || !binding.is_loaded() {
                continue;
            }
            let definition = binding.definition().clone();
            if binding.link(entity, &definition)? {
                linked += 1;
            }
        }
        Ok(linked)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RelationBuilder {
    values: ValueBuilder,
}

impl RelationBuilder {
    pub fn new(values: ValueBuilder) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &ValueBuilder {
        &self.values
    }

    /// Register one binding per definition, in definition order.
    ///
    /// Returns `false` when the registry was already booted. If any definition
    /// fails to build, nothing is registered and the registry stays un-booted.
    pub fn build(
        &self,
        entity: &EntityRef,
        definitions: &AttributeDefinitionSet,
        registry: &mut AttributeRelationRegistry,
    ) -> Result<bool> {
        if registry.booted {
            return Ok(false);
        }

        let mut bindings = IndexMap::with_capacity(definitions.len());
        for definition in definitions.iter() {
            let binding = self.values.build(definition, entity)?;
            bindings.insert(definition.code.clone(), binding);
        }

        debug!(
            entity_type = %entity.entity_type,
            entity_id = %entity.entity_id,
            count = bindings.len(),
            "built attribute relations"
        );
        registry.bindings = bindings;
        registry.booted = true;
        Ok(true)
    }
}
