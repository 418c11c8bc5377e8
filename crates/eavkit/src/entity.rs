//! # Host Entities
//!
//! The record-persistence engine owns the entity's native fields and relations.
//! This module is the port between such a record and its dynamic attributes.
//!
//! Rather than overriding a base entity's accessors, a host composes its native
//! record with an [`Interactor`] inside an [`EavModel`]:
//!
//! - **Attribute access**: [`EavModel::get_attribute`] / [`EavModel::set_attribute`]
//!   ask the interactor first. A dynamic attribute shadows a native field of the
//!   same name.
//! - **Relation lookup**: [`EavModel::relation`] asks the native record first. The
//!   attribute registry is only a fallback when the native lookup finds nothing.
//! - **Dispatch**: [`EavModel::dispatch`] maps a name to a registered binding and is
//!   consulted before the host's own default dispatch.
//!
//! The two precedence rules differ on purpose and are kept independent.

use crate::attributes::AttrValue;
use crate::error::Result;
use crate::interactor::{Interactor, Resolution};
use crate::store::ValueStore;
use crate::value::AttributeBinding;
use uuid::Uuid;

/// The native side of a host entity.
pub trait NativeRecord {
    /// Type discriminator used to scope attribute definitions.
    fn entity_type(&self) -> &str;

    fn entity_id(&self) -> Uuid;

    fn get_field(&self, key: &str) -> Option<AttrValue>;

    fn set_field(&mut self, key: &str, value: AttrValue) -> Result<()>;

    /// Native relation lookup. Records without relations keep the default.
    fn relation(&self, _key: &str) -> Option<AttrValue> {
        None
    }
}

/// Result of [`EavModel::relation`].
#[derive(Debug)]
pub enum RelationValue<'a> {
    Native(AttrValue),
    Attribute(&'a AttributeBinding),
}

/// Result of [`EavModel::dispatch`].
#[derive(Debug)]
pub enum Dispatch<'a> {
    /// The name is a registered attribute accessor.
    Attribute(&'a mut AttributeBinding),
    /// Not an attribute; the host's default dispatch applies.
    Default,
}

/// A native record with dynamic attributes attached.
pub struct EavModel<N: NativeRecord, S: ValueStore> {
    native: N,
    interactor: Interactor<S>,
}

impl<N: NativeRecord, S: ValueStore> EavModel<N, S> {
    /// Attach `interactor` to `native` and build the attribute relations.
    pub fn new(native: N, mut interactor: Interactor<S>) -> Result<Self> {
        interactor.boot()?;
        Ok(Self { native, interactor })
    }

    pub fn entity_type(&self) -> &str {
        self.native.entity_type()
    }

    pub fn native(&self) -> &N {
        &self.native
    }

    pub fn native_mut(&mut self) -> &mut N {
        &mut self.native
    }

    pub fn interactor(&self) -> &Interactor<S> {
        &self.interactor
    }

    pub fn interactor_mut(&mut self) -> &mut Interactor<S> {
        &mut self.interactor
    }

    pub fn into_parts(self) -> (N, Interactor<S>) {
        (self.native, self.interactor)
    }

    /// Read a dynamic attribute or, failing that, a native field.
    pub fn get_attribute(&mut self, key: &str) -> Result<Option<AttrValue>> {
        match self.interactor.get(key)? {
            Resolution::Attribute(value) => Ok(Some(value)),
            Resolution::Native => Ok(self.native.get_field(key)),
        }
    }

    /// Write a dynamic attribute or, failing that, a native field.
    pub fn set_attribute(&mut self, key: &str, value: impl Into<AttrValue>) -> Result<()> {
        let value = value.into();
        if self.interactor.is_attribute(key) {
            self.interactor.set(key, value)?;
            Ok(())
        } else {
            self.native.set_field(key, value)
        }
    }

    /// Resolve a relation: native first, then the attribute registry.
    ///
    /// Whenever something is found, loaded collection attributes are linked to
    /// this entity.
    pub fn relation(&mut self, key: &str) -> Result<Option<RelationValue<'_>>> {
        if let Some(value) = self.native.relation(key) {
            self.interactor.link_collections()?;
            return Ok(Some(RelationValue::Native(value)));
        }

        if !self.interactor.relations()?.contains(key) {
            return Ok(None);
        }
        self.interactor.load(key)?;
        self.interactor.link_collections()?;
        Ok(self
            .interactor
            .registry()
            .get(key)
            .map(RelationValue::Attribute))
    }

    /// Look `name` up in the dispatch table of registered attribute accessors.
    pub fn dispatch(&mut self, name: &str) -> Result<Dispatch<'_>> {
        Ok(match self.interactor.relations()?.get_mut(name) {
            Some(binding) => Dispatch::Attribute(binding),
            None => Dispatch::Default,
        })
    }

    /// Persist every pending attribute write.
    pub fn flush(&mut self) -> Result<usize> {
        self.interactor.flush()
    }
}
