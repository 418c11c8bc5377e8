//! # Domain Model: Entities, Value Records and Storage Slots
//!
//! An entity instance is identified by an [`EntityRef`] (its type discriminator and
//! id). Each stored attribute value is a [`ValueRecord`] keyed by
//! `(entity_id, attribute_id)` inside a [`ValueTable`].
//!
//! ## Value Tables
//!
//! Values live in one table per data type, and scalar and collection rows never
//! share a table:
//!
//! ```text
//! string.scalar   string.multi
//! text.scalar     text.multi
//! integer.scalar  integer.multi
//! ...
//! ```
//!
//! The table is chosen from `(data_type, is_collection)` alone, so an attribute
//! resolves to the same storage shape for every instance.

use crate::attributes::{AttrValue, AttributeDefinition, DataType};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identity of a host entity instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub entity_type: String,
    pub entity_id: Uuid,
}

impl EntityRef {
    pub fn new(entity_type: &str, entity_id: Uuid) -> Self {
        Self {
            entity_type: entity_type.to_string(),
            entity_id,
        }
    }
}

/// Whether a table holds one row per attribute or many.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Multiplicity {
    Scalar,
    Multi,
}

/// A type-specific value table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValueTable {
    pub data_type: DataType,
    pub multiplicity: Multiplicity,
}

impl ValueTable {
    pub fn new(data_type: DataType, is_collection: bool) -> Self {
        Self {
            data_type,
            multiplicity: if is_collection {
                Multiplicity::Multi
            } else {
                Multiplicity::Scalar
            },
        }
    }

    pub fn is_multi(&self) -> bool {
        self.multiplicity == Multiplicity::Multi
    }

    /// Stable name, used as file name by the filesystem backend.
    pub fn name(&self) -> String {
        let suffix = match self.multiplicity {
            Multiplicity::Scalar => "scalar",
            Multiplicity::Multi => "multi",
        };
        format!("{}.{}", self.data_type.name(), suffix)
    }
}

impl fmt::Display for ValueTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// One persisted attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueRecord {
    pub id: Uuid,
    pub table: ValueTable,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub attribute_id: Uuid,
    pub value: AttrValue,
}

impl ValueRecord {
    pub fn new(
        table: ValueTable,
        entity: &EntityRef,
        definition: &AttributeDefinition,
        value: AttrValue,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            table,
            entity_type: entity.entity_type.clone(),
            entity_id: entity.entity_id,
            attribute_id: definition.id,
            value,
        }
    }

    /// Whether this record belongs to `(entity_id, attribute_id)`.
    pub fn belongs_to(&self, entity_id: &Uuid, attribute_id: &Uuid) -> bool {
        self.entity_id == *entity_id && self.attribute_id == *attribute_id
    }
}

/// When an interactor writes assigned values to the value store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritePolicy {
    /// Persist synchronously inside `set`.
    #[default]
    Immediate,
    /// Keep assignments in memory until an explicit flush.
    Deferred,
}
