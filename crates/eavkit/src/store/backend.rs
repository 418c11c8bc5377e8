use crate::attributes::AttributeDefinition;
use crate::error::Result;
use crate::model::{ValueRecord, ValueTable};
use std::sync::Arc;
use uuid::Uuid;

/// Source of attribute definitions.
///
/// Implementations report transport or query problems as errors; the manager
/// maps them to `MetadataUnavailable` and never caches a failed fetch.
pub trait MetadataStore {
    /// All definitions declared for `entity_type`, in definition order.
    fn fetch_definitions(&self, entity_type: &str) -> Result<Vec<AttributeDefinition>>;
}

/// Raw storage for attribute values.
///
/// Every call is scoped to a single attribute of a single entity. Handles are
/// borrowed for the duration of one call.
pub trait ValueStore {
    // --- Scalar values ---

    /// Load the single record for `(entity_id, attribute_id)`.
    /// Returns Ok(None) if the attribute was never set.
    fn load_value(
        &self,
        table: ValueTable,
        entity_id: &Uuid,
        attribute_id: &Uuid,
    ) -> Result<Option<ValueRecord>>;

    /// Insert the record, or update the existing one for the same
    /// `(entity_id, attribute_id)` in place.
    fn persist_value(&self, record: &ValueRecord) -> Result<()>;

    // --- Collection values ---

    /// Load all members for `(entity_id, attribute_id)` in insertion order.
    fn load_collection(
        &self,
        table: ValueTable,
        entity_id: &Uuid,
        attribute_id: &Uuid,
    ) -> Result<Vec<ValueRecord>>;

    /// Append one member. A member with the same record id is updated in place.
    fn persist_collection_member(&self, record: &ValueRecord) -> Result<()>;

    /// Remove every member for `(entity_id, attribute_id)`.
    /// Only used by an explicit replace.
    fn clear_collection(&self, table: ValueTable, entity_id: &Uuid, attribute_id: &Uuid)
        -> Result<()>;
}

impl<T: MetadataStore + ?Sized> MetadataStore for Arc<T> {
    fn fetch_definitions(&self, entity_type: &str) -> Result<Vec<AttributeDefinition>> {
        (**self).fetch_definitions(entity_type)
    }
}

impl<T: ValueStore + ?Sized> ValueStore for Arc<T> {
    fn load_value(
        &self,
        table: ValueTable,
        entity_id: &Uuid,
        attribute_id: &Uuid,
    ) -> Result<Option<ValueRecord>> {
        (**self).load_value(table, entity_id, attribute_id)
    }

    fn persist_value(&self, record: &ValueRecord) -> Result<()> {
        (**self).persist_value(record)
    }

    fn load_collection(
        &self,
        table: ValueTable,
        entity_id: &Uuid,
        attribute_id: &Uuid,
    ) -> Result<Vec<ValueRecord>> {
        (**self).load_collection(table, entity_id, attribute_id)
    }

    fn persist_collection_member(&self, record: &ValueRecord) -> Result<()> {
        (**self).persist_collection_member(record)
    }

    fn clear_collection(
        &self,
        table: ValueTable,
        entity_id: &Uuid,
        attribute_id: &Uuid,
    ) -> Result<()> {
        (**self).clear_collection(table, entity_id, attribute_id)
    }
}
