use super::backend::{MetadataStore, ValueStore};
use crate::attributes::AttributeDefinition;
use crate::error::{EavError, Result};
use crate::model::{ValueRecord, ValueTable};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use uuid::Uuid;

/// In-memory metadata and value storage.
///
/// Uses `Mutex` so a single backend can be shared (behind an `Arc`) between the
/// process-wide manager and any number of interactors.
#[derive(Default)]
pub struct MemBackend {
    definitions: Mutex<HashMap<String, Vec<AttributeDefinition>>>,
    values: Mutex<HashMap<ValueTable, Vec<ValueRecord>>>,
    fetch_count: AtomicUsize,
    simulate_write_error: AtomicBool,
    simulate_metadata_error: AtomicBool,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an attribute. Appends to its entity type's definitions.
    pub fn define(&self, definition: AttributeDefinition) {
        self.definitions
            .lock()
            .entry(definition.entity_type.clone())
            .or_default()
            .push(definition);
    }

    pub fn with_definitions<I>(self, definitions: I) -> Self
    where
        I: IntoIterator<Item = AttributeDefinition>,
    {
        for definition in definitions {
            self.define(definition);
        }
        self
    }

    /// Number of `fetch_definitions` calls served (including failed ones).
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.store(simulate, Ordering::SeqCst);
    }

    /// Make `fetch_definitions` fail, as an unreachable metadata store would.
    pub fn set_simulate_metadata_error(&self, simulate: bool) {
        self.simulate_metadata_error.store(simulate, Ordering::SeqCst);
    }

    /// Snapshot of every record in `table`, in storage order.
    pub fn records(&self, table: ValueTable) -> Vec<ValueRecord> {
        self.values.lock().get(&table).cloned().unwrap_or_default()
    }

    fn check_writable(&self) -> Result<()> {
        if self.simulate_write_error.load(Ordering::SeqCst) {
            return Err(EavError::Store("Simulated write error".to_string()));
        }
        Ok(())
    }
}

impl MetadataStore for MemBackend {
    fn fetch_definitions(&self, entity_type: &str) -> Result<Vec<AttributeDefinition>> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        if self.simulate_metadata_error.load(Ordering::SeqCst) {
            return Err(EavError::Store("Simulated metadata error".to_string()));
        }
        let definitions = self.definitions.lock();
        Ok(definitions.get(entity_type).cloned().unwrap_or_default())
    }
}

impl ValueStore for MemBackend {
    fn load_value(
        &self,
        table: ValueTable,
        entity_id: &Uuid,
        attribute_id: &Uuid,
    ) -> Result<Option<ValueRecord>> {
        let values = self.values.lock();
        Ok(values.get(&table).and_then(|rows| {
            rows.iter()
                .find(|r| r.belongs_to(entity_id, attribute_id))
                .cloned()
        }))
    }

    fn persist_value(&self, record: &ValueRecord) -> Result<()> {
        self.check_writable()?;
        let mut values = self.values.lock();
        let rows = values.entry(record.table).or_default();
        match rows
            .iter_mut()
            .find(|r| r.belongs_to(&record.entity_id, &record.attribute_id))
        {
            Some(existing) => existing.value = record.value.clone(),
            None => rows.push(record.clone()),
        }
        Ok(())
    }

    fn load_collection(
        &self,
        table: ValueTable,
        entity_id: &Uuid,
        attribute_id: &Uuid,
    ) -> Result<Vec<ValueRecord>> {
        let values = self.values.lock();
        Ok(values
            .get(&table)
            .map(|rows| {
                rows.iter()
                    .filter(|r| r.belongs_to(entity_id, attribute_id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn persist_collection_member(&self, record: &ValueRecord) -> Result<()> {
        self.check_writable()?;
        let mut values = self.values.lock();
        let rows = values.entry(record.table).or_default();
        match rows.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => existing.value = record.value.clone(),
            None => rows.push(record.clone()),
        }
        Ok(())
    }

    fn clear_collection(
        &self,
        table: ValueTable,
        entity_id: &Uuid,
        attribute_id: &Uuid,
    ) -> Result<()> {
        self.check_writable()?;
        let mut values = self.values.lock();
        if let Some(rows) = values.get_mut(&table) {
            rows.retain(|r| !r.belongs_to(entity_id, attribute_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{AttrValue, DataType};
    use crate::model::EntityRef;

    fn scalar_record(entity: &EntityRef, definition: &AttributeDefinition, value: &str) -> ValueRecord {
        ValueRecord::new(
            ValueTable::new(DataType::String, false),
            entity,
            definition,
            value.into(),
        )
    }

    #[test]
    fn fetch_counts_every_call() {
        let backend = MemBackend::new()
            .with_definitions([AttributeDefinition::new("product", "color", "string")]);
        assert_eq!(backend.fetch_definitions("product").unwrap().len(), 1);
        assert!(backend.fetch_definitions("order").unwrap().is_empty());
        assert_eq!(backend.fetch_count(), 2);
    }

    #[test]
    fn simulated_metadata_error_fails_fetch() {
        let backend = MemBackend::new();
        backend.set_simulate_metadata_error(true);
        assert!(backend.fetch_definitions("product").is_err());
    }

    #[test]
    fn persist_value_updates_in_place() {
        let backend = MemBackend::new();
        let entity = EntityRef::new("product", Uuid::new_v4());
        let definition = AttributeDefinition::new("product", "color", "string");

        backend
            .persist_value(&scalar_record(&entity, &definition, "red"))
            .unwrap();
        backend
            .persist_value(&scalar_record(&entity, &definition, "blue"))
            .unwrap();

        let table = ValueTable::new(DataType::String, false);
        assert_eq!(backend.records(table).len(), 1);
        let loaded = backend
            .load_value(table, &entity.entity_id, &definition.id)
            .unwrap()
            .unwrap();
        assert_eq!(loaded.value, AttrValue::from("blue"));
    }

    #[test]
    fn collection_members_keep_insertion_order() {
        let backend = MemBackend::new();
        let entity = EntityRef::new("product", Uuid::new_v4());
        let definition = AttributeDefinition::new("product", "tags", "string").collection();
        let table = ValueTable::new(DataType::String, true);

        for tag in ["a", "b", "c"] {
            let record = ValueRecord::new(table, &entity, &definition, tag.into());
            backend.persist_collection_member(&record).unwrap();
        }

        let members = backend
            .load_collection(table, &entity.entity_id, &definition.id)
            .unwrap();
        let values: Vec<_> = members.iter().map(|r| r.value.clone()).collect();
        assert_eq!(values, vec!["a".into(), "b".into(), "c".into()]);
    }

    #[test]
    fn clear_collection_only_touches_one_attribute() {
        let backend = MemBackend::new();
        let entity = EntityRef::new("product", Uuid::new_v4());
        let tags = AttributeDefinition::new("product", "tags", "string").collection();
        let labels = AttributeDefinition::new("product", "labels", "string").collection();
        let table = ValueTable::new(DataType::String, true);

        backend
            .persist_collection_member(&ValueRecord::new(table, &entity, &tags, "a".into()))
            .unwrap();
        backend
            .persist_collection_member(&ValueRecord::new(table, &entity, &labels, "x".into()))
            .unwrap();

        backend
            .clear_collection(table, &entity.entity_id, &tags.id)
            .unwrap();

        assert!(backend
            .load_collection(table, &entity.entity_id, &tags.id)
            .unwrap()
            .is_empty());
        assert_eq!(
            backend
                .load_collection(table, &entity.entity_id, &labels.id)
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn simulated_write_error_fails_persist() {
        let backend = MemBackend::new();
        backend.set_simulate_write_error(true);
        let entity = EntityRef::new("product", Uuid::new_v4());
        let definition = AttributeDefinition::new("product", "color", "string");
        let result = backend.persist_value(&scalar_record(&entity, &definition, "red"));
        assert!(matches!(result, Err(EavError::Store(_))));
    }
}
