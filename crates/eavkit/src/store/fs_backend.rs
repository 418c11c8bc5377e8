use super::backend::{MetadataStore, ValueStore};
use crate::attributes::AttributeDefinition;
use crate::error::{EavError, Result};
use crate::model::{ValueRecord, ValueTable};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// JSON-file backend.
///
/// ```text
/// {root}/
/// ├── attributes.json          # entity_type -> [AttributeDefinition]
/// └── values/
///     ├── string.scalar.json   # [ValueRecord]
///     ├── string.multi.json
///     └── ...
/// ```
///
/// Every write goes to a temporary file that is then renamed over the target.
/// Writes rewrite a whole file, so each load-modify-save runs under a lock
/// shared by everything holding this backend. Separate `FsBackend` instances
/// over one root do not coordinate.
pub struct FsBackend {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FsBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn definitions_file(&self) -> PathBuf {
        self.root.join("attributes.json")
    }

    fn values_dir(&self) -> PathBuf {
        self.root.join("values")
    }

    fn table_file(&self, table: ValueTable) -> PathBuf {
        self.values_dir().join(format!("{}.json", table.name()))
    }

    fn ensure_dir(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path).map_err(EavError::Io)?;
        }
        Ok(())
    }

    fn read_json<T: DeserializeOwned + Default>(&self, path: &Path) -> Result<T> {
        if !path.exists() {
            return Ok(T::default());
        }
        let content = fs::read_to_string(path).map_err(EavError::Io)?;
        serde_json::from_str(&content).map_err(EavError::Serialization)
    }

    fn write_json<T: Serialize>(&self, path: &Path, data: &T) -> Result<()> {
        let dir = path
            .parent()
            .ok_or_else(|| EavError::Store(format!("No parent directory for {}", path.display())))?;
        self.ensure_dir(dir)?;

        let content = serde_json::to_string_pretty(data).map_err(EavError::Serialization)?;
        let tmp_file = dir.join(format!(".eav-{}.tmp", Uuid::new_v4()));
        fs::write(&tmp_file, content).map_err(EavError::Io)?;
        fs::rename(&tmp_file, path).map_err(EavError::Io)?;
        Ok(())
    }

    fn load_definitions(&self) -> Result<HashMap<String, Vec<AttributeDefinition>>> {
        self.read_json(&self.definitions_file())
    }

    /// Replace every definition of `entity_type`.
    pub fn save_definitions(
        &self,
        entity_type: &str,
        definitions: &[AttributeDefinition],
    ) -> Result<()> {
        let _guard = self.write_lock.lock();
        let mut all = self.load_definitions()?;
        all.insert(entity_type.to_string(), definitions.to_vec());
        self.write_json(&self.definitions_file(), &all)
    }

    /// Append one definition to its entity type.
    pub fn define(&self, definition: AttributeDefinition) -> Result<()> {
        let _guard = self.write_lock.lock();
        let mut all = self.load_definitions()?;
        all.entry(definition.entity_type.clone())
            .or_default()
            .push(definition);
        self.write_json(&self.definitions_file(), &all)
    }

    fn load_table(&self, table: ValueTable) -> Result<Vec<ValueRecord>> {
        self.read_json(&self.table_file(table))
    }

    fn save_table(&self, table: ValueTable, rows: &[ValueRecord]) -> Result<()> {
        self.write_json(&self.table_file(table), &rows)
    }
}

impl MetadataStore for FsBackend {
    fn fetch_definitions(&self, entity_type: &str) -> Result<Vec<AttributeDefinition>> {
        let mut all = self.load_definitions()?;
        Ok(all.remove(entity_type).unwrap_or_default())
    }
}

impl ValueStore for FsBackend {
    fn load_value(
        &self,
        table: ValueTable,
        entity_id: &Uuid,
        attribute_id: &Uuid,
    ) -> Result<Option<ValueRecord>> {
        Ok(self
            .load_table(table)?
            .into_iter()
            .find(|r| r.belongs_to(entity_id, attribute_id)))
    }

    fn persist_value(&self, record: &ValueRecord) -> Result<()> {
        let _guard = self.write_lock.lock();
        let mut rows = self.load_table(record.table)?;
        match rows
            .iter_mut()
            .find(|r| r.belongs_to(&record.entity_id, &record.attribute_id))
        {
            Some(existing) => existing.value = record.value.clone(),
            None => rows.push(record.clone()),
        }
        self.save_table(record.table, &rows)
    }

    fn load_collection(
        &self,
        table: ValueTable,
        entity_id: &Uuid,
        attribute_id: &Uuid,
    ) -> Result<Vec<ValueRecord>> {
        Ok(self
            .load_table(table)?
            .into_iter()
            .filter(|r| r.belongs_to(entity_id, attribute_id))
            .collect())
    }

    fn persist_collection_member(&self, record: &ValueRecord) -> Result<()> {
        let _guard = self.write_lock.lock();
        let mut rows = self.load_table(record.table)?;
        match rows.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => existing.value = record.value.clone(),
            None => rows.push(record.clone()),
        }
        self.save_table(record.table, &rows)
    }

    fn clear_collection(
        &self,
        table: ValueTable,
        entity_id: &Uuid,
        attribute_id: &Uuid,
    ) -> Result<()> {
        let _guard = self.write_lock.lock();
        let mut rows = self.load_table(table)?;
        let before = rows.len();
        rows.retain(|r| !r.belongs_to(entity_id, attribute_id));
        if rows.len() != before {
            self.save_table(table, &rows)?;
        }
        Ok(())
    }
}
