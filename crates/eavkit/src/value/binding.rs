//! Attribute bindings.
//!
//! A binding connects one attribute definition to one entity instance's stored
//! value(s). It loads lazily, keeps assignments in memory and writes them when
//! flushed.
//!
//! ```text
//!   Unloaded --get--> Loaded --set--> Dirty --flush--> Persisted
//!                                       ^                  |
//!                                       +-------set--------+
//! ```
//!
//! `Loaded` and `Persisted` are stable: further reads reuse the in-memory value.
//! A failed flush leaves the binding `Dirty` with everything still pending.

use crate::attributes::{AttrValue, AttributeDefinition};
use crate::error::{EavError, Result};
use crate::model::{EntityRef, ValueRecord, ValueTable};
use crate::store::ValueStore;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    Unloaded,
    Loaded,
    Dirty,
    Persisted,
}

fn coerce(definition: &AttributeDefinition, table: ValueTable, value: AttrValue) -> Result<AttrValue> {
    let found = value.type_name();
    table
        .data_type
        .coerce(value)
        .ok_or_else(|| EavError::TypeMismatch {
            code: definition.code.clone(),
            expected: table.data_type.name().to_string(),
            found: found.to_string(),
        })
}

/// Binding of a single-valued attribute: at most one record.
#[derive(Debug, Clone)]
pub struct ScalarBinding {
    entity: EntityRef,
    definition: Arc<AttributeDefinition>,
    table: ValueTable,
    state: BindingState,
    record: Option<ValueRecord>,
}

impl ScalarBinding {
    pub(crate) fn new(entity: EntityRef, definition: Arc<AttributeDefinition>, table: ValueTable) -> Self {
        Self {
            entity,
            definition,
            table,
            state: BindingState::Unloaded,
            record: None,
        }
    }

    pub fn state(&self) -> BindingState {
        self.state
    }

    pub fn definition(&self) -> &Arc<AttributeDefinition> {
        &self.definition
    }

    pub fn table(&self) -> ValueTable {
        self.table
    }

    /// The stored (or assigned) record, if any.
    pub fn record(&self) -> Option<&ValueRecord> {
        self.record.as_ref()
    }

    /// Load from the store on first call; later calls are no-ops.
    pub fn load<S: ValueStore + ?Sized>(&mut self, store: &S) -> Result<()> {
        if self.state != BindingState::Unloaded {
            return Ok(());
        }
        self.record = store.load_value(self.table, &self.entity.entity_id, &self.definition.id)?;
        self.state = BindingState::Loaded;
        debug!(code = %self.definition.code, found = self.record.is_some(), "loaded scalar attribute");
        Ok(())
    }

    /// In-memory value, or the empty-equivalent when nothing is stored.
    pub fn current(&self) -> AttrValue {
        match &self.record {
            Some(record) => record.value.clone(),
            None => self.definition.empty_value(),
        }
    }

    pub fn value<S: ValueStore + ?Sized>(&mut self, store: &S) -> Result<AttrValue> {
        self.load(store)?;
        Ok(self.current())
    }

    /// Assign in memory. The existing record (if any) is updated, so a later
    /// flush rewrites it in place instead of inserting a second row.
    pub fn assign<S: ValueStore + ?Sized>(&mut self, store: &S, value: AttrValue) -> Result<()> {
        let value = coerce(&self.definition, self.table, value)?;
        self.load(store)?;
        match &mut self.record {
            Some(record) => record.value = value,
            None => {
                self.record = Some(ValueRecord::new(
                    self.table,
                    &self.entity,
                    &self.definition,
                    value,
                ))
            }
        }
        self.state = BindingState::Dirty;
        Ok(())
    }

    pub fn flush<S: ValueStore + ?Sized>(&mut self, store: &S) -> Result<()> {
        if self.state != BindingState::Dirty {
            return Ok(());
        }
        let Some(record) = &self.record else {
            self.state = BindingState::Persisted;
            return Ok(());
        };
        store.persist_value(record).map_err(|e| {
            warn!(code = %self.definition.code, error = %e, "failed to persist attribute");
            EavError::persistence(&self.definition.code, e)
        })?;
        self.state = BindingState::Persisted;
        debug!(code = %self.definition.code, "persisted scalar attribute");
        Ok(())
    }
}

/// The keys new collection members are stamped with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkContext {
    pub entity: EntityRef,
    pub attribute_id: Uuid,
    pub table: ValueTable,
}

/// Binding of a multi-valued attribute: an ordered list of records.
#[derive(Debug, Clone)]
pub struct CollectionBinding {
    entity: EntityRef,
    definition: Arc<AttributeDefinition>,
    table: ValueTable,
    state: BindingState,
    members: Vec<ValueRecord>,
    /// Ids of members not yet written, in insertion order.
    pending: Vec<Uuid>,
    replace_pending: bool,
    link: Option<LinkContext>,
}

impl CollectionBinding {
    pub(crate) fn new(entity: EntityRef, definition: Arc<AttributeDefinition>, table: ValueTable) -> Self {
        Self {
            entity,
            definition,
            table,
            state: BindingState::Unloaded,
            members: Vec::new(),
            pending: Vec::new(),
            replace_pending: false,
            link: None,
        }
    }

    pub fn state(&self) -> BindingState {
        self.state
    }

    pub fn definition(&self) -> &Arc<AttributeDefinition> {
        &self.definition
    }

    pub fn table(&self) -> ValueTable {
        self.table
    }

    pub fn members(&self) -> &[ValueRecord] {
        &self.members
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_linked(&self) -> bool {
        self.link.is_some()
    }

    pub fn link_context(&self) -> Option<&LinkContext> {
        self.link.as_ref()
    }

    /// Establish the association context new members are created under.
    ///
    /// Only the first call has an effect; it returns `true` when it did.
    /// `entity` and `definition` must be the ones the binding was built for,
    /// since loads and clears are keyed by those.
    pub fn link(&mut self, entity: &EntityRef, definition: &AttributeDefinition) -> Result<bool> {
        if *entity != self.entity || definition.id != self.definition.id {
            return Err(EavError::Store(format!(
                "Cannot link attribute '{}' of {} {} to {} {} (attribute {})",
                self.definition.code,
                self.entity.entity_type,
                self.entity.entity_id,
                entity.entity_type,
                entity.entity_id,
                definition.id
            )));
        }
        if self.link.is_some() {
            return Ok(false);
        }
        self.link = Some(LinkContext {
            entity: entity.clone(),
            attribute_id: definition.id,
            table: self.table,
        });
        Ok(true)
    }

    fn ensure_linked(&mut self) -> LinkContext {
        if let Some(context) = &self.link {
            return context.clone();
        }
        let context = LinkContext {
            entity: self.entity.clone(),
            attribute_id: self.definition.id,
            table: self.table,
        };
        self.link = Some(context.clone());
        context
    }

    pub fn load<S: ValueStore + ?Sized>(&mut self, store: &S) -> Result<()> {
        if self.state != BindingState::Unloaded {
            return Ok(());
        }
        self.members =
            store.load_collection(self.table, &self.entity.entity_id, &self.definition.id)?;
        self.state = BindingState::Loaded;
        debug!(code = %self.definition.code, count = self.members.len(), "loaded collection attribute");
        Ok(())
    }

    /// In-memory members, or the declared default while there are none.
    pub fn current(&self) -> AttrValue {
        if self.members.is_empty() {
            return self.definition.empty_value();
        }
        AttrValue::List(self.members.iter().map(|r| r.value.clone()).collect())
    }

    pub fn value<S: ValueStore + ?Sized>(&mut self, store: &S) -> Result<AttrValue> {
        self.load(store)?;
        Ok(self.current())
    }

    fn prepare(&mut self, value: AttrValue) -> Result<Vec<ValueRecord>> {
        let context = self.ensure_linked();
        value
            .into_members()
            .into_iter()
            .map(|member| {
                if member.is_null() {
                    return Err(EavError::TypeMismatch {
                        code: self.definition.code.clone(),
                        expected: self.table.data_type.name().to_string(),
                        found: member.type_name().to_string(),
                    });
                }
                let member = coerce(&self.definition, self.table, member)?;
                Ok(ValueRecord {
                    id: Uuid::new_v4(),
                    table: context.table,
                    entity_type: context.entity.entity_type.clone(),
                    entity_id: context.entity.entity_id,
                    attribute_id: context.attribute_id,
                    value: member,
                })
            })
            .collect()
    }

    /// Append `value` (each element when it is a `List`) after the existing
    /// members.
    pub fn assign<S: ValueStore + ?Sized>(&mut self, store: &S, value: AttrValue) -> Result<()> {
        let records = self.prepare(value)?;
        self.load(store)?;
        for record in records {
            self.pending.push(record.id);
            self.members.push(record);
        }
        self.state = BindingState::Dirty;
        Ok(())
    }

    /// Discard every member and use `value` instead. Stored members are removed
    /// on the next flush.
    pub fn replace(&mut self, value: AttrValue) -> Result<()> {
        let records = self.prepare(value)?;
        self.pending = records.iter().map(|r| r.id).collect();
        self.members = records;
        self.replace_pending = true;
        self.state = BindingState::Dirty;
        Ok(())
    }

    pub fn flush<S: ValueStore + ?Sized>(&mut self, store: &S) -> Result<()> {
        if self.state != BindingState::Dirty {
            return Ok(());
        }
        let code = self.definition.code.clone();
        let fail = |e: EavError| {
            warn!(code = %code, error = %e, "failed to persist attribute");
            EavError::persistence(&code, e)
        };

        if self.replace_pending {
            store
                .clear_collection(self.table, &self.entity.entity_id, &self.definition.id)
                .map_err(fail)?;
            self.replace_pending = false;
        }

        while let Some(id) = self.pending.first().copied() {
            if let Some(record) = self.members.iter().find(|r| r.id == id) {
                store.persist_collection_member(record).map_err(fail)?;
            }
            self.pending.remove(0);
        }

        self.state = BindingState::Persisted;
        debug!(code = %self.definition.code, count = self.members.len(), "persisted collection attribute");
        Ok(())
    }
}

/// A binding of either shape.
#[derive(Debug, Clone)]
pub enum AttributeBinding {
    Scalar(ScalarBinding),
    Collection(CollectionBinding),
}

impl AttributeBinding {
    pub fn state(&self) -> BindingState {
        match self {
            AttributeBinding::Scalar(b) => b.state(),
            AttributeBinding::Collection(b) => b.state(),
        }
    }

    pub fn definition(&self) -> &Arc<AttributeDefinition> {
        match self {
            AttributeBinding::Scalar(b) => b.definition(),
            AttributeBinding::Collection(b) => b.definition(),
        }
    }

    pub fn code(&self) -> &str {
        &self.definition().code
    }

    pub fn table(&self) -> ValueTable {
        match self {
            AttributeBinding::Scalar(b) => b.table(),
            AttributeBinding::Collection(b) => b.table(),
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, AttributeBinding::Collection(_))
    }

    pub fn is_loaded(&self) -> bool {
        self.state() != BindingState::Unloaded
    }

    pub fn is_dirty(&self) -> bool {
        self.state() == BindingState::Dirty
    }

    pub fn load<S: ValueStore + ?Sized>(&mut self, store: &S) -> Result<()> {
        match self {
            AttributeBinding::Scalar(b) => b.load(store),
            AttributeBinding::Collection(b) => b.load(store),
        }
    }

    pub fn value<S: ValueStore + ?Sized>(&mut self, store: &S) -> Result<AttrValue> {
        match self {
            AttributeBinding::Scalar(b) => b.value(store),
            AttributeBinding::Collection(b) => b.value(store),
        }
    }

    pub fn assign<S: ValueStore + ?Sized>(&mut self, store: &S, value: AttrValue) -> Result<()> {
        match self {
            AttributeBinding::Scalar(b) => b.assign(store, value),
            AttributeBinding::Collection(b) => b.assign(store, value),
        }
    }

    /// Replace the whole value. For scalars this is the same as `assign`.
    pub fn replace<S: ValueStore + ?Sized>(&mut self, store: &S, value: AttrValue) -> Result<()> {
        match self {
            AttributeBinding::Scalar(b) => b.assign(store, value),
            AttributeBinding::Collection(b) => b.replace(value),
        }
    }

    pub fn flush<S: ValueStore + ?Sized>(&mut self, store: &S) -> Result<()> {
        match self {
            AttributeBinding::Scalar(b) => b.flush(store),
            AttributeBinding::Collection(b) => b.flush(store),
        }
    }

    /// Link a collection binding. Scalar bindings have nothing to link.
    pub fn link(&mut self, entity: &EntityRef, definition: &AttributeDefinition) -> Result<bool> {
        match self {
            AttributeBinding::Scalar(_) => Ok(false),
            AttributeBinding::Collection(b) => b.link(entity, definition),
        }
    }

    pub fn as_collection(&self) -> Option<&CollectionBinding> {
        match self {
            AttributeBinding::Collection(b) => Some(b),
            AttributeBinding::Scalar(_) => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&ScalarBinding> {
        match self {
            AttributeBinding::Scalar(b) => Some(b),
            AttributeBinding::Collection(_) => None,
        }
    }
}
