//! Attribute definitions and definition sets.

use super::AttrValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Declaration of one dynamic attribute for an entity type.
///
/// `data_type` is kept as the raw name the metadata store returned; it is
/// resolved (and rejected if unknown) when a binding is built for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    pub id: Uuid,
    pub entity_type: String,
    pub code: String,
    pub data_type: String,
    #[serde(default)]
    pub is_collection: bool,
    #[serde(default)]
    pub label: Option<String>,
    /// Returned by reads while no value has been stored. A collection's
    /// default is a `List` of members.
    #[serde(default)]
    pub default_value: Option<AttrValue>,
}

impl AttributeDefinition {
    pub fn new(entity_type: &str, code: &str, data_type: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            entity_type: entity_type.to_string(),
            code: code.to_string(),
            data_type: data_type.to_string(),
            is_collection: false,
            label: None,
            default_value: None,
        }
    }

    /// Mark the attribute as multi-valued.
    pub fn collection(mut self) -> Self {
        self.is_collection = true;
        self
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn with_default(mut self, value: impl Into<AttrValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// The value a read yields while nothing has been stored.
    pub fn empty_value(&self) -> AttrValue {
        match (&self.default_value, self.is_collection) {
            (Some(default), true) => AttrValue::List(default.clone().into_members()),
            (Some(default), false) => default.clone(),
            (None, true) => AttrValue::List(Vec::new()),
            (None, false) => AttrValue::Null,
        }
    }
}

/// Definitions of one entity type, keyed by code, in definition order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeDefinitionSet {
    definitions: IndexMap<String, Arc<AttributeDefinition>>,
}

impl AttributeDefinitionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key `definitions` by code.
    ///
    /// A repeated code replaces the earlier definition but keeps its position.
    pub fn from_definitions<I>(definitions: I) -> Self
    where
        I: IntoIterator<Item = AttributeDefinition>,
    {
        let mut set = Self::new();
        for definition in definitions {
            set.insert(definition);
        }
        set
    }

    pub fn insert(&mut self, definition: AttributeDefinition) {
        self.definitions
            .insert(definition.code.clone(), Arc::new(definition));
    }

    pub fn get(&self, code: &str) -> Option<&Arc<AttributeDefinition>> {
        self.definitions.get(code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.definitions.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<AttributeDefinition>> {
        self.definitions.values()
    }

    /// Collection-valued definitions only, in definition order.
    pub fn collections(&self) -> impl Iterator<Item = &Arc<AttributeDefinition>> {
        self.iter().filter(|definition| definition.is_collection)
    }
}
