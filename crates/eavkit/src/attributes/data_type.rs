//! Data types and the type-name registry.
//!
//! Attribute definitions carry their type as the raw name the metadata store
//! returned. The [`TypeRegistry`] resolves those names into a [`DataType`], which
//! in turn decides which value table an attribute is stored in.

use super::AttrValue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The kind of value an attribute holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    String,
    Text,
    Integer,
    Decimal,
    Boolean,
    #[serde(rename = "datetime")]
    DateTime,
}

impl DataType {
    pub const ALL: [DataType; 6] = [
        DataType::String,
        DataType::Text,
        DataType::Integer,
        DataType::Decimal,
        DataType::Boolean,
        DataType::DateTime,
    ];

    /// Canonical name, as accepted by [`TypeRegistry::resolve`].
    pub fn name(&self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::Text => "text",
            DataType::Integer => "integer",
            DataType::Decimal => "decimal",
            DataType::Boolean => "boolean",
            DataType::DateTime => "datetime",
        }
    }

    /// Convert `value` into this type's representation.
    ///
    /// Returns `None` when the value cannot be stored under this type.
    /// `Null` passes through unchanged; string-like values move freely between
    /// `String` and `Text`, and integers widen into decimals.
    pub fn coerce(&self, value: AttrValue) -> Option<AttrValue> {
        match (self, value) {
            (_, AttrValue::Null) => Some(AttrValue::Null),
            (DataType::String, AttrValue::String(s) | AttrValue::Text(s)) => {
                Some(AttrValue::String(s))
            }
            (DataType::Text, AttrValue::String(s) | AttrValue::Text(s)) => {
                Some(AttrValue::Text(s))
            }
            (DataType::Integer, v @ AttrValue::Integer(_)) => Some(v),
            (DataType::Decimal, v @ AttrValue::Decimal(_)) => Some(v),
            (DataType::Decimal, AttrValue::Integer(i)) => Some(AttrValue::Decimal(i.into())),
            (DataType::Boolean, v @ AttrValue::Boolean(_)) => Some(v),
            (DataType::DateTime, v @ AttrValue::DateTime(_)) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Built-in type names. Lookup is case-insensitive.
pub const BUILTIN_ALIASES: &[(&str, DataType)] = &[
    ("string", DataType::String),
    ("varchar", DataType::String),
    ("text", DataType::Text),
    ("integer", DataType::Integer),
    ("int", DataType::Integer),
    ("decimal", DataType::Decimal),
    ("float", DataType::Decimal),
    ("boolean", DataType::Boolean),
    ("bool", DataType::Boolean),
    ("datetime", DataType::DateTime),
    ("timestamp", DataType::DateTime),
];

/// Resolves raw type names into [`DataType`]s.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    aliases: HashMap<String, DataType>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self {
            aliases: BUILTIN_ALIASES
                .iter()
                .map(|(name, data_type)| (name.to_string(), *data_type))
                .collect(),
        }
    }
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an extra name for an existing data type.
    pub fn with_alias(mut self, alias: &str, data_type: DataType) -> Self {
        self.aliases.insert(alias.to_ascii_lowercase(), data_type);
        self
    }

    /// Register aliases given as `alias -> canonical name` pairs (the shape used
    /// in configuration). Returns the first alias whose target does not resolve.
    pub fn with_aliases<'a, I>(mut self, aliases: I) -> std::result::Result<Self, (String, String)>
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        for (alias, target) in aliases {
            match self.resolve(target) {
                Some(data_type) => {
                    self.aliases.insert(alias.to_ascii_lowercase(), data_type);
                }
                None => return Err((alias.clone(), target.clone())),
            }
        }
        Ok(self)
    }

    pub fn resolve(&self, name: &str) -> Option<DataType> {
        self.aliases.get(&name.trim().to_ascii_lowercase()).copied()
    }
}
