//! Attribute value types.
//!
//! This module defines the runtime representation of attribute values. The same
//! enum is used when reading through an interactor, when writing, and inside
//! persisted [`ValueRecord`](crate::model::ValueRecord)s.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Runtime representation of an attribute value.
///
/// Scalar attributes hold one of the scalar variants (or `Null` when unset);
/// collection attributes are read back as `List`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AttrValue {
    /// No value. The empty-equivalent of an unset scalar attribute.
    Null,

    /// Short string (e.g., `color`)
    String(String),

    /// Long-form text (e.g., `description`)
    Text(String),

    Integer(i64),

    /// Fixed-point number (e.g., `weight`)
    Decimal(Decimal),

    Boolean(bool),

    DateTime(DateTime<Utc>),

    /// Ordered values of a collection attribute (e.g., `tags`)
    List(Vec<AttrValue>),
}

impl AttrValue {
    /// Short name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            AttrValue::Null => "null",
            AttrValue::String(_) => "string",
            AttrValue::Text(_) => "text",
            AttrValue::Integer(_) => "integer",
            AttrValue::Decimal(_) => "decimal",
            AttrValue::Boolean(_) => "boolean",
            AttrValue::DateTime(_) => "datetime",
            AttrValue::List(_) => "list",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttrValue::Null)
    }

    /// Get the string if this is a String or Text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::String(s) | AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttrValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the list if this is a List.
    pub fn as_list(&self) -> Option<&[AttrValue]> {
        match self {
            AttrValue::List(v) => Some(v),
            _ => None,
        }
    }

    /// Flatten into the values a collection attribute should append.
    ///
    /// A `List` yields its elements, any other value yields itself.
    pub fn into_members(self) -> Vec<AttrValue> {
        match self {
            AttrValue::List(items) => items,
            single => vec![single],
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::String(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::String(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Integer(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Boolean(value)
    }
}

impl From<Decimal> for AttrValue {
    fn from(value: Decimal) -> Self {
        AttrValue::Decimal(value)
    }
}

impl From<DateTime<Utc>> for AttrValue {
    fn from(value: DateTime<Utc>) -> Self {
        AttrValue::DateTime(value)
    }
}

impl<T: Into<AttrValue>> From<Vec<T>> for AttrValue {
    fn from(values: Vec<T>) -> Self {
        AttrValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<AttrValue>> From<Option<T>> for AttrValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(AttrValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn as_str_covers_string_and_text() {
        assert_eq!(AttrValue::from("red").as_str(), Some("red"));
        assert_eq!(AttrValue::Text("long".into()).as_str(), Some("long"));
        assert_eq!(AttrValue::Integer(3).as_str(), None);
    }

    #[test]
    fn into_members_flattens_lists_only() {
        let list = AttrValue::from(vec!["a", "b"]);
        assert_eq!(
            list.into_members(),
            vec![AttrValue::from("a"), AttrValue::from("b")]
        );
        assert_eq!(AttrValue::from("c").into_members(), vec![AttrValue::from("c")]);
    }

    #[test]
    fn option_none_becomes_null() {
        let value: AttrValue = Option::<i64>::None.into();
        assert!(value.is_null());
        let value: AttrValue = Some(7i64).into();
        assert_eq!(value.as_i64(), Some(7));
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_string(&AttrValue::from("red")).unwrap();
        assert_eq!(json, r#"{"type":"string","value":"red"}"#);
        let back: AttrValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, AttrValue::from("red"));
    }
}
