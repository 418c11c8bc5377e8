//! # Attribute Definitions
//!
//! Everything that describes *what* a dynamic attribute is, independent of any
//! entity instance:
//!
//! - **Definitions**: [`AttributeDefinition`] declares one attribute of an entity
//!   type; [`AttributeDefinitionSet`] keys them by code in definition order.
//! - **Types**: [`DataType`] and the [`TypeRegistry`] that resolves raw type names
//!   (as stored by the metadata store) into data types.
//! - **Values**: [`AttrValue`], the runtime value used for reads and writes.
//!
//! ## Data Types
//!
//! | Type | Aliases | Value |
//! |------|---------|-------|
//! | `string` | `varchar` | `AttrValue::String` |
//! | `text` | | `AttrValue::Text` |
//! | `integer` | `int` | `AttrValue::Integer` |
//! | `decimal` | `float` | `AttrValue::Decimal` |
//! | `boolean` | `bool` | `AttrValue::Boolean` |
//! | `datetime` | `timestamp` | `AttrValue::DateTime` |
//!
//! Collection attributes read back as `AttrValue::List` of the member type.

mod data_type;
mod definition;
mod value;

pub use data_type::{DataType, TypeRegistry, BUILTIN_ALIASES};
pub use definition::{AttributeDefinition, AttributeDefinitionSet};
pub use value::AttrValue;
