//! # Storage Layer
//!
//! The backing stores are external collaborators. This module defines the two
//! seams the attribute subsystem talks through, and ships two implementations.
//!
//! - [`MetadataStore`]: where attribute definitions come from. Queried by the
//!   [`AttributeManager`](crate::manager::AttributeManager) on a cache miss only.
//! - [`ValueStore`]: where attribute values live. Every call is scoped to one
//!   attribute of one entity and is made by a binding.
//!
//! ## Value Rows
//!
//! Values are [`ValueRecord`](crate::model::ValueRecord)s keyed by
//! `(entity_id, attribute_id)` inside a type-specific table:
//! - Scalar tables hold at most one row per key; `persist_value` updates it in place.
//! - Multi tables hold any number of rows per key, in insertion order.
//! - Rows are never deleted implicitly. `clear_collection` exists for the explicit
//!   replace operation of collection bindings.
//!
//! ## Implementations
//!
//! - [`mem_backend::MemBackend`]: in-memory, with failure simulation and fetch
//!   counting for tests.
//! - [`fs_backend::FsBackend`]: JSON files with atomic writes.

pub mod backend;
pub mod fs_backend;
pub mod mem_backend;

pub use backend::{MetadataStore, ValueStore};
