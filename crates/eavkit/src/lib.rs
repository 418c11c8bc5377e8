//! # eavkit Architecture
//!
//! eavkit attaches **dynamic attributes** to record-oriented entities using the
//! Entity-Attribute-Value pattern. Attribute definitions are declared per entity
//! type at runtime; values live in typed value tables keyed by
//! `(entity_type, entity_id, attribute_id)`.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Host entity (entity.rs)                                    │
//! │  - EavModel: native record + interactor                     │
//! │  - Attribute access, relation fallback, dispatch            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Interactor (interactor.rs)                                 │
//! │  - is_attribute / get / set / flush per instance            │
//! │  - Immediate or deferred write policy                       │
//! └─────────────────────────────────────────────────────────────┘
//!               │                               │
//!               ▼                               ▼
//! ┌───────────────────────────┐   ┌───────────────────────────┐
//! │  RelationBuilder          │   │  AttributeManager         │
//! │  (relation.rs, value/)    │   │  (manager.rs, cache.rs)   │
//! │  - one binding per code   │   │  - read-through cache of  │
//! │  - built once per entity  │   │    definition sets        │
//! └───────────────────────────┘   └───────────────────────────┘
//!               │                               │
//!               ▼                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage (store/)                                           │
//! │  - ValueStore / MetadataStore traits                        │
//! │  - MemBackend (testing), FsBackend (JSON files)             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`api::EavApi`] wires these layers together for a host application.
//!
//! ## No Output, No Subscriber
//!
//! The library never prints. Diagnostics are emitted as `tracing` events and it
//! is up to the host to install a subscriber.
//!
//! ## Testing Strategy
//!
//! 1. **Unit tests** next to each module, over [`store::mem_backend::MemBackend`].
//! 2. **Integration tests** in `tests/`, covering the end-to-end product scenario
//!    and the JSON file backend.
//! 3. **Fixtures** in `test_utils` (enabled for tests or with the `test_utils`
//!    feature).

pub mod api;
pub mod attributes;
pub mod cache;
pub mod config;
pub mod entity;
pub mod error;
pub mod interactor;
pub mod manager;
pub mod model;
pub mod relation;
pub mod store;
pub mod value;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

pub use api::EavApi;
pub use attributes::{AttrValue, AttributeDefinition, AttributeDefinitionSet, DataType};
pub use cache::AttributeCache;
pub use config::EavConfig;
pub use entity::{Dispatch, EavModel, NativeRecord, RelationValue};
pub use error::{EavError, Result};
pub use interactor::{Interactor, Resolution};
pub use manager::AttributeManager;
pub use model::{EntityRef, ValueTable, WritePolicy};
pub use relation::RelationBuilder;
pub use value::ValueBuilder;
