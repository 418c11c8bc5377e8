//! # Configuration
//!
//! eavkit configuration is derived with [`confique`], layering environment
//! variables over an optional TOML file over compiled defaults.
//!
//! ## Available Settings
//!
//! | Key | Env | Default | Description |
//! |-----|-----|---------|-------------|
//! | `write_policy` | `EAV_WRITE_POLICY` | `immediate` | Default policy for new interactors (`immediate` or `deferred`) |
//! | `cache_prefix` | `EAV_CACHE_PREFIX` | `eav` | Namespace for attribute cache keys |
//! | `type_aliases` | | none | Extra data type names, as `alias = "canonical"` |
//!
//! ## Example
//!
//! ```toml
//! write_policy = "deferred"
//! cache_prefix = "shop"
//!
//! [type_aliases]
//! money = "decimal"
//! flag = "boolean"
//! ```

use crate::attributes::TypeRegistry;
use crate::cache::DEFAULT_PREFIX;
use crate::error::{EavError, Result};
use crate::model::WritePolicy;
use confique::Config;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Configuration for eavkit, usually stored in `eav.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EavConfig {
    /// Write policy for new interactors: "immediate" or "deferred".
    #[config(env = "EAV_WRITE_POLICY", default = "immediate")]
    pub write_policy: String,

    /// Namespace for attribute cache keys.
    #[config(env = "EAV_CACHE_PREFIX", default = "eav")]
    pub cache_prefix: String,

    /// Additional data type names, mapped to a built-in type name.
    pub type_aliases: Option<HashMap<String, String>>,
}

impl Default for EavConfig {
    fn default() -> Self {
        Self {
            write_policy: "immediate".to_string(),
            cache_prefix: DEFAULT_PREFIX.to_string(),
            type_aliases: None,
        }
    }
}

impl EavConfig {
    /// Load from the environment, then `path` (if given), then defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Self::builder().env();
        if let Some(path) = path {
            if !path.exists() {
                return Err(EavError::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            builder = builder.file(path);
        }
        let config = builder
            .load()
            .map_err(|e| EavError::Config(e.to_string()))?;
        // Reject a bad policy at load time rather than on first attach
        config.write_policy()?;
        Ok(config)
    }

    /// The parsed write policy.
    pub fn write_policy(&self) -> Result<WritePolicy> {
        match self.write_policy.trim().to_ascii_lowercase().as_str() {
            "immediate" => Ok(WritePolicy::Immediate),
            "deferred" => Ok(WritePolicy::Deferred),
            other => Err(EavError::Config(format!(
                "unknown write policy '{}' (expected 'immediate' or 'deferred')",
                other
            ))),
        }
    }

    /// Built-in data types plus the configured aliases.
    pub fn type_registry(&self) -> Result<TypeRegistry> {
        let registry = TypeRegistry::new();
        match &self.type_aliases {
            None => Ok(registry),
            Some(aliases) => registry.with_aliases(aliases).map_err(|(alias, target)| {
                EavError::Config(format!(
                    "type alias '{}' points to unknown data type '{}'",
                    alias, target
                ))
            }),
        }
    }
}
