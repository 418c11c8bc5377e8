//! # Value Builder
//!
//! Turns one attribute definition into a binding for one entity instance.
//!
//! The storage strategy is picked from `(data_type, is_collection)` only, never
//! from a runtime value, so every instance stores a given attribute in the same
//! [`ValueTable`]:
//!
//! | `is_collection` | Binding | Store calls |
//! |-----------------|---------|-------------|
//! | `false` | [`ScalarBinding`] | `load_value` / `persist_value` |
//! | `true` | [`CollectionBinding`] | `load_collection` / `persist_collection_member` |
//!
//! An unrecognized data type fails the build with `InvalidDataType` right away,
//! instead of surfacing on first access.

mod binding;

pub use binding::{
    AttributeBinding, BindingState, CollectionBinding, LinkContext, ScalarBinding,
};

use crate::attributes::{AttrValue, AttributeDefinition, TypeRegistry};
use crate::error::{EavError, Result};
use crate::model::{EntityRef, ValueTable};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct ValueBuilder {
    types: TypeRegistry,
}

impl ValueBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_types(types: TypeRegistry) -> Self {
        Self { types }
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// The table `definition` is stored in.
    pub fn table_for(&self, definition: &AttributeDefinition) -> Result<ValueTable> {
        let data_type =
            self.types
                .resolve(&definition.data_type)
                .ok_or_else(|| EavError::InvalidDataType {
                    code: definition.code.clone(),
                    data_type: definition.data_type.clone(),
                })?;
        Ok(ValueTable::new(data_type, definition.is_collection))
    }

    /// The declared default converted to the attribute's data type and shape.
    ///
    /// A collection default becomes a `List` of members; null members are
    /// rejected there, as they are on assignment.
    pub fn default_for(
        &self,
        definition: &AttributeDefinition,
        table: ValueTable,
    ) -> Result<Option<AttrValue>> {
        let Some(default) = &definition.default_value else {
            return Ok(None);
        };
        let mismatch = |found: &AttrValue| EavError::TypeMismatch {
            code: definition.code.clone(),
            expected: table.data_type.name().to_string(),
            found: found.type_name().to_string(),
        };

        if !definition.is_collection {
            return table
                .data_type
                .coerce(default.clone())
                .map(Some)
                .ok_or_else(|| mismatch(default));
        }

        let members = default
            .clone()
            .into_members()
            .into_iter()
            .map(|member| {
                if member.is_null() {
                    return Err(mismatch(&member));
                }
                table
                    .data_type
                    .coerce(member.clone())
                    .ok_or_else(|| mismatch(&member))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Some(AttrValue::List(members)))
    }

    /// Bind `definition` to `entity`. Fails with `InvalidDataType` for an unknown
    /// type and `TypeMismatch` for a default that does not fit it.
    pub fn build(
        &self,
        definition: &Arc<AttributeDefinition>,
        entity: &EntityRef,
    ) -> Result<AttributeBinding> {
        let table = self.table_for(definition)?;
        let default = self.default_for(definition, table)?;
        let definition = if default == definition.default_value {
            definition.clone()
        } else {
            Arc::new(AttributeDefinition {
                default_value: default,
                ..AttributeDefinition::clone(definition)
            })
        };
        let binding = if definition.is_collection {
            AttributeBinding::Collection(CollectionBinding::new(entity.clone(), definition, table))
        } else {
            AttributeBinding::Scalar(ScalarBinding::new(entity.clone(), definition, table))
        };
        Ok(binding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::DataType;
    use crate::model::Multiplicity;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn entity() -> EntityRef {
        EntityRef::new("product", Uuid::new_v4())
    }

    #[test]
    fn scalar_definition_builds_scalar_binding() {
        let definition = Arc::new(AttributeDefinition::new("product", "color", "varchar"));
        let binding = ValueBuilder::new().build(&definition, &entity()).unwrap();

        assert!(!binding.is_collection());
        assert_eq!(binding.table(), ValueTable::new(DataType::String, false));
        assert_eq!(binding.state(), BindingState::Unloaded);
    }

    #[test]
    fn collection_definition_builds_collection_binding() {
        let definition =
            Arc::new(AttributeDefinition::new("product", "sizes", "integer").collection());
        let binding = ValueBuilder::new().build(&definition, &entity()).unwrap();

        assert!(binding.is_collection());
        assert_eq!(binding.table().multiplicity, Multiplicity::Multi);
        assert_eq!(binding.table().data_type, DataType::Integer);
    }

    #[test]
    fn same_definition_resolves_same_table_for_every_instance() {
        let builder = ValueBuilder::new();
        let definition = Arc::new(AttributeDefinition::new("product", "weight", "decimal"));
        let a = builder.build(&definition, &entity()).unwrap();
        let b = builder.build(&definition, &entity()).unwrap();
        assert_eq!(a.table(), b.table());
    }

    #[test]
    fn unknown_data_type_fails_at_build_time() {
        let definition = Arc::new(AttributeDefinition::new("product", "photo", "blob"));
        let err = ValueBuilder::new().build(&definition, &entity()).unwrap_err();
        assert!(matches!(
            err,
            EavError::InvalidDataType { ref code, ref data_type }
                if code == "photo" && data_type == "blob"
        ));
    }

    #[test]
    fn custom_types_are_honored() {
        let types = TypeRegistry::new().with_alias("money", DataType::Decimal);
        let definition = Arc::new(AttributeDefinition::new("product", "price", "money"));
        let binding = ValueBuilder::with_types(types)
            .build(&definition, &entity())
            .unwrap();
        assert_eq!(binding.table().data_type, DataType::Decimal);
    }

    #[test]
    fn default_must_fit_the_data_type() {
        let definition =
            Arc::new(AttributeDefinition::new("product", "stock", "integer").with_default("lots"));
        let err = ValueBuilder::new().build(&definition, &entity()).unwrap_err();
        assert!(matches!(
            err,
            EavError::TypeMismatch { ref code, ref expected, ref found }
                if code == "stock" && expected == "integer" && found == "string"
        ));
    }

    #[test]
    fn default_is_converted_to_the_data_type() {
        let definition =
            Arc::new(AttributeDefinition::new("product", "weight", "decimal").with_default(0i64));
        let binding = ValueBuilder::new().build(&definition, &entity()).unwrap();
        assert_eq!(
            binding.definition().default_value,
            Some(AttrValue::Decimal(Decimal::ZERO))
        );
    }

    #[test]
    fn collection_default_becomes_a_checked_list() {
        let builder = ValueBuilder::new();
        let single = Arc::new(
            AttributeDefinition::new("product", "sizes", "integer")
                .collection()
                .with_default(42i64),
        );
        let binding = builder.build(&single, &entity()).unwrap();
        assert_eq!(
            binding.definition().default_value,
            Some(AttrValue::from(vec![42i64]))
        );

        let wrong = Arc::new(
            AttributeDefinition::new("product", "sizes", "integer")
                .collection()
                .with_default(vec!["s", "m"]),
        );
        assert!(matches!(
            builder.build(&wrong, &entity()),
            Err(EavError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn fitting_default_keeps_the_shared_definition() {
        let definition =
            Arc::new(AttributeDefinition::new("product", "color", "string").with_default("black"));
        let binding = ValueBuilder::new().build(&definition, &entity()).unwrap();
        assert!(Arc::ptr_eq(binding.definition(), &definition));
    }
}
