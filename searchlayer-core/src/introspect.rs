//! Property discovery over declarative type schemas.

use crate::schema::{FieldMapping, PropertyDescriptor, SchemaFn, TypeArgument, TypeSchema};

/// Enumerates the properties of a type and their mapping configuration.
///
/// The introspector never inspects values; everything it reports comes from the
/// [`TypeSchema`] table of the type.
#[derive(Debug, Default, Clone, Copy)]
pub struct PropertyIntrospector;

impl PropertyIntrospector {
    /// Returns every property reachable through a read or a write accessor, in declaration order.
    pub fn properties<'a>(&self, schema: &'a TypeSchema) -> Vec<&'a PropertyDescriptor> {
        schema
            .properties()
            .iter()
            .filter(|property| property.readable || property.writable)
            .collect()
    }

    /// Returns the properties that carry explicit mapping configuration.
    ///
    /// When `must_have_read_write` is set, only properties with both accessors qualify.
    pub fn configured_properties<'a>(
        &self,
        schema: &'a TypeSchema,
        must_have_read_write: bool,
    ) -> Vec<&'a PropertyDescriptor> {
        schema
            .properties()
            .iter()
            .filter(|property| property.mapping.is_some())
            .filter(|property| match must_have_read_write {
                true => property.readable && property.writable,
                false => property.readable || property.writable,
            })
            .collect()
    }

    /// Returns the explicit mapping configuration of a property, if any.
    pub fn mapping<'a>(&self, property: &'a PropertyDescriptor) -> Option<&'a FieldMapping> {
        property.mapping.as_ref()
    }

    /// Returns the schema functions of the type arguments of a generic property.
    ///
    /// Scalar properties and opaque type arguments yield nothing.
    pub fn nested_schemas(&self, property: &PropertyDescriptor) -> Vec<SchemaFn> {
        property
            .value_type
            .type_arguments()
            .iter()
            .filter_map(|argument| match argument {
                TypeArgument::Schema(schema) => Some(*schema),
                TypeArgument::Opaque => None,
            })
            .collect()
    }
}
