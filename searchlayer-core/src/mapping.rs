//! Derivation of document-store field mappings from type schemas.
//!
//! [`MappingBuilder`] walks the properties of a [`TypeSchema`] and produces a [`Mapping`]
//! tree. Configured properties map to a single node, or to a multi-field node when they must be
//! both filterable and free-text searchable. Unconfigured generic properties (collections,
//! options, maps) are kept as nested objects when one of their type arguments has configured
//! properties of its own, and dropped otherwise.
//!
//! Mappings are recomputed on every call and never cached.

use tracing::debug;

use crate::{
    introspect::PropertyIntrospector,
    schema::{FieldMapping, FieldType, IndexMode, PropertyDescriptor, TypeSchema},
};

/// Name of the analyzed sub-field of a multi-field property.
pub const QUERYABLE_FIELD: &str = "queryable";

/// The field mapping of one document type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    /// The document-type name the mapping applies to.
    pub name: String,
    /// Mapped properties in declaration order.
    pub properties: Vec<MappingProperty>,
}

impl Mapping {
    pub fn new(name: impl Into<String>, properties: Vec<MappingProperty>) -> Self {
        Self {
            name: name.into(),
            properties,
        }
    }
}

/// A node of a mapping tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingProperty {
    pub name: String,
    pub field_type: Option<FieldType>,
    pub index: Option<IndexMode>,
    /// Sub-fields of a multi-field, or properties of a nested object. Empty when neither.
    pub fields: Vec<MappingProperty>,
}

impl MappingProperty {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_type(mut self, field_type: FieldType) -> Self {
        self.field_type = Some(field_type);
        self
    }

    pub fn with_index(mut self, index: IndexMode) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_fields(mut self, fields: Vec<MappingProperty>) -> Self {
        self.fields = fields;
        self
    }

    pub fn is_multi_field(&self) -> bool {
        self.field_type == Some(FieldType::MultiField)
    }
}

/// Builds [`Mapping`] trees from type schemas.
#[derive(Debug, Default, Clone, Copy)]
pub struct MappingBuilder {
    introspector: PropertyIntrospector,
}

impl MappingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives the mapping of a type, named after its document type.
    pub fn build(&self, schema: &TypeSchema) -> Mapping {
        let properties = self.build_properties(self.introspector.properties(schema));

        debug!(
            document_type = schema.document_type_name(),
            properties = properties.len(),
            "derived mapping"
        );

        Mapping::new(schema.document_type_name(), properties)
    }

    /// Builds the nodes of the given properties, skipping those that produce none.
    pub fn build_properties<'a>(
        &self,
        properties: impl IntoIterator<Item = &'a PropertyDescriptor>,
    ) -> Vec<MappingProperty> {
        properties
            .into_iter()
            .filter_map(|property| self.build_property(property))
            .collect()
    }

    /// Builds the node of a single property, or `None` if the property is not mapped.
    pub fn build_property(&self, property: &PropertyDescriptor) -> Option<MappingProperty> {
        match self.introspector.mapping(property) {
            Some(mapping) => Some(Self::configured(&property.name, mapping)),
            None => self.nested(property),
        }
    }

    fn configured(name: &str, mapping: &FieldMapping) -> MappingProperty {
        let declared = mapping.field_type;

        match (mapping.filterable, mapping.free_text_searchable) {
            (true, true) => MappingProperty::new(name)
                .with_type(FieldType::MultiField)
                .with_fields(vec![
                    MappingProperty::new(name)
                        .with_type(declared)
                        .with_index(IndexMode::NotAnalyzed),
                    MappingProperty::new(QUERYABLE_FIELD)
                        .with_type(declared)
                        .with_index(IndexMode::Analyzed),
                ]),
            (true, false) => MappingProperty::new(name)
                .with_type(declared)
                .with_index(IndexMode::NotAnalyzed),
            (false, true) => MappingProperty::new(name)
                .with_type(declared)
                .with_index(IndexMode::Analyzed),
            // Type stays unset here.
            (false, false) => MappingProperty::new(name).with_index(IndexMode::NotAnalyzed),
        }
    }

    /// Maps an unconfigured generic property as a nested object.
    ///
    /// Only the configured properties of the nested types are considered, so discovery never
    /// goes deeper than one level. When several type arguments yield properties, the last one
    /// wins.
    fn nested(&self, property: &PropertyDescriptor) -> Option<MappingProperty> {
        if !property.readable || !property.value_type.is_generic() {
            return None;
        }

        let mut fields = None;

        for schema in self.introspector.nested_schemas(property) {
            let nested = schema();
            let properties =
                self.build_properties(self.introspector.configured_properties(&nested, false));

            if !properties.is_empty() {
                fields = Some(properties);
            }
        }

        fields.map(|fields| MappingProperty::new(&property.name).with_fields(fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TypeArgument;

    fn mapped(name: &str, field_type: FieldType, filterable: bool, free_text: bool) -> PropertyDescriptor {
        PropertyDescriptor::new(name).mapped(
            FieldMapping::new(field_type)
                .filterable(filterable)
                .free_text_searchable(free_text),
        )
    }

    fn single(property: PropertyDescriptor) -> Option<MappingProperty> {
        MappingBuilder::new().build_property(&property)
    }

    fn author_schema() -> TypeSchema {
        TypeSchema::builder("Author")
            .property(mapped("handle", FieldType::String, true, false))
            .property(PropertyDescriptor::new("avatar"))
            .build()
    }

    fn tag_schema() -> TypeSchema {
        TypeSchema::builder("Tag")
            .property(mapped("label", FieldType::String, false, true))
            .build()
    }

    fn unconfigured_schema() -> TypeSchema {
        TypeSchema::builder("Blob")
            .property(PropertyDescriptor::new("bytes"))
            .build()
    }

    fn thread_schema() -> TypeSchema {
        TypeSchema::builder("Thread")
            .property(mapped("subject", FieldType::String, true, true))
            .property(PropertyDescriptor::new("replies").generic([TypeArgument::Schema(thread_schema)]))
            .build()
    }

    #[test]
    fn type_without_configuration_yields_no_properties() {
        let schema = TypeSchema::builder("Plain")
            .property(PropertyDescriptor::new("a"))
            .property(PropertyDescriptor::new("b").generic([TypeArgument::Opaque]))
            .property(PropertyDescriptor::new("c").generic([TypeArgument::Schema(unconfigured_schema)]))
            .build();

        let mapping = MappingBuilder::new().build(&schema);

        assert_eq!(mapping.name, "Plain");
        assert!(mapping.properties.is_empty());
    }

    #[test]
    fn filterable_and_free_text_fans_out_to_multi_field() {
        let property = single(mapped("user", FieldType::String, true, true)).unwrap();

        assert_eq!(property.field_type, Some(FieldType::MultiField));
        assert_eq!(property.index, None);
        assert_eq!(
            property.fields,
            vec![
                MappingProperty::new("user")
                    .with_type(FieldType::String)
                    .with_index(IndexMode::NotAnalyzed),
                MappingProperty::new(QUERYABLE_FIELD)
                    .with_type(FieldType::String)
                    .with_index(IndexMode::Analyzed),
            ]
        );
    }

    #[test]
    fn filterable_only_is_not_analyzed() {
        let property = single(mapped("post_date", FieldType::Date, true, false)).unwrap();

        assert_eq!(property.index, Some(IndexMode::NotAnalyzed));
        assert_eq!(property.field_type, Some(FieldType::Date));
        assert!(property.fields.is_empty());
    }

    #[test]
    fn free_text_only_is_analyzed() {
        let property = single(mapped("message", FieldType::String, false, true)).unwrap();

        assert_eq!(property.index, Some(IndexMode::Analyzed));
        assert_eq!(property.field_type, Some(FieldType::String));
        assert!(property.fields.is_empty());
    }

    #[test]
    fn neither_filterable_nor_free_text_leaves_type_unset() {
        let property = single(mapped("raw", FieldType::Long, false, false)).unwrap();

        assert_eq!(property, MappingProperty::new("raw").with_index(IndexMode::NotAnalyzed));
    }

    #[test]
    fn generic_property_with_configured_argument_becomes_nested_object() {
        let property = single(
            PropertyDescriptor::new("authors")
                .generic([TypeArgument::Opaque, TypeArgument::Schema(author_schema)]),
        )
        .unwrap();

        assert_eq!(property.field_type, None);
        assert_eq!(property.index, None);
        assert_eq!(
            property.fields,
            vec![MappingProperty::new("handle")
                .with_type(FieldType::String)
                .with_index(IndexMode::NotAnalyzed)]
        );
    }

    #[test]
    fn last_non_empty_type_argument_wins() {
        let property = single(PropertyDescriptor::new("index").generic([
            TypeArgument::Schema(author_schema),
            TypeArgument::Schema(tag_schema),
            TypeArgument::Schema(unconfigured_schema),
        ]))
        .unwrap();

        assert_eq!(property.fields.len(), 1);
        assert_eq!(property.fields[0].name, "label");
    }

    #[test]
    fn unconfigured_properties_are_omitted() {
        assert!(single(PropertyDescriptor::new("count")).is_none());
        assert!(single(
            PropertyDescriptor::new("hidden")
                .generic([TypeArgument::Schema(author_schema)])
                .write_only()
        )
        .is_none());
    }

    #[test]
    fn self_referential_type_terminates() {
        let mapping = MappingBuilder::new().build(&thread_schema());

        assert_eq!(mapping.properties.len(), 2);
        let replies = &mapping.properties[1];
        assert_eq!(replies.name, "replies");
        assert_eq!(replies.fields.len(), 1);
        assert!(replies.fields[0].is_multi_field());
        assert!(replies.fields[0].fields.iter().all(|field| field.fields.is_empty()));
    }
}
