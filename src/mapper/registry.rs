use crate::{
    attribute,
    error::{Error, Result},
    mapper::{
        BinaryMapper, BooleanMapper, EnumMapper, Mapper, NullMapper, NumberMapper, StringMapper,
        property_name,
    },
    metadata::{PropertyMetadata, PropertyType},
    value::{SourceType, Value},
};

use aws_sdk_dynamodb::types;
use std::sync;

static STRING: StringMapper = StringMapper;
static NUMBER: NumberMapper = NumberMapper;
static BOOLEAN: BooleanMapper = BooleanMapper;
static NULL: NullMapper = NullMapper;
static BINARY: BinaryMapper = BinaryMapper;
static ENUM: EnumMapper = EnumMapper;

/// Mapper selected for a value or attribute.
#[derive(Clone, Copy, Debug)]
pub enum MapperKind<'a> {
    /// Stateless scalar codec.
    Scalar(&'a dyn Mapper),
    /// Set or list, mapped by the marshaller's collection logic.
    Collection,
    /// Nested object, mapped by the marshaller's object logic.
    Object,
}

/// Type to mapper lookup.
///
/// Resolution order: the property's custom mapper, then its declared type when
/// that type is custom, then the runtime type of the value (or attribute).
#[derive(Clone, Debug)]
pub struct MapperRegistry {
    date: sync::Arc<dyn Mapper>,
}

impl Default for MapperRegistry {
    fn default() -> Self {
        Self::new(sync::Arc::new(crate::mapper::DateToStringMapper))
    }
}

impl MapperRegistry {
    /// Registry using the given mapper for dates.
    pub fn new(date: sync::Arc<dyn Mapper>) -> Self {
        Self { date }
    }

    /// Mapper for a declared type.
    pub fn for_type(&self, property_type: &PropertyType) -> MapperKind<'_> {
        match property_type {
            PropertyType::String => MapperKind::Scalar(&STRING),
            PropertyType::Number => MapperKind::Scalar(&NUMBER),
            PropertyType::Boolean => MapperKind::Scalar(&BOOLEAN),
            PropertyType::Null => MapperKind::Scalar(&NULL),
            PropertyType::Binary => MapperKind::Scalar(&BINARY),
            PropertyType::Date => MapperKind::Scalar(self.date.as_ref()),
            PropertyType::Enum(_) => MapperKind::Scalar(&ENUM),
            PropertyType::Array | PropertyType::Set => MapperKind::Collection,
            PropertyType::Map | PropertyType::Model(_) => MapperKind::Object,
        }
    }

    /// Mapper for a runtime type.
    pub fn for_source_type(&self, source_type: SourceType) -> MapperKind<'_> {
        match source_type {
            SourceType::String => MapperKind::Scalar(&STRING),
            SourceType::Number => MapperKind::Scalar(&NUMBER),
            SourceType::Boolean => MapperKind::Scalar(&BOOLEAN),
            SourceType::Null => MapperKind::Scalar(&NULL),
            SourceType::Binary => MapperKind::Scalar(&BINARY),
            SourceType::Date => MapperKind::Scalar(self.date.as_ref()),
            SourceType::List | SourceType::Set => MapperKind::Collection,
            SourceType::Object => MapperKind::Object,
        }
    }

    /// Mapper inferred from a stored attribute.
    pub fn for_attribute(
        &self,
        attribute: &types::AttributeValue,
        name: Option<&str>,
    ) -> Result<MapperKind<'_>> {
        let kind = match attribute {
            types::AttributeValue::S(_) => MapperKind::Scalar(&STRING),
            types::AttributeValue::N(_) => MapperKind::Scalar(&NUMBER),
            types::AttributeValue::B(_) => MapperKind::Scalar(&BINARY),
            types::AttributeValue::Bool(_) => MapperKind::Scalar(&BOOLEAN),
            types::AttributeValue::Null(_) => MapperKind::Scalar(&NULL),
            types::AttributeValue::Ss(_)
            | types::AttributeValue::Ns(_)
            | types::AttributeValue::Bs(_)
            | types::AttributeValue::L(_) => MapperKind::Collection,
            types::AttributeValue::M(_) => MapperKind::Object,
            other => {
                return Err(Error::UnmappableType {
                    name: name.unwrap_or_default().to_string(),
                    type_name: attribute::type_descriptor(other).to_string(),
                });
            }
        };
        Ok(kind)
    }

    fn declared<'a>(&'a self, property: Option<&'a PropertyMetadata>) -> Option<MapperKind<'a>> {
        let property = property?;
        if let Some(mapper) = property.custom_mapper.as_deref() {
            return Some(MapperKind::Scalar(mapper));
        }
        property
            .custom_type()
            .map(|property_type| self.for_type(property_type))
    }

    /// Mapper for marshalling a value.
    pub fn resolve<'a>(
        &'a self,
        value: &Value,
        property: Option<&'a PropertyMetadata>,
    ) -> MapperKind<'a> {
        self.declared(property)
            .unwrap_or_else(|| self.for_source_type(value.source_type()))
    }

    /// Mapper for unmarshalling an attribute.
    pub fn resolve_attribute<'a>(
        &'a self,
        attribute: &types::AttributeValue,
        property: Option<&'a PropertyMetadata>,
    ) -> Result<MapperKind<'a>> {
        match self.declared(property) {
            Some(kind) => Ok(kind),
            None => self.for_attribute(attribute, property_name(property)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::EnumMetadata;

    use rstest::rstest;

    fn scalar_to_db(kind: MapperKind<'_>, value: &Value) -> Option<types::AttributeValue> {
        match kind {
            MapperKind::Scalar(mapper) => mapper.to_db(value, None).unwrap(),
            other => panic!("expected a scalar mapper, found {other:?}"),
        }
    }

    #[rstest]
    #[case::string(Value::from("a"), Some(types::AttributeValue::S("a".to_string())))]
    #[case::number(Value::from(1), Some(types::AttributeValue::N("1".to_string())))]
    #[case::boolean(Value::Bool(true), Some(types::AttributeValue::Bool(true)))]
    #[case::null(Value::Null, Some(types::AttributeValue::Null(true)))]
    fn test_resolve_infers_from_value(
        #[case] value: Value,
        #[case] expected: Option<types::AttributeValue>,
    ) {
        let registry = MapperRegistry::default();
        assert_eq!(scalar_to_db(registry.resolve(&value, None), &value), expected);
    }

    #[rstest]
    #[case::list(Value::List(vec![]))]
    #[case::set(Value::Set(vec![]))]
    fn test_resolve_collections(#[case] value: Value) {
        let registry = MapperRegistry::default();
        assert!(matches!(registry.resolve(&value, None), MapperKind::Collection));
    }

    #[test]
    fn test_resolve_prefers_custom_mapper() {
        let registry = MapperRegistry::default();
        let property = PropertyMetadata::new("a")
            .property_type(PropertyType::Set)
            .custom_mapper(sync::Arc::new(BooleanMapper));
        let kind = registry.resolve(&Value::Bool(false), Some(&property));
        assert_eq!(
            scalar_to_db(kind, &Value::Bool(false)),
            Some(types::AttributeValue::Bool(false))
        );
    }

    #[test]
    fn test_resolve_uses_custom_declared_type() {
        let registry = MapperRegistry::default();
        let property = PropertyMetadata::new("a")
            .property_type(PropertyType::Enum(EnumMetadata::new("E", [0, 1])));
        let kind = registry.resolve(&Value::from(1), Some(&property));
        let MapperKind::Scalar(mapper) = kind else {
            panic!("expected a scalar mapper");
        };
        assert!(mapper.to_db(&Value::from(5), Some(&property)).is_err());
    }

    #[test]
    fn test_resolve_ignores_plain_declared_type() {
        let registry = MapperRegistry::default();
        let property = PropertyMetadata::new("a").property_type(PropertyType::Number);
        let value = Value::from("x");
        assert_eq!(
            scalar_to_db(registry.resolve(&value, Some(&property)), &value),
            Some(types::AttributeValue::S("x".to_string()))
        );
    }

    #[rstest]
    #[case::string_set(types::AttributeValue::Ss(vec![]))]
    #[case::list(types::AttributeValue::L(vec![]))]
    fn test_for_attribute_collections(#[case] attribute: types::AttributeValue) {
        let registry = MapperRegistry::default();
        assert!(matches!(
            registry.for_attribute(&attribute, None).unwrap(),
            MapperKind::Collection
        ));
    }
}
