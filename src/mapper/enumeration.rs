use crate::{
    attribute,
    error::{Error, Result},
    mapper::{Mapper, property_name},
    metadata::{PropertyMetadata, PropertyType},
    value::Value,
};

use aws_sdk_dynamodb::types;

/// Maps an enum value to its integer ordinal stored as `N`.
///
/// Ordinals are checked against the declared enum in both directions.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnumMapper;

fn check_ordinal(ordinal: i64, property: Option<&PropertyMetadata>) -> Result<i64> {
    match property.and_then(PropertyMetadata::declared_type) {
        Some(PropertyType::Enum(metadata)) if !metadata.contains(ordinal) => {
            Err(Error::InvalidEnumValue {
                name: metadata.name.clone(),
                value: ordinal.to_string(),
            })
        }
        _ => Ok(ordinal),
    }
}

fn invalid(property: Option<&PropertyMetadata>, value: String) -> Error {
    Error::InvalidEnumValue {
        name: property_name(property).unwrap_or_default().to_string(),
        value,
    }
}

impl Mapper for EnumMapper {
    fn to_db(
        &self,
        value: &Value,
        property: Option<&PropertyMetadata>,
    ) -> Result<Option<types::AttributeValue>> {
        let ordinal = value
            .as_number()
            .and_then(serde_json::Number::as_i64)
            .ok_or_else(|| invalid(property, format!("{value:?}")))?;
        let ordinal = check_ordinal(ordinal, property)?;
        Ok(Some(types::AttributeValue::N(ordinal.to_string())))
    }

    fn from_db(
        &self,
        attribute: &types::AttributeValue,
        property: Option<&PropertyMetadata>,
    ) -> Result<Value> {
        let types::AttributeValue::N(stored) = attribute else {
            return Err(Error::invalid_scalar(
                property_name(property),
                "N",
                attribute::type_descriptor(attribute),
            ));
        };
        let ordinal = stored
            .parse::<i64>()
            .map_err(|_| invalid(property, stored.clone()))?;
        check_ordinal(ordinal, property).map(Value::from)
    }
}
