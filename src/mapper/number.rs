use crate::{
    attribute,
    error::{Error, Result},
    mapper::{Mapper, property_name},
    metadata::PropertyMetadata,
    value::Value,
};

use aws_sdk_dynamodb::types;
use serde_json::Number;

/// Maps [`Value::Number`] to `N`, carried as its decimal string.
#[derive(Clone, Copy, Debug, Default)]
pub struct NumberMapper;

/// Parse a stored decimal string, keeping its digits as written.
pub(crate) fn parse_number(value: &str, name: Option<&str>) -> Result<Number> {
    value
        .parse::<Number>()
        .map_err(|_| Error::invalid_scalar(name, "decimal number", value))
}

impl Mapper for NumberMapper {
    fn to_db(
        &self,
        value: &Value,
        property: Option<&PropertyMetadata>,
    ) -> Result<Option<types::AttributeValue>> {
        match value {
            Value::Number(number) => Ok(Some(types::AttributeValue::N(number.to_string()))),
            other => Err(Error::invalid_scalar(property_name(property), "number", other)),
        }
    }

    fn from_db(
        &self,
        attribute: &types::AttributeValue,
        property: Option<&PropertyMetadata>,
    ) -> Result<Value> {
        match attribute {
            types::AttributeValue::N(value) => {
                parse_number(value, property_name(property)).map(Value::Number)
            }
            other => Err(Error::invalid_scalar(
                property_name(property),
                "N",
                attribute::type_descriptor(other),
            )),
        }
    }
}
