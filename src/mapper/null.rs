use crate::{
    attribute,
    error::{Error, Result},
    mapper::{Mapper, property_name},
    metadata::PropertyMetadata,
    value::Value,
};

use aws_sdk_dynamodb::types;

/// Maps [`Value::Null`] to `NULL: true`.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullMapper;

impl Mapper for NullMapper {
    fn to_db(
        &self,
        value: &Value,
        property: Option<&PropertyMetadata>,
    ) -> Result<Option<types::AttributeValue>> {
        match value {
            Value::Null => Ok(Some(types::AttributeValue::Null(true))),
            other => Err(Error::invalid_scalar(property_name(property), "null", other)),
        }
    }

    fn from_db(
        &self,
        attribute: &types::AttributeValue,
        property: Option<&PropertyMetadata>,
    ) -> Result<Value> {
        match attribute {
            types::AttributeValue::Null(_) => Ok(Value::Null),
            other => Err(Error::invalid_scalar(
                property_name(property),
                "NULL",
                attribute::type_descriptor(other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let attribute = NullMapper.to_db(&Value::Null, None).unwrap().unwrap();
        assert_eq!(attribute, types::AttributeValue::Null(true));
        assert_eq!(NullMapper.from_db(&attribute, None).unwrap(), Value::Null);
        assert!(NullMapper.to_db(&Value::from("a"), None).is_err());
    }
}
