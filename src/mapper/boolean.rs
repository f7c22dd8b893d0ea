use crate::{
    attribute,
    error::{Error, Result},
    mapper::{Mapper, property_name},
    metadata::PropertyMetadata,
    value::Value,
};

use aws_sdk_dynamodb::types;

/// Maps literal `true`/`false` to `BOOL`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BooleanMapper;

impl Mapper for BooleanMapper {
    fn to_db(
        &self,
        value: &Value,
        property: Option<&PropertyMetadata>,
    ) -> Result<Option<types::AttributeValue>> {
        match value {
            Value::Bool(value) => Ok(Some(types::AttributeValue::Bool(*value))),
            other => Err(Error::invalid_scalar(property_name(property), "boolean", other)),
        }
    }

    fn from_db(
        &self,
        attribute: &types::AttributeValue,
        property: Option<&PropertyMetadata>,
    ) -> Result<Value> {
        match attribute {
            types::AttributeValue::Bool(value) => Ok(Value::Bool(*value)),
            other => Err(Error::invalid_scalar(
                property_name(property),
                "BOOL",
                attribute::type_descriptor(other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case::true_(true)]
    #[case::false_(false)]
    fn test_round_trip(#[case] value: bool) {
        let attribute = BooleanMapper.to_db(&Value::Bool(value), None).unwrap().unwrap();
        assert_eq!(attribute, types::AttributeValue::Bool(value));
        assert_eq!(BooleanMapper.from_db(&attribute, None).unwrap(), Value::Bool(value));
    }

    #[rstest]
    #[case::string(Value::from("true"))]
    #[case::number(Value::from(1))]
    fn test_to_db_rejects_non_booleans(#[case] value: Value) {
        assert!(matches!(
            BooleanMapper.to_db(&value, None),
            Err(Error::InvalidScalarValue { expected: "boolean", .. })
        ));
    }
}
