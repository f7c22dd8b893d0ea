use crate::{
    attribute,
    error::{Error, Result},
    mapper::{Mapper, property_name},
    metadata::PropertyMetadata,
    value::Value,
};

use aws_sdk_dynamodb::types;

/// Maps [`Value::String`] to `S`.
///
/// Empty strings and null map to no attribute at all.
#[derive(Clone, Copy, Debug, Default)]
pub struct StringMapper;

impl Mapper for StringMapper {
    fn to_db(
        &self,
        value: &Value,
        property: Option<&PropertyMetadata>,
    ) -> Result<Option<types::AttributeValue>> {
        match value {
            Value::Null => Ok(None),
            Value::String(value) if value.is_empty() => Ok(None),
            Value::String(value) => Ok(Some(types::AttributeValue::S(value.clone()))),
            other => Err(Error::invalid_scalar(property_name(property), "string", other)),
        }
    }

    fn from_db(
        &self,
        attribute: &types::AttributeValue,
        property: Option<&PropertyMetadata>,
    ) -> Result<Value> {
        match attribute {
            types::AttributeValue::S(value) => Ok(Value::String(value.clone())),
            other => Err(Error::invalid_scalar(
                property_name(property),
                "S",
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
    #[case::string(Value::from("a"), Some(types::AttributeValue::S("a".to_string())))]
    #[case::empty(Value::from(""), None)]
    #[case::null(Value::Null, None)]
    fn test_to_db(#[case] value: Value, #[case] expected: Option<types::AttributeValue>) {
        assert_eq!(StringMapper.to_db(&value, None).unwrap(), expected);
    }

    #[test]
    fn test_to_db_rejects_number() {
        let property = PropertyMetadata::new("name");
        let actual = StringMapper.to_db(&Value::from(1), Some(&property));
        assert!(matches!(
            actual,
            Err(Error::InvalidScalarValue { name, expected: "string", .. }) if name == "name"
        ));
    }

    #[test]
    fn test_from_db() {
        let actual = StringMapper
            .from_db(&types::AttributeValue::S("a".to_string()), None)
            .unwrap();
        assert_eq!(actual, Value::from("a"));
        assert!(
            StringMapper
                .from_db(&types::AttributeValue::N("1".to_string()), None)
                .is_err()
        );
    }
}
