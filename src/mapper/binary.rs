use crate::{
    attribute,
    error::{Error, Result},
    mapper::{Mapper, property_name},
    metadata::PropertyMetadata,
    value::Value,
};

use aws_sdk_dynamodb::{primitives::Blob, types};

/// Maps [`Value::Binary`] to `B`.
///
/// Like strings, empty binaries map to no attribute. A list of byte-sized
/// integers (the serde rendering of `Vec<u8>`) is accepted as binary as well.
#[derive(Clone, Copy, Debug, Default)]
pub struct BinaryMapper;

fn bytes_from_list(values: &[Value]) -> Option<Vec<u8>> {
    values
        .iter()
        .map(|value| {
            value
                .as_number()
                .and_then(serde_json::Number::as_u64)
                .and_then(|byte| u8::try_from(byte).ok())
        })
        .collect()
}

impl Mapper for BinaryMapper {
    fn to_db(
        &self,
        value: &Value,
        property: Option<&PropertyMetadata>,
    ) -> Result<Option<types::AttributeValue>> {
        let bytes = match value {
            Value::Null => return Ok(None),
            Value::Binary(bytes) => bytes.clone(),
            Value::List(values) => bytes_from_list(values).ok_or_else(|| {
                Error::invalid_scalar(property_name(property), "binary", value)
            })?,
            other => return Err(Error::invalid_scalar(property_name(property), "binary", other)),
        };
        if bytes.is_empty() {
            return Ok(None);
        }
        Ok(Some(types::AttributeValue::B(Blob::new(bytes))))
    }

    fn from_db(
        &self,
        attribute: &types::AttributeValue,
        property: Option<&PropertyMetadata>,
    ) -> Result<Value> {
        match attribute {
            types::AttributeValue::B(blob) => Ok(Value::Binary(blob.as_ref().to_vec())),
            other => Err(Error::invalid_scalar(
                property_name(property),
                "B",
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
    #[case::bytes(Value::Binary(vec![1, 2]), Some(types::AttributeValue::B(Blob::new(vec![1, 2]))))]
    #[case::byte_list(Value::from(vec![3, 4]), Some(types::AttributeValue::B(Blob::new(vec![3, 4]))))]
    #[case::empty(Value::Binary(vec![]), None)]
    fn test_to_db(#[case] value: Value, #[case] expected: Option<types::AttributeValue>) {
        assert_eq!(BinaryMapper.to_db(&value, None).unwrap(), expected);
    }

    #[test]
    fn test_to_db_rejects_out_of_range_bytes() {
        assert!(BinaryMapper.to_db(&Value::from(vec![256]), None).is_err());
    }

    #[test]
    fn test_from_db() {
        let actual = BinaryMapper
            .from_db(&types::AttributeValue::B(Blob::new(vec![9])), None)
            .unwrap();
        assert_eq!(actual, Value::Binary(vec![9]));
    }
}
