//! Helpers around the DynamoDB attribute value wire type.
//!
//! The tagged union itself is [`types::AttributeValue`]; this module adds type
//! descriptors, key type checks and the single-key JSON rendering used on the wire
//! (`{"S": "a"}`, `{"N": "1"}`, `{"SS": [..]}`, ...).

use crate::error::{Error, Result};

use aws_sdk_dynamodb::{primitives::Blob, types};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde_json::{Map, Value};
use std::collections;

/// Attribute map as sent to and received from the store.
pub type AttributeMap = collections::HashMap<String, types::AttributeValue>;

/// Type descriptor of an attribute value (`S`, `N`, `B`, `SS`, `NS`, `BS`, `M`, `L`, `NULL`, `BOOL`).
pub fn type_descriptor(attribute: &types::AttributeValue) -> &'static str {
    match attribute {
        types::AttributeValue::S(_) => "S",
        types::AttributeValue::N(_) => "N",
        types::AttributeValue::B(_) => "B",
        types::AttributeValue::Ss(_) => "SS",
        types::AttributeValue::Ns(_) => "NS",
        types::AttributeValue::Bs(_) => "BS",
        types::AttributeValue::M(_) => "M",
        types::AttributeValue::L(_) => "L",
        types::AttributeValue::Null(_) => "NULL",
        types::AttributeValue::Bool(_) => "BOOL",
        _ => "UNKNOWN",
    }
}

/// Whether the attribute may be used as a partition or sort key value.
pub fn is_key_type(attribute: &types::AttributeValue) -> bool {
    matches!(
        attribute,
        types::AttributeValue::S(_) | types::AttributeValue::N(_) | types::AttributeValue::B(_)
    )
}

/// Render an attribute value in its single-key JSON wire shape.
///
/// ```rust
/// use aws_sdk_dynamodb::types::AttributeValue;
/// use dynamodb_mapper::attribute;
/// use serde_json::json;
///
/// let json = attribute::to_json(&AttributeValue::N("20".to_string())).unwrap();
/// assert_eq!(json, json!({"N": "20"}));
/// ```
///
/// Variants this crate does not know about have no wire shape and raise
/// [`Error::InvalidWireFormat`].
pub fn to_json(attribute: &types::AttributeValue) -> Result<Value> {
    let (descriptor, value) = match attribute {
        types::AttributeValue::S(value) => ("S", Value::from(value.as_str())),
        types::AttributeValue::N(value) => ("N", Value::from(value.as_str())),
        types::AttributeValue::B(blob) => ("B", Value::from(STANDARD.encode(blob.as_ref()))),
        types::AttributeValue::Ss(values) => ("SS", Value::from(values.clone())),
        types::AttributeValue::Ns(values) => ("NS", Value::from(values.clone())),
        types::AttributeValue::Bs(blobs) => {
            let values = blobs
                .iter()
                .map(|blob| Value::from(STANDARD.encode(blob.as_ref())))
                .collect();
            ("BS", Value::Array(values))
        }
        types::AttributeValue::M(map) => ("M", Value::Object(item_to_json(map)?)),
        types::AttributeValue::L(values) => {
            ("L", Value::Array(values.iter().map(to_json).collect::<Result<_>>()?))
        }
        types::AttributeValue::Null(value) => ("NULL", Value::Bool(*value)),
        types::AttributeValue::Bool(value) => ("BOOL", Value::Bool(*value)),
        other => return Err(invalid(format!("unknown attribute value {other:?}"))),
    };
    Ok(Value::Object(Map::from_iter([(descriptor.to_string(), value)])))
}

/// Render an attribute map as a JSON object of wire-shaped attribute values.
pub fn item_to_json(item: &AttributeMap) -> Result<Map<String, Value>> {
    item.iter()
        .map(|(name, attribute)| Ok((name.clone(), to_json(attribute)?)))
        .collect()
}

fn invalid(message: impl Into<String>) -> Error {
    Error::InvalidWireFormat(message.into())
}

fn json_str<'a>(descriptor: &str, value: &'a Value) -> Result<&'a str> {
    value
        .as_str()
        .ok_or_else(|| invalid(format!("{descriptor} expects a string, found {value}")))
}

fn json_strings(descriptor: &str, value: &Value) -> Result<Vec<String>> {
    let values = value
        .as_array()
        .ok_or_else(|| invalid(format!("{descriptor} expects an array, found {value}")))?;
    values
        .iter()
        .map(|value| json_str(descriptor, value).map(ToString::to_string))
        .collect()
}

fn json_blob(descriptor: &str, value: &Value) -> Result<Blob> {
    let encoded = json_str(descriptor, value)?;
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|error| invalid(format!("{descriptor} is not valid base64: {error}")))?;
    Ok(Blob::new(bytes))
}

/// Parse a single-key JSON wire value back into an attribute value.
pub fn from_json(value: &Value) -> Result<types::AttributeValue> {
    let object = value
        .as_object()
        .ok_or_else(|| invalid(format!("expected an object, found {value}")))?;
    let mut entries = object.iter();
    let (descriptor, inner) = match (entries.next(), entries.next()) {
        (Some(entry), None) => entry,
        _ => return Err(invalid(format!("expected exactly one type key, found {value}"))),
    };
    let attribute = match descriptor.as_str() {
        "S" => types::AttributeValue::S(json_str(descriptor, inner)?.to_string()),
        "N" => types::AttributeValue::N(json_str(descriptor, inner)?.to_string()),
        "B" => types::AttributeValue::B(json_blob(descriptor, inner)?),
        "SS" => types::AttributeValue::Ss(json_strings(descriptor, inner)?),
        "NS" => types::AttributeValue::Ns(json_strings(descriptor, inner)?),
        "BS" => {
            let values = inner
                .as_array()
                .ok_or_else(|| invalid(format!("BS expects an array, found {inner}")))?;
            let blobs = values
                .iter()
                .map(|value| json_blob(descriptor, value))
                .collect::<Result<_>>()?;
            types::AttributeValue::Bs(blobs)
        }
        "M" => {
            let map = inner
                .as_object()
                .ok_or_else(|| invalid(format!("M expects an object, found {inner}")))?;
            types::AttributeValue::M(item_from_json(map)?)
        }
        "L" => {
            let values = inner
                .as_array()
                .ok_or_else(|| invalid(format!("L expects an array, found {inner}")))?;
            let values = values.iter().map(from_json).collect::<Result<_>>()?;
            types::AttributeValue::L(values)
        }
        "NULL" => types::AttributeValue::Null(inner.as_bool() == Some(true)),
        "BOOL" => {
            let value = inner
                .as_bool()
                .ok_or_else(|| invalid(format!("BOOL expects a boolean, found {inner}")))?;
            types::AttributeValue::Bool(value)
        }
        other => return Err(invalid(format!("unknown type descriptor `{other}`"))),
    };
    Ok(attribute)
}

/// Parse a JSON object of wire-shaped attribute values into an attribute map.
pub fn item_from_json(item: &Map<String, Value>) -> Result<AttributeMap> {
    item.iter()
        .map(|(name, value)| Ok((name.clone(), from_json(value)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case::string(types::AttributeValue::S("a".to_string()), json!({"S": "a"}))]
    #[case::number(types::AttributeValue::N("1.5".to_string()), json!({"N": "1.5"}))]
    #[case::binary(types::AttributeValue::B(Blob::new(b"hi".to_vec())), json!({"B": "aGk="}))]
    #[case::string_set(
        types::AttributeValue::Ss(vec!["a".to_string(), "b".to_string()]),
        json!({"SS": ["a", "b"]})
    )]
    #[case::number_set(types::AttributeValue::Ns(vec!["1".to_string()]), json!({"NS": ["1"]}))]
    #[case::null(types::AttributeValue::Null(true), json!({"NULL": true}))]
    #[case::bool(types::AttributeValue::Bool(false), json!({"BOOL": false}))]
    #[case::list(
        types::AttributeValue::L(vec![types::AttributeValue::N("2".to_string())]),
        json!({"L": [{"N": "2"}]})
    )]
    #[case::map(
        types::AttributeValue::M(AttributeMap::from([(
            "a".to_string(),
            types::AttributeValue::S("b".to_string()),
        )])),
        json!({"M": {"a": {"S": "b"}}})
    )]
    fn test_wire_json(#[case] attribute: types::AttributeValue, #[case] expected: Value) {
        assert_eq!(to_json(&attribute).unwrap(), expected);
        assert_eq!(from_json(&expected).unwrap(), attribute);
    }

    #[test]
    fn test_item_to_json() {
        let item = AttributeMap::from([
            ("id".to_string(), types::AttributeValue::S("1".to_string())),
            (
                "scores".to_string(),
                types::AttributeValue::L(vec![types::AttributeValue::N("2".to_string())]),
            ),
        ]);
        let actual = item_to_json(&item).unwrap();
        assert_eq!(
            Value::Object(actual.clone()),
            json!({"id": {"S": "1"}, "scores": {"L": [{"N": "2"}]}})
        );
        assert_eq!(item_from_json(&actual).unwrap(), item);
    }

    #[rstest]
    #[case::not_an_object(json!("S"))]
    #[case::two_keys(json!({"S": "a", "N": "1"}))]
    #[case::unknown_descriptor(json!({"X": "a"}))]
    #[case::number_not_string(json!({"N": 1}))]
    #[case::bad_base64(json!({"B": "***"}))]
    fn test_from_json_rejects_malformed(#[case] value: Value) {
        assert!(matches!(from_json(&value), Err(Error::InvalidWireFormat(_))));
    }

    #[rstest]
    #[case::string(types::AttributeValue::S("a".to_string()), true)]
    #[case::number(types::AttributeValue::N("1".to_string()), true)]
    #[case::binary(types::AttributeValue::B(Blob::new(vec![1])), true)]
    #[case::bool(types::AttributeValue::Bool(true), false)]
    #[case::list(types::AttributeValue::L(vec![]), false)]
    fn test_is_key_type(#[case] attribute: types::AttributeValue, #[case] expected: bool) {
        assert_eq!(is_key_type(&attribute), expected);
    }
}
