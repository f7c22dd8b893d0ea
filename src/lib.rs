#![deny(missing_docs)]

//! # DynamoDB Mapper
//!
//! A metadata-driven object mapper and expression builder for Amazon DynamoDB.
//!
//! ## Overview
//!
//! Objects are [`value::Item`]s described by [`metadata::ModelMetadata`]: which
//! property is the partition or sort key, under which name each property is
//! stored, how it is typed. The [`mapper::Marshaller`] converts objects to and
//! from attribute maps following that metadata, and [`mod@expression`] renders
//! conditions, key conditions, projections and update expressions with their
//! placeholder tables, resolving attribute names the same way.
//!
//! ## Quick Example
//!
//! ```rust
//! use dynamodb_mapper::{
//!     expression,
//!     mapper::Marshaller,
//!     metadata::{ModelMetadata, PropertyMetadata},
//!     value::{Item, Value},
//! };
//!
//! let model = ModelMetadata::builder("User")
//!     .table_name("users")
//!     .property(PropertyMetadata::new("id").partition_key())
//!     .property(PropertyMetadata::new("name").name_db("full_name"))
//!     .build()
//!     .unwrap();
//! let marshaller = Marshaller::default();
//!
//! let item = Item::from([
//!     ("id".to_string(), Value::from("1")),
//!     ("name".to_string(), Value::from("Ada")),
//!     ("nickname".to_string(), Value::from("")),
//! ]);
//! let attributes = marshaller.to_db(&item, Some(&model)).unwrap();
//! assert!(attributes.contains_key("full_name"));
//! assert!(!attributes.contains_key("nickname"));
//!
//! let condition = expression::attribute("name")
//!     .begins_with("A")
//!     .to_expression(Some(&model), &marshaller)
//!     .unwrap();
//! assert_eq!(condition.statement, "begins_with (#full_name, :full_name)");
//! ```
//!
//! ## Modules
//!
//! - [`mod@value`] - Host values and objects
//! - [`mod@attribute`] - Attribute value helpers and the JSON wire format
//! - [`mod@metadata`] - Model and property descriptors
//! - [`mod@mapper`] - Value mappers and the marshaller
//! - [`mod@expression`] - Condition, projection and update expressions
//! - [`mod@read`] - Read operations (GetItem, Query, Scan, BatchGetItem)
//! - [`mod@write`] - Write operations (PutItem, UpdateItem, DeleteItem, BatchWriteItem)

/// Attribute value helpers.
pub mod attribute;

/// Back-off sequences for batch retries.
pub mod backoff;

/// Marshaller configuration.
pub mod config;

/// Errors raised while mapping or building expressions.
pub mod error;

/// Expression building.
pub mod expression;

/// Value mappers.
pub mod mapper;

/// Model metadata.
pub mod metadata;

/// Read operations for retrieving data from DynamoDB tables.
pub mod read;

/// Host values.
pub mod value;

/// Write operations for modifying data in DynamoDB tables.
pub mod write;

use crate::{
    attribute::AttributeMap,
    error::Result,
    mapper::Marshaller,
    metadata::{ModelMetadata, PropertyMetadata},
    value::{Item, Value},
};

use aws_sdk_dynamodb::types;

/// Convert an object with a default [`Marshaller`].
///
/// Nested models cannot be resolved without a metadata provider; build a
/// [`Marshaller`] over a registry for those.
pub fn to_db(item: &Item, model: Option<&ModelMetadata>) -> Result<AttributeMap> {
    Marshaller::default().to_db(item, model)
}

/// Convert an attribute map with a default [`Marshaller`].
pub fn from_db(attributes: &AttributeMap, model: Option<&ModelMetadata>) -> Result<Item> {
    Marshaller::default().from_db(attributes, model)
}

/// Convert a single value with a default [`Marshaller`].
pub fn to_db_one(
    value: &Value,
    property: Option<&PropertyMetadata>,
) -> Result<Option<types::AttributeValue>> {
    Marshaller::default().to_db_one(value, property)
}

/// Convert a single attribute value with a default [`Marshaller`].
pub fn from_db_one(
    attribute: &types::AttributeValue,
    property: Option<&PropertyMetadata>,
) -> Result<Value> {
    Marshaller::default().from_db_one(attribute, property)
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case::string(Value::from("a"), Some(types::AttributeValue::S("a".to_string())))]
    #[case::empty_string(Value::from(""), None)]
    #[case::null(Value::Null, None)]
    #[case::number(Value::from(1.5), Some(types::AttributeValue::N("1.5".to_string())))]
    fn test_to_db_one(#[case] value: Value, #[case] expected: Option<types::AttributeValue>) {
        assert_eq!(to_db_one(&value, None).unwrap(), expected);
    }

    #[test]
    fn test_object_round_trip() {
        let item = Item::from([
            ("id".to_string(), Value::from("1")),
            ("tags".to_string(), Value::set(["a", "b"])),
            ("mixed".to_string(), Value::List(vec![Value::from(1), Value::from(true)])),
        ]);
        let attributes = to_db(&item, None).unwrap();
        assert_eq!(
            attributes["tags"],
            types::AttributeValue::Ss(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(from_db(&attributes, None).unwrap(), item);
    }
}
