//! Bidirectional conversion between host values and attribute values.
//!
//! Scalar mappers are stateless codecs for one attribute value variant. The
//! [`registry::MapperRegistry`] picks the mapper for a value (custom mapper, then
//! declared type, then runtime type) and the [`Marshaller`] walks objects and
//! collections, recursing into nested models through the injected metadata provider.

/// Binary mapper.
pub mod binary;

/// Boolean mapper.
pub mod boolean;

/// Set and list mapping.
pub mod collection;

/// Date mappers.
pub mod date;

/// Integer-backed enum mapper.
pub mod enumeration;

/// Marshaller entry points.
pub mod marshaller;

/// Null mapper.
pub mod null;

/// Number mapper.
pub mod number;

/// Object mapping.
pub mod object;

/// Mapper resolution.
pub mod registry;

/// String mapper.
pub mod string;

pub use binary::BinaryMapper;
pub use boolean::BooleanMapper;
pub use date::{DateToNumberMapper, DateToStringMapper};
pub use enumeration::EnumMapper;
pub use marshaller::Marshaller;
pub use null::NullMapper;
pub use number::NumberMapper;
pub use registry::{MapperKind, MapperRegistry};
pub use string::StringMapper;

use crate::{error::Result, metadata::PropertyMetadata, value::Value};

use aws_sdk_dynamodb::types;
use std::fmt;

/// Stateless codec between a host value and one attribute value.
///
/// Implement this trait to override the conversion of a single property via
/// [`PropertyMetadata::custom_mapper`].
///
/// ```rust
/// use aws_sdk_dynamodb::types::AttributeValue;
/// use dynamodb_mapper::{error::Result, mapper::Mapper, metadata::PropertyMetadata, value::Value};
///
/// #[derive(Debug)]
/// struct Upper;
///
/// impl Mapper for Upper {
///     fn to_db(&self, value: &Value, _: Option<&PropertyMetadata>) -> Result<Option<AttributeValue>> {
///         Ok(value.as_str().map(|value| AttributeValue::S(value.to_uppercase())))
///     }
///
///     fn from_db(&self, attribute: &AttributeValue, _: Option<&PropertyMetadata>) -> Result<Value> {
///         Ok(attribute.as_s().map_or(Value::Null, |value| Value::from(value.to_lowercase())))
///     }
/// }
/// ```
pub trait Mapper: fmt::Debug + Send + Sync {
    /// Convert a host value. `None` means no attribute is written.
    fn to_db(
        &self,
        value: &Value,
        property: Option<&PropertyMetadata>,
    ) -> Result<Option<types::AttributeValue>>;

    /// Convert an attribute value back into a host value.
    fn from_db(
        &self,
        attribute: &types::AttributeValue,
        property: Option<&PropertyMetadata>,
    ) -> Result<Value>;
}

pub(crate) fn property_name(property: Option<&PropertyMetadata>) -> Option<&str> {
    property.map(|property| property.name.as_str())
}
