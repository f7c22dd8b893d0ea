use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde_json::Number;
use std::{collections, fmt, hash};

/// An object's own properties in enumeration order.
pub type Item = IndexMap<String, Value>;

/// Host-side value converted to and from attribute values.
///
/// ```rust
/// use dynamodb_mapper::value::{Item, Value};
///
/// let item = Item::from([
///     ("id".to_string(), Value::from("myId")),
///     ("age".to_string(), Value::from(20)),
/// ]);
/// let value = Value::Object(item);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// Absent value.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Numeric value.
    Number(Number),
    /// String value.
    String(String),
    /// Raw bytes.
    Binary(Vec<u8>),
    /// Point in time.
    Date(DateTime<Utc>),
    /// Ordered sequence, duplicates allowed.
    List(Vec<Value>),
    /// Insertion-ordered collection without duplicates.
    Set(Vec<Value>),
    /// Nested object.
    Object(Item),
}

/// Runtime type detected from a [`Value`], used for mapper inference.
#[derive(Clone, Copy, Debug, Eq, hash::Hash, PartialEq)]
pub enum SourceType {
    /// [`Value::Null`].
    Null,
    /// [`Value::Bool`].
    Boolean,
    /// [`Value::Number`].
    Number,
    /// [`Value::String`].
    String,
    /// [`Value::Binary`].
    Binary,
    /// [`Value::Date`].
    Date,
    /// [`Value::List`].
    List,
    /// [`Value::Set`].
    Set,
    /// [`Value::Object`].
    Object,
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::String => "string",
            Self::Binary => "binary",
            Self::Date => "date",
            Self::List => "list",
            Self::Set => "set",
            Self::Object => "object",
        };
        f.write_str(name)
    }
}

impl Value {
    /// Build a [`Value::Set`], dropping duplicates while keeping the first occurrence.
    pub fn set<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        let mut items: Vec<Value> = Vec::new();
        for value in values {
            let value = value.into();
            if !items.contains(&value) {
                items.push(value);
            }
        }
        Self::Set(items)
    }

    /// Runtime type of this value.
    pub fn source_type(&self) -> SourceType {
        match self {
            Self::Null => SourceType::Null,
            Self::Bool(_) => SourceType::Boolean,
            Self::Number(_) => SourceType::Number,
            Self::String(_) => SourceType::String,
            Self::Binary(_) => SourceType::Binary,
            Self::Date(_) => SourceType::Date,
            Self::List(_) => SourceType::List,
            Self::Set(_) => SourceType::Set,
            Self::Object(_) => SourceType::Object,
        }
    }

    /// Whether the value counts as "not set" for identifier generation.
    pub fn is_falsy(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Bool(value) => !value,
            Self::Number(number) => number.as_f64() == Some(0.0),
            Self::String(value) => value.is_empty(),
            _ => false,
        }
    }

    /// String content, if this is a [`Value::String`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// Number, if this is a [`Value::Number`].
    pub fn as_number(&self) -> Option<&Number> {
        match self {
            Self::Number(number) => Some(number),
            _ => None,
        }
    }

    /// Object properties, if this is a [`Value::Object`].
    pub fn as_object(&self) -> Option<&Item> {
        match self {
            Self::Object(item) => Some(item),
            _ => None,
        }
    }

    /// Elements of a [`Value::List`] or [`Value::Set`].
    pub fn as_collection(&self) -> Option<&[Value]> {
        match self {
            Self::List(values) | Self::Set(values) => Some(values),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

macro_rules! impl_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::Number(value.into())
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

/// Non-finite floats have no decimal representation and become [`Value::Null`].
impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Number::from_f64(value).map_or(Self::Null, Self::Number)
    }
}

impl From<Number> for Value {
    fn from(value: Number) -> Self {
        Self::Number(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Self::Binary(value.to_vec())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Date(value)
    }
}

impl From<Item> for Value {
    fn from(value: Item) -> Self {
        Self::Object(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<collections::BTreeSet<T>> for Value {
    fn from(values: collections::BTreeSet<T>) -> Self {
        Self::set(values)
    }
}

impl<T: Into<Value>, S> From<collections::HashSet<T, S>> for Value {
    fn from(values: collections::HashSet<T, S>) -> Self {
        Self::set(values)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(value) => Self::Bool(value),
            serde_json::Value::Number(number) => Self::Number(number),
            serde_json::Value::String(value) => Self::String(value),
            serde_json::Value::Array(values) => {
                Self::List(values.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => Self::Object(
                map.into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(value) => Self::Bool(value),
            Value::Number(number) => Self::Number(number),
            Value::String(value) => Self::String(value),
            Value::Binary(bytes) => Self::Array(bytes.into_iter().map(Self::from).collect()),
            Value::Date(date) => Self::String(date.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Value::List(values) | Value::Set(values) => {
                Self::Array(values.into_iter().map(Self::from).collect())
            }
            Value::Object(item) => Self::Object(
                item.into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            ),
        }
    }
}
