use crate::{
    attribute,
    error::{Error, Result},
    mapper::{Marshaller, number::parse_number, property_name},
    metadata::{ItemType, PropertyMetadata, PropertyType},
    value::Value,
};

use aws_sdk_dynamodb::{primitives::Blob, types};

/// Item type of a set attribute.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum SetKind {
    String,
    Number,
    Binary,
}

/// Wire representation chosen for a collection.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Representation {
    Set(SetKind),
    List,
}

impl Representation {
    /// Sorted collections stay lists, a declared item type decides next,
    /// otherwise the elements themselves do.
    fn choose(values: &[Value], property: Option<&PropertyMetadata>) -> Self {
        if property.is_some_and(|property| property.is_sorted_collection) {
            return Self::List;
        }
        if let Some(item_type) = property.and_then(PropertyMetadata::item_type) {
            return match item_type {
                ItemType::String => Self::Set(SetKind::String),
                ItemType::Number => Self::Set(SetKind::Number),
                ItemType::Binary => Self::Set(SetKind::Binary),
                ItemType::Model(_) => Self::List,
            };
        }
        if values.is_empty() {
            Self::List
        } else if values.iter().all(|value| matches!(value, Value::String(_))) {
            Self::Set(SetKind::String)
        } else if values.iter().all(|value| matches!(value, Value::Number(_))) {
            Self::Set(SetKind::Number)
        } else if values.iter().all(|value| matches!(value, Value::Binary(_))) {
            Self::Set(SetKind::Binary)
        } else {
            Self::List
        }
    }
}

fn distinct<T: PartialEq>(values: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut distinct = Vec::new();
    for value in values {
        if !distinct.contains(&value) {
            distinct.push(value);
        }
    }
    distinct
}

impl Marshaller {
    fn set_to_db(
        kind: SetKind,
        values: &[Value],
        property: Option<&PropertyMetadata>,
    ) -> Result<types::AttributeValue> {
        let name = property_name(property);
        let attribute = match kind {
            SetKind::String => {
                let values = values
                    .iter()
                    .map(|value| match value {
                        Value::String(value) => Ok(value.clone()),
                        other => Err(Error::invalid_scalar(name, "string", other)),
                    })
                    .collect::<Result<Vec<_>>>()?;
                types::AttributeValue::Ss(distinct(values))
            }
            SetKind::Number => {
                let values = values
                    .iter()
                    .map(|value| match value {
                        Value::Number(number) => Ok(number.to_string()),
                        other => Err(Error::invalid_scalar(name, "number", other)),
                    })
                    .collect::<Result<Vec<_>>>()?;
                types::AttributeValue::Ns(distinct(values))
            }
            SetKind::Binary => {
                let values = values
                    .iter()
                    .map(|value| match value {
                        Value::Binary(bytes) => Ok(bytes.clone()),
                        other => Err(Error::invalid_scalar(name, "binary", other)),
                    })
                    .collect::<Result<Vec<_>>>()?;
                types::AttributeValue::Bs(distinct(values).into_iter().map(Blob::new).collect())
            }
        };
        Ok(attribute)
    }

    fn list_to_db(
        &self,
        values: &[Value],
        property: Option<&PropertyMetadata>,
    ) -> Result<types::AttributeValue> {
        let item_model = match property.and_then(PropertyMetadata::item_type) {
            Some(ItemType::Model(name)) => Some(self.model(name)?),
            _ => None,
        };
        let mut attributes = Vec::with_capacity(values.len());
        for value in values {
            let attribute = match (item_model, value) {
                (Some(model), Value::Object(item)) => {
                    Some(types::AttributeValue::M(self.object_to_db(item, Some(model))?))
                }
                (Some(model), other) => {
                    return Err(Error::invalid_scalar(
                        Some(model.name.as_str()),
                        "object",
                        other,
                    ));
                }
                (None, value) => self.to_db_one(value, None)?,
            };
            // keep positions stable when an element has no attribute of its own
            attributes.push(attribute.unwrap_or(types::AttributeValue::Null(true)));
        }
        Ok(types::AttributeValue::L(attributes))
    }

    pub(crate) fn collection_to_db(
        &self,
        value: &Value,
        property: Option<&PropertyMetadata>,
    ) -> Result<Option<types::AttributeValue>> {
        let (values, is_set) = match value {
            Value::Null => return Ok(None),
            Value::List(values) => (values, false),
            Value::Set(values) => (values, true),
            other => {
                return Err(Error::invalid_scalar(
                    property_name(property),
                    "collection",
                    other,
                ));
            }
        };
        let representation = Representation::choose(values, property);
        // the store rejects empty sets, empty lists are fine
        if values.is_empty() && (is_set || representation != Representation::List) {
            return Ok(None);
        }
        let attribute = match representation {
            Representation::Set(kind) => Self::set_to_db(kind, values, property)?,
            Representation::List => self.list_to_db(values, property)?,
        };
        Ok(Some(attribute))
    }

    pub(crate) fn collection_from_db(
        &self,
        attribute: &types::AttributeValue,
        property: Option<&PropertyMetadata>,
    ) -> Result<Value> {
        let name = property_name(property);
        let declared = property.and_then(PropertyMetadata::declared_type);
        let values: Vec<Value> = match attribute {
            types::AttributeValue::Ss(values) => {
                values.iter().cloned().map(Value::String).collect()
            }
            types::AttributeValue::Ns(values) => values
                .iter()
                .map(|value| parse_number(value, name).map(Value::Number))
                .collect::<Result<Vec<_>>>()?,
            types::AttributeValue::Bs(blobs) => blobs
                .iter()
                .map(|blob| Value::Binary(blob.as_ref().to_vec()))
                .collect(),
            types::AttributeValue::L(attributes) => {
                let item_model = match property.and_then(PropertyMetadata::item_type) {
                    Some(ItemType::Model(model)) => Some(self.model(model)?),
                    _ => None,
                };
                let values = attributes
                    .iter()
                    .map(|element| match (item_model, element) {
                        (Some(model), types::AttributeValue::M(attributes)) => {
                            self.object_from_db(attributes, Some(model)).map(Value::Object)
                        }
                        (Some(model), other) => Err(Error::invalid_scalar(
                            Some(model.name.as_str()),
                            "M",
                            attribute::type_descriptor(other),
                        )),
                        (None, element) => self.from_db_one(element, None),
                    })
                    .collect::<Result<Vec<_>>>()?;
                return Ok(match declared {
                    Some(PropertyType::Set) => Value::set(values),
                    _ => Value::List(values),
                });
            }
            other => {
                return Err(Error::invalid_scalar(
                    name,
                    "collection",
                    attribute::type_descriptor(other),
                ));
            }
        };
        Ok(match declared {
            Some(PropertyType::Array) => Value::List(values),
            _ => Value::set(values),
        })
    }
}
