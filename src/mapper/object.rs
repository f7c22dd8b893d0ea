use crate::{
    attribute::{self, AttributeMap},
    error::{Error, Result},
    mapper::{Marshaller, property_name},
    metadata::{ModelMetadata, PropertyMetadata, PropertyType},
    value::{Item, Value},
};

use aws_sdk_dynamodb::types;
use std::borrow;

impl Marshaller {
    /// Fill every auto-generated partition key whose value is falsy with a random identifier.
    pub fn assign_generated_keys(&self, item: &mut Item, model: &ModelMetadata) {
        for property in &model.properties {
            if !property.is_auto_generated() {
                continue;
            }
            if item.get(&property.name).is_none_or(Value::is_falsy) {
                let identifier = uuid::Uuid::new_v4().to_string();
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    model = %model.name,
                    property = %property.name,
                    %identifier,
                    "generated identifier"
                );
                item.insert(property.name.clone(), Value::String(identifier));
            }
        }
    }

    fn needs_generated_keys(item: &Item, model: &ModelMetadata) -> bool {
        model.properties.iter().any(|property| {
            property.is_auto_generated() && item.get(&property.name).is_none_or(Value::is_falsy)
        })
    }

    pub(crate) fn object_to_db(
        &self,
        item: &Item,
        model: Option<&ModelMetadata>,
    ) -> Result<AttributeMap> {
        let item = match model {
            Some(model) if Self::needs_generated_keys(item, model) => {
                let mut item = item.clone();
                self.assign_generated_keys(&mut item, model);
                borrow::Cow::Owned(item)
            }
            _ => borrow::Cow::Borrowed(item),
        };
        let mut attributes = AttributeMap::with_capacity(item.len());
        for (name, value) in item.iter() {
            let property = model.and_then(|model| model.property(name));
            if property.is_some_and(|property| property.transient) {
                continue;
            }
            if matches!(value, Value::Null) {
                continue;
            }
            let Some(attribute) = self.to_db_one(value, property)? else {
                continue;
            };
            let name_db = match property {
                Some(property) => {
                    if property.is_key() {
                        self.check_key_type(property, &attribute)?;
                    }
                    property.name_db.clone()
                }
                None => name.clone(),
            };
            attributes.insert(name_db, attribute);
        }
        Ok(attributes)
    }

    pub(crate) fn object_from_db(
        &self,
        attributes: &AttributeMap,
        model: Option<&ModelMetadata>,
    ) -> Result<Item> {
        let mut names_db: Vec<&String> = attributes.keys().collect();
        let position = |name_db: &str| {
            model
                .and_then(|model| {
                    model
                        .properties
                        .iter()
                        .position(|property| property.name_db == name_db)
                })
                .unwrap_or(usize::MAX)
        };
        names_db.sort_by(|a, b| position(a).cmp(&position(b)).then_with(|| a.cmp(b)));
        let mut item = Item::with_capacity(attributes.len());
        for name_db in names_db {
            let property = model.and_then(|model| model.property_by_name_db(name_db));
            if property.is_some_and(|property| property.transient) {
                continue;
            }
            let value = self.from_db_one(&attributes[name_db], property)?;
            let name = property.map_or(name_db, |property| &property.name);
            item.insert(name.clone(), value);
        }
        Ok(item)
    }

    fn nested_model(&self, property: Option<&PropertyMetadata>) -> Result<Option<&ModelMetadata>> {
        match property.and_then(PropertyMetadata::declared_type) {
            Some(PropertyType::Model(name)) => self.model(name).map(Some),
            _ => Ok(None),
        }
    }

    pub(crate) fn nested_object_to_db(
        &self,
        value: &Value,
        property: Option<&PropertyMetadata>,
    ) -> Result<Option<types::AttributeValue>> {
        let Value::Object(item) = value else {
            return Err(Error::invalid_scalar(property_name(property), "object", value));
        };
        let model = self.nested_model(property)?;
        let attributes = self.object_to_db(item, model)?;
        Ok(Some(types::AttributeValue::M(attributes)))
    }

    pub(crate) fn nested_object_from_db(
        &self,
        attribute: &types::AttributeValue,
        property: Option<&PropertyMetadata>,
    ) -> Result<Value> {
        let types::AttributeValue::M(attributes) = attribute else {
            return Err(Error::invalid_scalar(
                property_name(property),
                "M",
                attribute::type_descriptor(attribute),
            ));
        };
        let model = self.nested_model(property)?;
        self.object_from_db(attributes, model).map(Value::Object)
    }
}
