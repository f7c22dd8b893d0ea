use crate::{
    attribute::AttributeMap,
    config::MapperConfig,
    error::{Error, Result},
    mapper::registry::{MapperKind, MapperRegistry},
    metadata::{MetadataProvider, MetadataRegistry, ModelMetadata, PropertyMetadata},
    value::{Item, Value},
};

use aws_sdk_dynamodb::types;
use serde::{Serialize, de::DeserializeOwned};
use std::sync;

/// Converts objects and single values to and from attribute values.
///
/// A marshaller is immutable: it only reads the injected metadata provider and
/// configuration, so one instance can be shared freely across threads.
///
/// ```rust
/// use aws_sdk_dynamodb::types::AttributeValue;
/// use dynamodb_mapper::{
///     mapper::Marshaller,
///     metadata::{ModelMetadata, PropertyMetadata, PropertyType},
///     value::{Item, Value},
/// };
///
/// let model = ModelMetadata::builder("Person")
///     .property(PropertyMetadata::new("id").partition_key())
///     .property(PropertyMetadata::new("age").property_type(PropertyType::Number))
///     .build()
///     .unwrap();
/// let item = Item::from([
///     ("id".to_string(), Value::from("myId")),
///     ("age".to_string(), Value::from(20)),
/// ]);
/// let attributes = Marshaller::default().to_db(&item, Some(&model)).unwrap();
/// assert_eq!(attributes["id"], AttributeValue::S("myId".to_string()));
/// assert_eq!(attributes["age"], AttributeValue::N("20".to_string()));
/// ```
#[derive(Clone, Debug)]
pub struct Marshaller {
    registry: MapperRegistry,
    provider: sync::Arc<dyn MetadataProvider>,
    config: MapperConfig,
}

impl Default for Marshaller {
    fn default() -> Self {
        Self::new(sync::Arc::new(MetadataRegistry::default()), MapperConfig::default())
    }
}

impl Marshaller {
    /// Marshaller resolving nested models through `provider`.
    pub fn new(provider: sync::Arc<dyn MetadataProvider>, config: MapperConfig) -> Self {
        Self {
            registry: MapperRegistry::new(sync::Arc::clone(&config.date_mapper)),
            provider,
            config,
        }
    }

    /// The configuration this marshaller was built with.
    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// The mapper registry.
    pub fn registry(&self) -> &MapperRegistry {
        &self.registry
    }

    /// Metadata of a nested model.
    pub fn model(&self, name: &str) -> Result<&ModelMetadata> {
        self.provider
            .model(name)
            .ok_or_else(|| Error::InvalidMetadata {
                model: name.to_string(),
                message: "model is not registered".to_string(),
            })
    }

    /// Convert a single value. `None` means no attribute is written.
    pub fn to_db_one(
        &self,
        value: &Value,
        property: Option<&PropertyMetadata>,
    ) -> Result<Option<types::AttributeValue>> {
        match self.registry.resolve(value, property) {
            MapperKind::Scalar(mapper) => mapper.to_db(value, property),
            MapperKind::Collection => self.collection_to_db(value, property),
            MapperKind::Object => self.nested_object_to_db(value, property),
        }
    }

    /// Convert a single attribute value back into a host value.
    pub fn from_db_one(
        &self,
        attribute: &types::AttributeValue,
        property: Option<&PropertyMetadata>,
    ) -> Result<Value> {
        match self.registry.resolve_attribute(attribute, property)? {
            MapperKind::Scalar(mapper) => mapper.from_db(attribute, property),
            MapperKind::Collection => self.collection_from_db(attribute, property),
            MapperKind::Object => self.nested_object_from_db(attribute, property),
        }
    }

    /// Convert an object into an attribute map.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_mapper.to_db", level = "trace", skip_all, err)
    )]
    pub fn to_db(&self, item: &Item, model: Option<&ModelMetadata>) -> Result<AttributeMap> {
        self.object_to_db(item, model)
    }

    /// Convert an attribute map into an object.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_mapper.from_db", level = "trace", skip_all, err)
    )]
    pub fn from_db(&self, attributes: &AttributeMap, model: Option<&ModelMetadata>) -> Result<Item> {
        self.object_from_db(attributes, model)
    }

    /// Convert a serializable object into an attribute map.
    ///
    /// The object is rendered through `serde_json`, so sets arrive as arrays and
    /// dates as strings: declare such properties in the metadata.
    pub fn to_db_serialize<T: Serialize>(
        &self,
        object: &T,
        model: Option<&ModelMetadata>,
    ) -> Result<AttributeMap> {
        match Value::from(serde_json::to_value(object)?) {
            Value::Object(item) => self.to_db(&item, model),
            other => Err(Error::UnmappableType {
                name: model.map(|model| model.name.clone()).unwrap_or_default(),
                type_name: other.source_type().to_string(),
            }),
        }
    }

    /// Convert an attribute map into a deserializable object.
    pub fn from_db_deserialize<T: DeserializeOwned>(
        &self,
        attributes: &AttributeMap,
        model: Option<&ModelMetadata>,
    ) -> Result<T> {
        let item = self.from_db(attributes, model)?;
        let object = serde_json::from_value(serde_json::Value::from(Value::Object(item)))?;
        Ok(object)
    }

    fn key_attribute(&self, property: &PropertyMetadata, value: Option<&Value>) -> Result<types::AttributeValue> {
        let missing = || Error::MissingKeyValue {
            name: property.name.clone(),
        };
        let value = value.filter(|value| !matches!(value, Value::Null)).ok_or_else(missing)?;
        self.to_db_one(value, Some(property))?.ok_or_else(missing)
    }

    /// Attribute map holding only the table key of `item`.
    pub fn to_key(&self, item: &Item, model: &ModelMetadata) -> Result<AttributeMap> {
        let partition_key = model.partition_key().ok_or_else(|| Error::InvalidMetadata {
            model: model.name.clone(),
            message: "no partition key declared".to_string(),
        })?;
        let mut keys = AttributeMap::with_capacity(2);
        for property in std::iter::once(partition_key).chain(model.sort_key()) {
            let attribute = self.key_attribute(property, item.get(&property.name))?;
            self.check_key_type(property, &attribute)?;
            keys.insert(property.name_db.clone(), attribute);
        }
        Ok(keys)
    }

    /// Attribute map for a table key given its partition and optional sort value.
    pub fn key(
        &self,
        partition_value: &Value,
        sort_value: Option<&Value>,
        model: &ModelMetadata,
    ) -> Result<AttributeMap> {
        let mut item = Item::with_capacity(2);
        if let Some(property) = model.partition_key() {
            item.insert(property.name.clone(), partition_value.clone());
        }
        if let (Some(property), Some(sort_value)) = (model.sort_key(), sort_value) {
            item.insert(property.name.clone(), sort_value.clone());
        }
        self.to_key(&item, model)
    }

    pub(crate) fn check_key_type(
        &self,
        property: &PropertyMetadata,
        attribute: &types::AttributeValue,
    ) -> Result<()> {
        if crate::attribute::is_key_type(attribute) {
            Ok(())
        } else {
            Err(Error::InvalidKeyType {
                name: property.name.clone(),
                found: crate::attribute::type_descriptor(attribute),
            })
        }
    }
}
