use crate::{
    error::{Error, Result},
    metadata::property::PropertyMetadata,
};

use indexmap::IndexMap;
use std::fmt;

/// Key schema of a secondary index, by host-side property name.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SecondaryIndex {
    /// Partition key property.
    pub partition_key: String,
    /// Sort key property, if the index has one.
    pub sort_key: Option<String>,
}

/// Metadata of a model: its table and the properties it maps.
#[derive(Clone, Debug, Default)]
pub struct ModelMetadata {
    /// Model name, used to resolve nested models.
    pub name: String,
    /// Table the model is stored in.
    pub table_name: String,
    /// Properties in declaration order.
    pub properties: Vec<PropertyMetadata>,
    /// Secondary indexes by index name.
    pub indexes: IndexMap<String, SecondaryIndex>,
}

impl ModelMetadata {
    /// Start building metadata for the named model.
    ///
    /// ```rust
    /// use dynamodb_mapper::metadata::{ModelMetadata, PropertyMetadata, PropertyType};
    ///
    /// let model = ModelMetadata::builder("Person")
    ///     .table_name("persons")
    ///     .property(PropertyMetadata::new("id").partition_key())
    ///     .property(PropertyMetadata::new("age").property_type(PropertyType::Number))
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(model.partition_key().unwrap().name, "id");
    /// ```
    pub fn builder(name: impl Into<String>) -> ModelMetadataBuilder {
        let name = name.into();
        ModelMetadataBuilder {
            table_name: name.clone(),
            name,
            properties: Vec::new(),
        }
    }

    /// Property by host-side name.
    pub fn property(&self, name: &str) -> Option<&PropertyMetadata> {
        self.properties
            .iter()
            .find(|property| property.name == name)
    }

    /// Property by wire attribute name.
    pub fn property_by_name_db(&self, name_db: &str) -> Option<&PropertyMetadata> {
        self.properties
            .iter()
            .find(|property| property.name_db == name_db)
    }

    /// The table's partition key property.
    pub fn partition_key(&self) -> Option<&PropertyMetadata> {
        self.properties
            .iter()
            .find(|property| property.is_partition_key())
    }

    /// The table's sort key property.
    pub fn sort_key(&self) -> Option<&PropertyMetadata> {
        self.properties.iter().find(|property| property.is_sort_key())
    }

    /// Secondary index by name.
    pub fn index(&self, name: &str) -> Option<&SecondaryIndex> {
        self.indexes.get(name)
    }
}

/// Builder for [`ModelMetadata`].
#[derive(Debug)]
pub struct ModelMetadataBuilder {
    name: String,
    table_name: String,
    properties: Vec<PropertyMetadata>,
}

impl ModelMetadataBuilder {
    /// Table the model is stored in (defaults to the model name).
    pub fn table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    /// Add a property.
    pub fn property(mut self, property: PropertyMetadata) -> Self {
        self.properties.push(property);
        self
    }

    fn invalid(&self, message: String) -> Error {
        Error::InvalidMetadata {
            model: self.name.clone(),
            message,
        }
    }

    fn collect_indexes(&self) -> Result<IndexMap<String, SecondaryIndex>> {
        let mut partition_keys: IndexMap<&str, &str> = IndexMap::new();
        for property in &self.properties {
            for index in &property.index_partition_keys {
                if let Some(existing) = partition_keys.insert(index, &property.name) {
                    return Err(self.invalid(format!(
                        "index `{index}` has two partition keys: `{existing}` and `{}`",
                        property.name
                    )));
                }
            }
        }
        let mut indexes: IndexMap<String, SecondaryIndex> = partition_keys
            .into_iter()
            .map(|(index, partition_key)| {
                let index_metadata = SecondaryIndex {
                    partition_key: partition_key.to_string(),
                    sort_key: None,
                };
                (index.to_string(), index_metadata)
            })
            .collect();
        for property in &self.properties {
            for index in &property.index_sort_keys {
                let Some(index_metadata) = indexes.get_mut(index) else {
                    return Err(self.invalid(format!(
                        "index `{index}` has sort key `{}` but no partition key",
                        property.name
                    )));
                };
                if let Some(existing) = &index_metadata.sort_key {
                    return Err(self.invalid(format!(
                        "index `{index}` has two sort keys: `{existing}` and `{}`",
                        property.name
                    )));
                }
                index_metadata.sort_key = Some(property.name.clone());
            }
        }
        Ok(indexes)
    }

    /// Validate the key layout and build the metadata.
    pub fn build(self) -> Result<ModelMetadata> {
        let mut partition_key: Option<&str> = None;
        let mut sort_key: Option<&str> = None;
        for (position, property) in self.properties.iter().enumerate() {
            let duplicate = self.properties[..position].iter().any(|other| {
                other.name == property.name || other.name_db == property.name_db
            });
            if duplicate {
                return Err(self.invalid(format!("property `{}` is declared twice", property.name)));
            }
            if property.is_partition_key() {
                if let Some(existing) = partition_key.replace(&property.name) {
                    return Err(self.invalid(format!(
                        "two partition keys: `{existing}` and `{}`",
                        property.name
                    )));
                }
            }
            if property.is_sort_key() {
                if let Some(existing) = sort_key.replace(&property.name) {
                    return Err(self.invalid(format!(
                        "two sort keys: `{existing}` and `{}`",
                        property.name
                    )));
                }
            }
        }
        if let (None, Some(sort_key)) = (partition_key, sort_key) {
            return Err(self.invalid(format!("sort key `{sort_key}` without a partition key")));
        }
        let indexes = self.collect_indexes()?;
        let model = ModelMetadata {
            name: self.name,
            table_name: self.table_name,
            properties: self.properties,
            indexes,
        };
        Ok(model)
    }
}

/// Read-only lookup of model metadata by model name.
pub trait MetadataProvider: fmt::Debug + Send + Sync {
    /// Metadata of the named model.
    fn model(&self, name: &str) -> Option<&ModelMetadata>;
}

/// Registry of all models, populated once at startup.
///
/// ```rust
/// use dynamodb_mapper::metadata::{MetadataProvider, MetadataRegistry, ModelMetadata};
///
/// let registry = MetadataRegistry::default()
///     .with_model(ModelMetadata::builder("Person").build().unwrap());
/// assert!(registry.model("Person").is_some());
/// ```
#[derive(Clone, Debug, Default)]
pub struct MetadataRegistry {
    models: IndexMap<String, ModelMetadata>,
}

impl MetadataRegistry {
    /// Add a model, replacing any model registered under the same name.
    pub fn with_model(mut self, model: ModelMetadata) -> Self {
        self.models.insert(model.name.clone(), model);
        self
    }
}

impl MetadataProvider for MetadataRegistry {
    fn model(&self, name: &str) -> Option<&ModelMetadata> {
        self.models.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[test]
    fn test_build_collects_indexes() {
        let model = ModelMetadata::builder("a")
            .table_name("b")
            .property(PropertyMetadata::new("id").partition_key())
            .property(PropertyMetadata::new("created").sort_key())
            .property(PropertyMetadata::new("owner").index_partition_key("by_owner"))
            .property(
                PropertyMetadata::new("updated")
                    .name_db("updated_at")
                    .index_sort_key("by_owner"),
            )
            .build()
            .unwrap();
        assert_eq!(model.table_name, "b");
        assert_eq!(model.sort_key().unwrap().name, "created");
        assert_eq!(
            model.index("by_owner"),
            Some(&SecondaryIndex {
                partition_key: "owner".to_string(),
                sort_key: Some("updated".to_string()),
            })
        );
        assert_eq!(model.property_by_name_db("updated_at").unwrap().name, "updated");
    }

    #[rstest]
    #[case::two_partition_keys(vec![
        PropertyMetadata::new("a").partition_key(),
        PropertyMetadata::new("b").auto_generate(),
    ])]
    #[case::two_sort_keys(vec![
        PropertyMetadata::new("a").partition_key(),
        PropertyMetadata::new("b").sort_key(),
        PropertyMetadata::new("c").sort_key(),
    ])]
    #[case::sort_without_partition(vec![PropertyMetadata::new("a").sort_key()])]
    #[case::duplicate_name(vec![PropertyMetadata::new("a"), PropertyMetadata::new("a")])]
    #[case::index_sort_without_partition(vec![PropertyMetadata::new("a").index_sort_key("i")])]
    #[case::index_two_partition_keys(vec![
        PropertyMetadata::new("a").index_partition_key("i"),
        PropertyMetadata::new("b").index_partition_key("i"),
    ])]
    fn test_build_rejects_invalid_keys(#[case] properties: Vec<PropertyMetadata>) {
        let builder = properties
            .into_iter()
            .fold(ModelMetadata::builder("m"), ModelMetadataBuilder::property);
        assert!(matches!(
            builder.build(),
            Err(Error::InvalidMetadata { model, .. }) if model == "m"
        ));
    }

    #[test]
    fn test_registry_lookup() {
        let registry = MetadataRegistry::default()
            .with_model(ModelMetadata::builder("a").build().unwrap());
        assert!(registry.model("a").is_some());
        assert!(registry.model("b").is_none());
    }
}
