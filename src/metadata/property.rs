use crate::mapper::Mapper;

use std::{fmt, sync};

/// Declared enum of an enum-typed property.
///
/// Values are stored as their integer ordinal.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct EnumMetadata {
    /// Name of the enum, used in error messages.
    pub name: String,
    /// Valid ordinals. `None` means any integer is accepted.
    pub ordinals: Option<Vec<i64>>,
}

impl EnumMetadata {
    /// Enum with a closed set of ordinals.
    pub fn new(name: impl Into<String>, ordinals: impl IntoIterator<Item = i64>) -> Self {
        Self {
            name: name.into(),
            ordinals: Some(ordinals.into_iter().collect()),
        }
    }

    pub(crate) fn contains(&self, ordinal: i64) -> bool {
        self.ordinals
            .as_ref()
            .is_none_or(|ordinals| ordinals.contains(&ordinal))
    }
}

/// Declared type of a property.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PropertyType {
    /// Plain string.
    String,
    /// Plain number.
    Number,
    /// Plain boolean.
    Boolean,
    /// Null.
    Null,
    /// Raw bytes.
    Binary,
    /// Point in time, stored through the configured date mapper.
    Date,
    /// Integer-backed enum.
    Enum(EnumMetadata),
    /// Ordered sequence.
    Array,
    /// Collection without duplicates.
    Set,
    /// Untyped nested object.
    Map,
    /// Nested object described by the named model.
    Model(String),
}

impl PropertyType {
    /// `false` only for plain scalars, which are mapped by inspecting the runtime value.
    pub fn is_custom(&self) -> bool {
        !matches!(self, Self::String | Self::Number | Self::Boolean | Self::Null)
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("String"),
            Self::Number => f.write_str("Number"),
            Self::Boolean => f.write_str("Boolean"),
            Self::Null => f.write_str("Null"),
            Self::Binary => f.write_str("Binary"),
            Self::Date => f.write_str("Date"),
            Self::Enum(metadata) => write!(f, "Enum({})", metadata.name),
            Self::Array => f.write_str("Array"),
            Self::Set => f.write_str("Set"),
            Self::Map => f.write_str("Map"),
            Self::Model(name) => write!(f, "Model({name})"),
        }
    }
}

/// Declared item type of a collection property.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ItemType {
    /// Items are strings.
    String,
    /// Items are numbers.
    Number,
    /// Items are raw bytes.
    Binary,
    /// Items are objects described by the named model.
    Model(String),
}

/// Declared type information of a property.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TypeInfo {
    /// Declared type.
    pub property_type: PropertyType,
    /// Whether the declared type drives mapper selection instead of the runtime value.
    pub is_custom: bool,
    /// Item type for collections.
    pub generic_type: Option<ItemType>,
}

impl From<PropertyType> for TypeInfo {
    fn from(property_type: PropertyType) -> Self {
        Self {
            is_custom: property_type.is_custom(),
            property_type,
            generic_type: None,
        }
    }
}

/// Role of a property in the table's primary key.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum KeyRole {
    /// Not part of the primary key.
    #[default]
    None,
    /// Partition key, optionally filled with a generated identifier when unset.
    Partition {
        /// Generate a random identifier when the value is falsy.
        auto_generate: bool,
    },
    /// Sort key.
    Sort,
}

/// Metadata of a single property.
///
/// ```rust
/// use dynamodb_mapper::metadata::{ItemType, PropertyMetadata, PropertyType};
///
/// let id = PropertyMetadata::new("id").partition_key();
/// let tags = PropertyMetadata::new("tags")
///     .name_db("tag_list")
///     .property_type(PropertyType::Set)
///     .generic_type(ItemType::String)
///     .sorted();
/// assert_eq!(tags.name_db, "tag_list");
/// ```
#[derive(Clone, Default)]
pub struct PropertyMetadata {
    /// Host-side name.
    pub name: String,
    /// Attribute name on the wire.
    pub name_db: String,
    /// Role in the table's primary key.
    pub key_role: KeyRole,
    /// Secondary indexes this property is the partition key of.
    pub index_partition_keys: Vec<String>,
    /// Secondary indexes this property is the sort key of.
    pub index_sort_keys: Vec<String>,
    /// Declared type, if any.
    pub type_info: Option<TypeInfo>,
    /// Collection order must be preserved, forcing a list representation.
    pub is_sorted_collection: bool,
    /// Mapper overriding type-based resolution.
    pub custom_mapper: Option<sync::Arc<dyn Mapper>>,
    /// Excluded from marshalling.
    pub transient: bool,
}

impl fmt::Debug for PropertyMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyMetadata")
            .field("name", &self.name)
            .field("name_db", &self.name_db)
            .field("key_role", &self.key_role)
            .field("type_info", &self.type_info)
            .field("is_sorted_collection", &self.is_sorted_collection)
            .field("custom_mapper", &self.custom_mapper.is_some())
            .field("transient", &self.transient)
            .finish_non_exhaustive()
    }
}

impl PropertyMetadata {
    /// Property stored under its own name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            name_db: name.clone(),
            name,
            ..Default::default()
        }
    }

    /// Store the property under a different attribute name.
    pub fn name_db(mut self, name_db: impl Into<String>) -> Self {
        self.name_db = name_db.into();
        self
    }

    /// Mark the property as the table's partition key.
    pub fn partition_key(mut self) -> Self {
        self.key_role = KeyRole::Partition {
            auto_generate: false,
        };
        self
    }

    /// Mark the property as a partition key filled with a random identifier when unset.
    pub fn auto_generate(mut self) -> Self {
        self.key_role = KeyRole::Partition {
            auto_generate: true,
        };
        self
    }

    /// Mark the property as the table's sort key.
    pub fn sort_key(mut self) -> Self {
        self.key_role = KeyRole::Sort;
        self
    }

    /// Mark the property as partition key of a secondary index.
    pub fn index_partition_key(mut self, index: impl Into<String>) -> Self {
        self.index_partition_keys.push(index.into());
        self
    }

    /// Mark the property as sort key of a secondary index.
    pub fn index_sort_key(mut self, index: impl Into<String>) -> Self {
        self.index_sort_keys.push(index.into());
        self
    }

    /// Declare the property's type.
    pub fn property_type(mut self, property_type: PropertyType) -> Self {
        let generic_type = self.type_info.take().and_then(|info| info.generic_type);
        let mut type_info = TypeInfo::from(property_type);
        type_info.generic_type = generic_type;
        self.type_info = Some(type_info);
        self
    }

    /// Declare the item type of a collection property.
    ///
    /// Without a declared type the property is treated as an [`PropertyType::Array`].
    pub fn generic_type(mut self, item_type: ItemType) -> Self {
        let mut type_info = self
            .type_info
            .take()
            .unwrap_or_else(|| TypeInfo::from(PropertyType::Array));
        type_info.generic_type = Some(item_type);
        self.type_info = Some(type_info);
        self
    }

    /// Preserve collection order by always storing a list.
    pub fn sorted(mut self) -> Self {
        self.is_sorted_collection = true;
        self
    }

    /// Exclude the property from marshalling.
    pub fn transient(mut self) -> Self {
        self.transient = true;
        self
    }

    /// Use a custom mapper for this property.
    pub fn custom_mapper(mut self, mapper: sync::Arc<dyn Mapper>) -> Self {
        self.custom_mapper = Some(mapper);
        self
    }

    /// Declared type, if any.
    pub fn declared_type(&self) -> Option<&PropertyType> {
        self.type_info.as_ref().map(|info| &info.property_type)
    }

    /// Declared type, when it is custom and therefore drives mapper selection.
    pub fn custom_type(&self) -> Option<&PropertyType> {
        self.type_info
            .as_ref()
            .filter(|info| info.is_custom)
            .map(|info| &info.property_type)
    }

    /// Declared collection item type, if any.
    pub fn item_type(&self) -> Option<&ItemType> {
        self.type_info
            .as_ref()
            .and_then(|info| info.generic_type.as_ref())
    }

    /// Whether the property is the table's partition key.
    pub fn is_partition_key(&self) -> bool {
        matches!(self.key_role, KeyRole::Partition { .. })
    }

    /// Whether the property is the table's sort key.
    pub fn is_sort_key(&self) -> bool {
        self.key_role == KeyRole::Sort
    }

    /// Whether the property takes part in the table's or an index's primary key.
    pub fn is_key(&self) -> bool {
        self.key_role != KeyRole::None
            || !self.index_partition_keys.is_empty()
            || !self.index_sort_keys.is_empty()
    }

    /// Whether the partition key is filled with a generated identifier.
    pub fn is_auto_generated(&self) -> bool {
        self.key_role
            == KeyRole::Partition {
                auto_generate: true,
            }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case::string(PropertyType::String, false)]
    #[case::number(PropertyType::Number, false)]
    #[case::boolean(PropertyType::Boolean, false)]
    #[case::date(PropertyType::Date, true)]
    #[case::set(PropertyType::Set, true)]
    #[case::model(PropertyType::Model("a".to_string()), true)]
    #[case::enumeration(PropertyType::Enum(EnumMetadata::default()), true)]
    fn test_is_custom(#[case] property_type: PropertyType, #[case] expected: bool) {
        assert_eq!(property_type.is_custom(), expected);
    }

    #[test]
    fn test_builder_keeps_generic_type() {
        let property = PropertyMetadata::new("a")
            .generic_type(ItemType::Number)
            .property_type(PropertyType::Set);
        assert_eq!(property.declared_type(), Some(&PropertyType::Set));
        assert_eq!(property.item_type(), Some(&ItemType::Number));
        assert_eq!(property.name_db, "a");
    }

    #[test]
    fn test_custom_type_hides_plain_scalars() {
        let number = PropertyMetadata::new("a").property_type(PropertyType::Number);
        assert_eq!(number.custom_type(), None);
        let date = PropertyMetadata::new("b").property_type(PropertyType::Date);
        assert_eq!(date.custom_type(), Some(&PropertyType::Date));
    }

    #[rstest]
    #[case::none(PropertyMetadata::new("a"), false)]
    #[case::partition(PropertyMetadata::new("a").partition_key(), true)]
    #[case::sort(PropertyMetadata::new("a").sort_key(), true)]
    #[case::index(PropertyMetadata::new("a").index_partition_key("gsi"), true)]
    fn test_is_key(#[case] property: PropertyMetadata, #[case] expected: bool) {
        assert_eq!(property.is_key(), expected);
    }

    #[test]
    fn test_enum_contains() {
        assert!(EnumMetadata::new("Color", [0, 1]).contains(1));
        assert!(!EnumMetadata::new("Color", [0, 1]).contains(2));
        assert!(EnumMetadata::default().contains(42));
    }
}
