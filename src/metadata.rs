//! Model and property metadata consumed by the marshaller and the expression builder.
//!
//! Metadata is assembled once, explicitly, through builders and is read-only
//! afterwards. Nested models are resolved by name through a [`MetadataProvider`]
//! injected into the [`Marshaller`](crate::mapper::Marshaller).

/// Per-model metadata (table name, properties, secondary indexes).
pub mod model;

/// Per-property metadata (wire name, key role, declared type, mapper override).
pub mod property;

pub use model::{MetadataProvider, MetadataRegistry, ModelMetadata, ModelMetadataBuilder, SecondaryIndex};
pub use property::{EnumMetadata, ItemType, KeyRole, PropertyMetadata, PropertyType, TypeInfo};
