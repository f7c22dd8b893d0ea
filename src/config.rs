//! Mapper configuration.
//!
//! The configuration is injected into a [`Marshaller`](crate::mapper::Marshaller)
//! and is read-only afterwards.

use crate::mapper::{DateToStringMapper, Mapper};

use std::{fmt, sync};

/// Resolves a model's table name to the physical table name.
pub type TableNameResolver = sync::Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Configuration shared by every marshalling call.
///
/// ```rust
/// use dynamodb_mapper::{config::MapperConfig, mapper::DateToNumberMapper};
/// use std::sync::Arc;
///
/// let config = MapperConfig::default()
///     .with_date_mapper(Arc::new(DateToNumberMapper))
///     .with_table_name_resolver(Arc::new(|name: &str| format!("dev-{name}")));
/// assert_eq!(config.table_name("users"), "dev-users");
/// ```
#[derive(Clone)]
pub struct MapperConfig {
    /// Mapper used for date values and date-typed properties.
    pub date_mapper: sync::Arc<dyn Mapper>,
    /// Table name resolver applied by request builders.
    pub table_name_resolver: TableNameResolver,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            date_mapper: sync::Arc::new(DateToStringMapper),
            table_name_resolver: sync::Arc::new(|name: &str| name.to_string()),
        }
    }
}

impl fmt::Debug for MapperConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapperConfig")
            .field("date_mapper", &self.date_mapper)
            .finish_non_exhaustive()
    }
}

impl MapperConfig {
    /// Replace the date mapper.
    pub fn with_date_mapper(mut self, date_mapper: sync::Arc<dyn Mapper>) -> Self {
        self.date_mapper = date_mapper;
        self
    }

    /// Replace the table name resolver.
    pub fn with_table_name_resolver(mut self, table_name_resolver: TableNameResolver) -> Self {
        self.table_name_resolver = table_name_resolver;
        self
    }

    /// Physical table name of a model's table.
    pub fn table_name(&self, table_name: &str) -> String {
        (self.table_name_resolver)(table_name)
    }
}
