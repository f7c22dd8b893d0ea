use crate::{
    attribute::AttributeMap,
    error::Result,
    expression::{self, Condition},
    mapper::Marshaller,
    metadata::ModelMetadata,
};

use aws_sdk_dynamodb::types;
use std::collections;

/// Internal representation of single read operation parameters.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct SingleReadInput {
    pub(crate) consistent_read: Option<bool>,
    pub(crate) expression_attribute_names: Option<collections::HashMap<String, String>>,
    pub(crate) projection_expression: Option<String>,
    pub(crate) table_name: String,
}

/// Arguments shared by reads of individual items.
///
/// ```rust
/// use dynamodb_mapper::read;
///
/// let args = read::common::SingleReadArgs {
///     consistent_read: Some(true),
///     projection: Some(vec!["id".to_string(), "name".to_string()]),
/// };
/// ```
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct SingleReadArgs {
    /// Whether to use strongly consistent reads.
    pub consistent_read: Option<bool>,
    /// Attribute paths to return; all attributes when unset.
    pub projection: Option<Vec<String>>,
}

impl SingleReadArgs {
    pub(crate) fn into_input(
        self,
        model: &ModelMetadata,
        marshaller: &Marshaller,
    ) -> Result<SingleReadInput> {
        let (expression_attribute_names, projection_expression) = match self.projection {
            Some(paths) => {
                let projection = expression::projection(paths, Some(model))?;
                (Some(projection.attribute_names), Some(projection.statement))
            }
            None => (None, None),
        };
        Ok(SingleReadInput {
            consistent_read: self.consistent_read,
            expression_attribute_names,
            projection_expression,
            table_name: marshaller.config().table_name(&model.table_name),
        })
    }
}

/// Internal representation of query and scan parameters.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct MultipleReadInput {
    pub(crate) consistent_read: Option<bool>,
    pub(crate) exclusive_start_key: Option<AttributeMap>,
    pub(crate) expression_attribute_names: Option<collections::HashMap<String, String>>,
    pub(crate) expression_attribute_values:
        Option<collections::HashMap<String, types::AttributeValue>>,
    pub(crate) filter_expression: Option<String>,
    pub(crate) index_name: Option<String>,
    pub(crate) limit: Option<i32>,
    pub(crate) projection_expression: Option<String>,
    pub(crate) select: Option<types::Select>,
    pub(crate) table_name: String,
}

/// Arguments shared by queries and scans.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MultipleReadArgs {
    /// Filter applied after reading.
    pub filter: Option<Condition>,
    /// Whether to use strongly consistent reads.
    pub consistent_read: Option<bool>,
    /// Key to start after, as returned in a previous page's last evaluated key.
    pub exclusive_start_key: Option<AttributeMap>,
    /// Secondary index to read from.
    pub index_name: Option<String>,
    /// Page size.
    pub limit: Option<i32>,
    /// Attributes to return.
    pub select: Option<types::Select>,
    /// Attribute paths to return; all attributes when unset.
    pub projection: Option<Vec<String>>,
}

impl MultipleReadArgs {
    /// Resolve the arguments, keeping clear of value placeholders already in use.
    pub(crate) fn into_input(
        self,
        model: &ModelMetadata,
        marshaller: &Marshaller,
        existing: &collections::HashSet<String>,
    ) -> Result<MultipleReadInput> {
        let mut input = MultipleReadInput {
            consistent_read: self.consistent_read,
            exclusive_start_key: self.exclusive_start_key,
            index_name: self.index_name,
            limit: self.limit,
            select: self.select,
            table_name: marshaller.config().table_name(&model.table_name),
            ..Default::default()
        };
        if let Some(filter) = self.filter {
            let filter = filter.build(existing, Some(model), marshaller)?;
            input.filter_expression = Some(filter.merge_into(
                &mut input.expression_attribute_names,
                &mut input.expression_attribute_values,
            ));
        }
        if let Some(paths) = self.projection {
            let projection = expression::projection(paths, Some(model))?;
            input.projection_expression = Some(projection.merge_into(
                &mut input.expression_attribute_names,
                &mut input.expression_attribute_values,
            ));
        }
        Ok(input)
    }
}

/// Collect every page of a paginated query or scan into one output.
#[macro_export]
macro_rules! get_paginated_output {
    ($paginator:expr, $output_type:ty) => {{
        let mut outputs = Vec::new();
        while let Some(page) = $paginator.next().await {
            outputs.push(page?);
        }
        let (items, count, scanned, capacities) = outputs.into_iter().fold(
            (Vec::new(), 0, 0, Vec::new()),
            |(mut items, count, scanned, mut capacities), output| {
                if let Some(other_items) = output.items {
                    items.extend(other_items);
                }
                if let Some(capacity) = output.consumed_capacity {
                    capacities.push(capacity);
                }
                (
                    items,
                    count + output.count,
                    scanned + output.scanned_count,
                    capacities,
                )
            },
        );
        let output = <$output_type>::builder()
            .set_items(Some(items))
            .set_count(Some(count))
            .set_scanned_count(Some(scanned))
            .set_consumed_capacity($crate::read::common::aggregate_capacity(capacities))
            .build();
        Ok(output)
    }};
}

/// Sum the consumed capacity of several responses.
pub(crate) fn aggregate_capacity(
    capacities: Vec<types::ConsumedCapacity>,
) -> Option<types::ConsumedCapacity> {
    if capacities.is_empty() {
        return None;
    }
    let (total, read, write, table) = capacities.into_iter().fold(
        (0.0, 0.0, 0.0, None),
        |(total, read, write, table), capacity| {
            (
                total + capacity.capacity_units.unwrap_or(0.0),
                read + capacity.read_capacity_units.unwrap_or(0.0),
                write + capacity.write_capacity_units.unwrap_or(0.0),
                table.or(capacity.table_name),
            )
        },
    );
    let capacity = types::ConsumedCapacity::builder()
        .set_table_name(table)
        .set_capacity_units(Some(total))
        .set_read_capacity_units(Some(read))
        .set_write_capacity_units(Some(write))
        .build();
    Some(capacity)
}

/// Apply single read parameters to a request builder.
#[macro_export]
macro_rules! apply_single_read_operation {
    ($builder:expr, $single_read_operation:expr) => {
        $builder
            .set_consistent_read($single_read_operation.consistent_read)
            .set_expression_attribute_names($single_read_operation.expression_attribute_names)
            .set_projection_expression($single_read_operation.projection_expression)
            .table_name($single_read_operation.table_name)
    };
}

/// Apply query and scan parameters to a request builder.
#[macro_export]
macro_rules! apply_multiple_read_operation {
    ($builder:expr, $multiple_read_operation:expr) => {
        $builder
            .set_consistent_read($multiple_read_operation.consistent_read)
            .set_exclusive_start_key($multiple_read_operation.exclusive_start_key)
            .set_expression_attribute_names($multiple_read_operation.expression_attribute_names)
            .set_expression_attribute_values($multiple_read_operation.expression_attribute_values)
            .set_filter_expression($multiple_read_operation.filter_expression)
            .set_index_name($multiple_read_operation.index_name)
            .set_limit($multiple_read_operation.limit)
            .set_projection_expression($multiple_read_operation.projection_expression)
            .set_select($multiple_read_operation.select)
            .table_name($multiple_read_operation.table_name)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::MapperConfig, metadata::{MetadataRegistry, PropertyMetadata}};

    use rstest::rstest;
    use std::sync;

    fn model() -> ModelMetadata {
        ModelMetadata::builder("Person")
            .table_name("persons")
            .property(PropertyMetadata::new("id").partition_key())
            .property(PropertyMetadata::new("name").name_db("full_name"))
            .build()
            .unwrap()
    }

    #[rstest]
    #[case::empty(
        SingleReadArgs::default(),
        SingleReadInput {
            table_name: "persons".to_string(),
            ..Default::default()
        }
    )]
    #[case::projection(
        SingleReadArgs {
            consistent_read: Some(true),
            projection: Some(vec!["id".to_string(), "name".to_string()]),
        },
        SingleReadInput {
            consistent_read: Some(true),
            expression_attribute_names: Some(collections::HashMap::from([
                ("#id".to_string(), "id".to_string()),
                ("#full_name".to_string(), "full_name".to_string()),
            ])),
            projection_expression: Some("#id, #full_name".to_string()),
            table_name: "persons".to_string(),
        }
    )]
    fn test_single_read_args(#[case] args: SingleReadArgs, #[case] expected: SingleReadInput) {
        let actual = args.into_input(&model(), &Marshaller::default()).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_multiple_read_args() {
        let args = MultipleReadArgs {
            filter: Some(expression::attribute("name").begins_with("J")),
            index_name: Some("by_name".to_string()),
            limit: Some(10),
            projection: Some(vec!["id".to_string()]),
            ..Default::default()
        };
        let existing = collections::HashSet::from([":full_name".to_string()]);
        let actual = args
            .into_input(&model(), &Marshaller::default(), &existing)
            .unwrap();
        let expected = MultipleReadInput {
            expression_attribute_names: Some(collections::HashMap::from([
                ("#id".to_string(), "id".to_string()),
                ("#full_name".to_string(), "full_name".to_string()),
            ])),
            expression_attribute_values: Some(collections::HashMap::from([(
                ":full_name_2".to_string(),
                types::AttributeValue::S("J".to_string()),
            )])),
            filter_expression: Some("begins_with (#full_name, :full_name_2)".to_string()),
            index_name: Some("by_name".to_string()),
            limit: Some(10),
            projection_expression: Some("#id".to_string()),
            table_name: "persons".to_string(),
            ..Default::default()
        };
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_table_name_resolver() {
        let config = MapperConfig::default()
            .with_table_name_resolver(sync::Arc::new(|name: &str| format!("test-{name}")));
        let marshaller = Marshaller::new(sync::Arc::new(MetadataRegistry::default()), config);
        let actual = SingleReadArgs::default().into_input(&model(), &marshaller).unwrap();
        assert_eq!(actual.table_name, "test-persons");
    }

    #[test]
    fn test_aggregate_capacity() {
        let capacities = vec![
            types::ConsumedCapacity::builder()
                .table_name("a")
                .capacity_units(1.0)
                .build(),
            types::ConsumedCapacity::builder()
                .capacity_units(2.5)
                .read_capacity_units(2.5)
                .build(),
        ];
        let actual = aggregate_capacity(capacities).unwrap();
        assert_eq!(actual.table_name.as_deref(), Some("a"));
        assert_eq!(actual.capacity_units, Some(3.5));
        assert_eq!(actual.read_capacity_units, Some(2.5));
        assert_eq!(aggregate_capacity(Vec::new()), None);
    }
}
