use crate::{
    error::Result,
    expression::{self, ConditionOperator},
    mapper::Marshaller,
    metadata::ModelMetadata,
    read,
    value::Value,
};

use aws_sdk_dynamodb::{Client, error, operation, types};
use std::collections;

/// Internal representation of a query request.
#[derive(Clone, Debug, Default, PartialEq)]
struct QueryInput {
    key_condition_expression: String,
    multiple_read_operation: read::common::MultipleReadInput,
    return_consumed_capacity: Option<types::ReturnConsumedCapacity>,
    scan_index_forward: Option<bool>,
}

/// Query operation.
///
/// The key condition targets the table keys, or the keys of
/// `multiple_read_args.index_name` when set.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_mapper::{
///     expression::{self, ConditionOperator},
///     mapper::Marshaller,
///     metadata::{ModelMetadata, PropertyMetadata},
///     read,
///     value::Value,
/// };
///
/// # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
/// let model = ModelMetadata::builder("Post")
///     .table_name("posts")
///     .property(PropertyMetadata::new("author").partition_key())
///     .property(PropertyMetadata::new("created_at").sort_key())
///     .build()?;
/// let marshaller = Marshaller::default();
/// let query = read::query::Query {
///     partition_value: Value::from("ada"),
///     sort_key_condition: Some((ConditionOperator::BeginsWith, vec![Value::from("2024")])),
///     multiple_read_args: read::common::MultipleReadArgs {
///         filter: Some(expression::attribute("draft").equals(false)),
///         ..Default::default()
///     },
///     ..Default::default()
/// };
/// let output = query.send(client, &model, &marshaller).await?;
/// for item in output.items() {
///     let _post = marshaller.from_db(item, Some(&model))?;
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    /// Value the partition key must equal.
    pub partition_value: Value,
    /// Optional condition on the sort key.
    pub sort_key_condition: Option<(ConditionOperator, Vec<Value>)>,
    /// Filter, index, paging and projection.
    pub multiple_read_args: read::common::MultipleReadArgs,
    /// Whether to return the consumed capacity information.
    pub return_consumed_capacity: Option<types::ReturnConsumedCapacity>,
    /// Whether to scan the index forward (ascending) or backward (descending).
    pub scan_index_forward: Option<bool>,
}

impl Query {
    fn into_input(self, model: &ModelMetadata, marshaller: &Marshaller) -> Result<QueryInput> {
        let key_condition = expression::key_condition(
            model,
            self.multiple_read_args.index_name.as_deref(),
            self.partition_value,
            self.sort_key_condition,
            marshaller,
        )?;
        let existing: collections::HashSet<String> =
            key_condition.attribute_values.keys().cloned().collect();
        let mut multiple_read_operation =
            self.multiple_read_args
                .into_input(model, marshaller, &existing)?;
        let key_condition_expression = key_condition.merge_into(
            &mut multiple_read_operation.expression_attribute_names,
            &mut multiple_read_operation.expression_attribute_values,
        );
        Ok(QueryInput {
            key_condition_expression,
            multiple_read_operation,
            return_consumed_capacity: self.return_consumed_capacity,
            scan_index_forward: self.scan_index_forward,
        })
    }

    /// Execute the query operation, following every page.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_mapper.query", skip_all, fields(model = %model.name), err)
    )]
    pub async fn send(
        self,
        client: &Client,
        model: &ModelMetadata,
        marshaller: &Marshaller,
    ) -> Result<operation::query::QueryOutput, error::SdkError<operation::query::QueryError>> {
        let query = self
            .into_input(model, marshaller)
            .map_err(error::BuildError::other)?;
        let builder = client
            .query()
            .key_condition_expression(query.key_condition_expression)
            .set_return_consumed_capacity(query.return_consumed_capacity)
            .set_scan_index_forward(query.scan_index_forward);
        let mut paginator =
            crate::apply_multiple_read_operation!(builder, query.multiple_read_operation)
                .into_paginator()
                .send();
        crate::get_paginated_output!(paginator, operation::query::QueryOutput)
    }
}
