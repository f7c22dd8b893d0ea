use crate::{
    error::Result,
    expression::{Condition, Expression},
    mapper::Marshaller,
    metadata::ModelMetadata,
};

use aws_sdk_dynamodb::types;
use std::collections;

/// Internal representation of write operation parameters.
///
/// Holds the condition already rendered and the table name already resolved,
/// ready to be applied to a request builder.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct WriteInput {
    pub(crate) condition_expression: Option<String>,
    pub(crate) expression_attribute_names: Option<collections::HashMap<String, String>>,
    pub(crate) expression_attribute_values:
        Option<collections::HashMap<String, types::AttributeValue>>,
    pub(crate) return_consumed_capacity: Option<types::ReturnConsumedCapacity>,
    pub(crate) return_item_collection_metrics: Option<types::ReturnItemCollectionMetrics>,
    pub(crate) return_values: Option<types::ReturnValue>,
    pub(crate) return_values_on_condition_check_failure:
        Option<types::ReturnValuesOnConditionCheckFailure>,
    pub(crate) table_name: String,
}

impl WriteInput {
    /// Merge an expression into this write operation, returning its statement.
    pub(crate) fn merge_expression(&mut self, expression: Expression) -> String {
        expression.merge_into(
            &mut self.expression_attribute_names,
            &mut self.expression_attribute_values,
        )
    }
}

/// Arguments common to put, update and delete.
///
/// ```rust
/// use dynamodb_mapper::{expression, write};
///
/// let args = write::common::WriteArgs {
///     condition: Some(expression::attribute("version").equals(3)),
///     ..Default::default()
/// };
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WriteArgs {
    /// Condition that must hold for the write to proceed.
    ///
    /// When it does not hold the store rejects the request with a conditional
    /// check failure.
    pub condition: Option<Condition>,
    /// Whether to return the consumed capacity information.
    pub return_consumed_capacity: Option<types::ReturnConsumedCapacity>,
    /// Whether to return item collection metrics.
    pub return_item_collection_metrics: Option<types::ReturnItemCollectionMetrics>,
    /// Which item attributes to return in the response.
    pub return_values: Option<types::ReturnValue>,
    /// Which item attributes to return if a condition check fails.
    pub return_values_on_condition_check_failure:
        Option<types::ReturnValuesOnConditionCheckFailure>,
}

impl WriteArgs {
    /// Resolve the arguments, keeping clear of value placeholders already in use.
    pub(crate) fn into_input(
        self,
        model: &ModelMetadata,
        marshaller: &Marshaller,
        existing: &collections::HashSet<String>,
    ) -> Result<WriteInput> {
        let mut input = WriteInput {
            return_consumed_capacity: self.return_consumed_capacity,
            return_item_collection_metrics: self.return_item_collection_metrics,
            return_values: self.return_values,
            return_values_on_condition_check_failure: self
                .return_values_on_condition_check_failure,
            table_name: marshaller.config().table_name(&model.table_name),
            ..Default::default()
        };
        if let Some(condition) = self.condition {
            let condition = condition.build(existing, Some(model), marshaller)?;
            if !condition.statement.is_empty() {
                input.condition_expression = Some(input.merge_expression(condition));
            }
        }
        Ok(input)
    }
}

/// Apply common write operation settings to a request builder.
#[macro_export]
macro_rules! apply_write_operation {
    ($builder:expr, $write_operation:expr) => {
        $builder
            .set_condition_expression($write_operation.condition_expression)
            .set_expression_attribute_names($write_operation.expression_attribute_names)
            .set_expression_attribute_values($write_operation.expression_attribute_values)
            .set_return_consumed_capacity($write_operation.return_consumed_capacity)
            .set_return_item_collection_metrics($write_operation.return_item_collection_metrics)
            .set_return_values($write_operation.return_values)
            .set_return_values_on_condition_check_failure(
                $write_operation.return_values_on_condition_check_failure,
            )
            .table_name($write_operation.table_name)
    };
}
