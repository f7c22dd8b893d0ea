use crate::{
    attribute::AttributeMap,
    error::Result,
    expression::{self, UpdateDefinition},
    mapper::Marshaller,
    metadata::ModelMetadata,
    value::Item,
    write,
};

use aws_sdk_dynamodb::{Client, error, operation};
use std::collections;

/// Internal representation of an update item request.
#[derive(Debug, PartialEq)]
struct UpdateItemInput {
    keys: AttributeMap,
    update_expression: Option<String>,
    write_operation: write::common::WriteInput,
}

/// Update item operation.
///
/// Definitions are grouped into one update expression, clauses ordered
/// `SET`, `REMOVE`, `ADD`, `DELETE`.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_mapper::{
///     expression,
///     mapper::Marshaller,
///     metadata::{ModelMetadata, PropertyMetadata},
///     value::{Item, Value},
///     write,
/// };
///
/// # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
/// let model = ModelMetadata::builder("User")
///     .table_name("users")
///     .property(PropertyMetadata::new("id").partition_key())
///     .build()?;
/// let update_item = write::update_item::UpdateItem {
///     key: Item::from([("id".to_string(), Value::from("1"))]),
///     updates: vec![
///         expression::update("name").set("Jane"),
///         expression::update("visits").increment_by(1),
///         expression::update("nickname").remove(),
///     ],
///     write_args: write::common::WriteArgs {
///         condition: Some(expression::attribute("id").attribute_exists()),
///         ..Default::default()
///     },
/// };
/// update_item.send(client, &model, &Marshaller::default()).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateItem {
    /// Object holding at least the key properties of the item.
    pub key: Item,
    /// Changes to apply.
    pub updates: Vec<UpdateDefinition>,
    /// Condition and return values.
    pub write_args: write::common::WriteArgs,
}

impl UpdateItem {
    fn into_input(self, model: &ModelMetadata, marshaller: &Marshaller) -> Result<UpdateItemInput> {
        let keys = marshaller.to_key(&self.key, model)?;
        let update = expression::build_update(&self.updates, Some(model), marshaller)?;
        let existing: collections::HashSet<String> =
            update.attribute_values.keys().cloned().collect();
        let mut write_operation = self.write_args.into_input(model, marshaller, &existing)?;
        let update_expression = Some(write_operation.merge_expression(update))
            .filter(|statement| !statement.is_empty());
        Ok(UpdateItemInput {
            keys,
            update_expression,
            write_operation,
        })
    }

    /// Execute the update item operation.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_mapper.update_item", skip_all, fields(model = %model.name), err)
    )]
    pub async fn send(
        self,
        client: &Client,
        model: &ModelMetadata,
        marshaller: &Marshaller,
    ) -> Result<
        operation::update_item::UpdateItemOutput,
        error::SdkError<operation::update_item::UpdateItemError>,
    > {
        let update_item = self
            .into_input(model, marshaller)
            .map_err(error::BuildError::other)?;
        let builder = client
            .update_item()
            .set_key(Some(update_item.keys))
            .set_update_expression(update_item.update_expression);
        crate::apply_write_operation!(builder, update_item.write_operation)
            .send()
            .await
    }
}
