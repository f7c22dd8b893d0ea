use crate::{
    attribute::AttributeMap, error::Result, mapper::Marshaller, metadata::ModelMetadata, read,
    value::Item,
};

use aws_sdk_dynamodb::{Client, error, operation, types};

/// Internal representation of a get item request.
#[derive(Clone, Debug, Default, PartialEq)]
struct GetItemInput {
    keys: AttributeMap,
    return_consumed_capacity: Option<types::ReturnConsumedCapacity>,
    single_read_operation: read::common::SingleReadInput,
}

/// Get item operation.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_mapper::{
///     mapper::Marshaller,
///     metadata::{ModelMetadata, PropertyMetadata},
///     read,
///     value::{Item, Value},
/// };
///
/// # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
/// let model = ModelMetadata::builder("User")
///     .table_name("users")
///     .property(PropertyMetadata::new("id").partition_key())
///     .build()?;
/// let marshaller = Marshaller::default();
/// let get_item = read::get_item::GetItem {
///     key: Item::from([("id".to_string(), Value::from("1"))]),
///     ..Default::default()
/// };
/// let output = get_item.send(client, &model, &marshaller).await?;
/// let _user = output
///     .item
///     .map(|item| marshaller.from_db(&item, Some(&model)))
///     .transpose()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GetItem {
    /// Object holding at least the key properties of the item.
    pub key: Item,
    /// Whether to return the consumed capacity information.
    pub return_consumed_capacity: Option<types::ReturnConsumedCapacity>,
    /// Consistency and projection.
    pub single_read_args: read::common::SingleReadArgs,
}

impl GetItem {
    fn into_input(self, model: &ModelMetadata, marshaller: &Marshaller) -> Result<GetItemInput> {
        let keys = marshaller.to_key(&self.key, model)?;
        let single_read_operation = self.single_read_args.into_input(model, marshaller)?;
        Ok(GetItemInput {
            keys,
            return_consumed_capacity: self.return_consumed_capacity,
            single_read_operation,
        })
    }

    /// Execute the get item operation.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_mapper.get_item", skip_all, fields(model = %model.name), err)
    )]
    pub async fn send(
        self,
        client: &Client,
        model: &ModelMetadata,
        marshaller: &Marshaller,
    ) -> Result<
        operation::get_item::GetItemOutput,
        error::SdkError<operation::get_item::GetItemError>,
    > {
        let get_item = self
            .into_input(model, marshaller)
            .map_err(error::BuildError::other)?;
        let builder = client
            .get_item()
            .set_key(Some(get_item.keys))
            .set_return_consumed_capacity(get_item.return_consumed_capacity);
        crate::apply_single_read_operation!(builder, get_item.single_read_operation)
            .send()
            .await
    }
}
