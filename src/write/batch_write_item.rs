use crate::{
    backoff, error::Result, mapper::Marshaller, metadata::ModelMetadata, read, value::Item,
};

use aws_sdk_dynamodb::{Client, error, operation, types};
use std::collections;

/// Most write requests a single batch write request accepts.
pub const MAX_REQUESTS_PER_BATCH: usize = 25;

/// Internal representation of a batch write item request, split into chunks.
#[derive(Clone, Debug, Default, PartialEq)]
struct BatchWriteItemInput {
    chunks: Vec<Vec<types::WriteRequest>>,
    return_consumed_capacity: Option<types::ReturnConsumedCapacity>,
    return_item_collection_metrics: Option<types::ReturnItemCollectionMetrics>,
    table_name: String,
}

/// Batch write item operation over one model's table.
///
/// Puts come first, then deletes, sent in chunks of [`MAX_REQUESTS_PER_BATCH`].
/// Requests the store leaves unprocessed are retried following `backoff`, and
/// whatever is still left afterwards is reported in the output's
/// `unprocessed_items`.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_mapper::{
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
/// let batch_write = write::batch_write_item::BatchWriteItem {
///     puts: vec![Item::from([
///         ("id".to_string(), Value::from("1")),
///         ("name".to_string(), Value::from("John")),
///     ])],
///     deletes: vec![Item::from([("id".to_string(), Value::from("2"))])],
///     ..Default::default()
/// };
/// batch_write.send(client, &model, &Marshaller::default()).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchWriteItem {
    /// Objects to store.
    pub puts: Vec<Item>,
    /// Objects holding at least the key properties of the items to delete.
    pub deletes: Vec<Item>,
    /// Whether to return the consumed capacity information.
    pub return_consumed_capacity: Option<types::ReturnConsumedCapacity>,
    /// Whether to return item collection metrics.
    pub return_item_collection_metrics: Option<types::ReturnItemCollectionMetrics>,
    /// Retry policy for unprocessed requests.
    pub backoff: backoff::BackoffConfig,
}

impl BatchWriteItem {
    fn into_input(
        self,
        model: &ModelMetadata,
        marshaller: &Marshaller,
    ) -> Result<BatchWriteItemInput> {
        let mut requests = Vec::with_capacity(self.puts.len() + self.deletes.len());
        for item in &self.puts {
            let put_request = types::PutRequest::builder()
                .set_item(Some(marshaller.to_db(item, Some(model))?))
                .build()?;
            requests.push(
                types::WriteRequest::builder()
                    .set_put_request(Some(put_request))
                    .build(),
            );
        }
        for key in &self.deletes {
            let delete_request = types::DeleteRequest::builder()
                .set_key(Some(marshaller.to_key(key, model)?))
                .build()?;
            requests.push(
                types::WriteRequest::builder()
                    .set_delete_request(Some(delete_request))
                    .build(),
            );
        }
        let chunks = requests
            .chunks(MAX_REQUESTS_PER_BATCH)
            .map(<[types::WriteRequest]>::to_vec)
            .collect();
        Ok(BatchWriteItemInput {
            chunks,
            return_consumed_capacity: self.return_consumed_capacity,
            return_item_collection_metrics: self.return_item_collection_metrics,
            table_name: marshaller.config().table_name(&model.table_name),
        })
    }

    /// Execute the batch write item operation.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_mapper.batch_write_item", skip_all, fields(model = %model.name), err)
    )]
    pub async fn send(
        self,
        client: &Client,
        model: &ModelMetadata,
        marshaller: &Marshaller,
    ) -> Result<
        operation::batch_write_item::BatchWriteItemOutput,
        error::SdkError<operation::batch_write_item::BatchWriteItemError>,
    > {
        let policy = self.backoff;
        let batch_write_item = self
            .into_input(model, marshaller)
            .map_err(error::BuildError::other)?;
        let table_name = batch_write_item.table_name;
        let mut capacities = Vec::new();
        let mut metrics = Vec::new();
        let mut unprocessed = Vec::new();
        for mut requests in batch_write_item.chunks {
            let mut delays = policy.delays();
            loop {
                let output = client
                    .batch_write_item()
                    .request_items(table_name.clone(), requests)
                    .set_return_consumed_capacity(batch_write_item.return_consumed_capacity.clone())
                    .set_return_item_collection_metrics(
                        batch_write_item.return_item_collection_metrics.clone(),
                    )
                    .send()
                    .await?;
                capacities.extend(output.consumed_capacity.unwrap_or_default());
                if let Some(collection) = output
                    .item_collection_metrics
                    .and_then(|mut collections| collections.remove(&table_name))
                {
                    metrics.extend(collection);
                }
                let remaining = output
                    .unprocessed_items
                    .and_then(|mut items| items.remove(&table_name))
                    .unwrap_or_default();
                if remaining.is_empty() {
                    break;
                }
                #[cfg(feature = "tracing")]
                tracing::debug!(table = %table_name, requests = remaining.len(), "unprocessed requests left");
                if !backoff::wait(&mut delays).await {
                    unprocessed.extend(remaining);
                    break;
                }
                requests = remaining;
            }
        }
        let unprocessed = (!unprocessed.is_empty())
            .then(|| collections::HashMap::from([(table_name.clone(), unprocessed)]));
        let metrics = (!metrics.is_empty())
            .then(|| collections::HashMap::from([(table_name, metrics)]));
        let output = operation::batch_write_item::BatchWriteItemOutput::builder()
            .set_unprocessed_items(unprocessed)
            .set_item_collection_metrics(metrics)
            .set_consumed_capacity(read::common::aggregate_capacity(capacities).map(|c| vec![c]))
            .build();
        Ok(output)
    }
}
