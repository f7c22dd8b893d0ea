use crate::{
    attribute::AttributeMap, backoff, error::Result, mapper::Marshaller, metadata::ModelMetadata,
    read, value::Item,
};

use aws_sdk_dynamodb::{Client, error, operation, types};
use std::collections;

/// Most keys a single batch get request accepts.
pub const MAX_KEYS_PER_REQUEST: usize = 100;

/// Internal representation of a batch get item request, split into chunks.
#[derive(Clone, Debug, Default, PartialEq)]
struct BatchGetItemInput {
    chunks: Vec<types::KeysAndAttributes>,
    return_consumed_capacity: Option<types::ReturnConsumedCapacity>,
    table_name: String,
}

/// Batch get item operation over one model's table.
///
/// Keys are sent in chunks of [`MAX_KEYS_PER_REQUEST`]; keys the store leaves
/// unprocessed are retried following `backoff`, and whatever is still left
/// afterwards is reported in the output's `unprocessed_keys`.
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
/// let batch_get = read::batch_get_item::BatchGetItem {
///     keys: vec![
///         Item::from([("id".to_string(), Value::from("1"))]),
///         Item::from([("id".to_string(), Value::from("2"))]),
///     ],
///     ..Default::default()
/// };
/// batch_get.send(client, &model, &Marshaller::default()).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchGetItem {
    /// Objects holding at least the key properties of each item.
    pub keys: Vec<Item>,
    /// Consistency and projection, shared by every key.
    pub single_read_args: read::common::SingleReadArgs,
    /// Whether to return the consumed capacity information.
    pub return_consumed_capacity: Option<types::ReturnConsumedCapacity>,
    /// Retry policy for unprocessed keys.
    pub backoff: backoff::BackoffConfig,
}

impl BatchGetItem {
    fn into_input(
        self,
        model: &ModelMetadata,
        marshaller: &Marshaller,
    ) -> Result<BatchGetItemInput> {
        let single_read_operation = self.single_read_args.into_input(model, marshaller)?;
        let mut keys: Vec<AttributeMap> = Vec::with_capacity(self.keys.len());
        for key in &self.keys {
            let key = marshaller.to_key(key, model)?;
            // the store rejects a request naming the same key twice
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        let mut chunks = Vec::with_capacity(keys.len().div_ceil(MAX_KEYS_PER_REQUEST));
        for chunk in keys.chunks(MAX_KEYS_PER_REQUEST) {
            let keys_and_attributes = types::KeysAndAttributes::builder()
                .set_consistent_read(single_read_operation.consistent_read)
                .set_expression_attribute_names(
                    single_read_operation.expression_attribute_names.clone(),
                )
                .set_keys(Some(chunk.to_vec()))
                .set_projection_expression(single_read_operation.projection_expression.clone())
                .build()?;
            chunks.push(keys_and_attributes);
        }
        Ok(BatchGetItemInput {
            chunks,
            return_consumed_capacity: self.return_consumed_capacity,
            table_name: single_read_operation.table_name,
        })
    }

    /// Execute the batch get item operation.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_mapper.batch_get_item", skip_all, fields(model = %model.name), err)
    )]
    pub async fn send(
        self,
        client: &Client,
        model: &ModelMetadata,
        marshaller: &Marshaller,
    ) -> Result<
        operation::batch_get_item::BatchGetItemOutput,
        error::SdkError<operation::batch_get_item::BatchGetItemError>,
    > {
        let policy = self.backoff;
        let batch_get_item = self
            .into_input(model, marshaller)
            .map_err(error::BuildError::other)?;
        let table_name = batch_get_item.table_name;
        let mut responses = Vec::new();
        let mut capacities = Vec::new();
        let mut unprocessed: Option<types::KeysAndAttributes> = None;
        for mut request in batch_get_item.chunks {
            let mut delays = policy.delays();
            loop {
                let output = client
                    .batch_get_item()
                    .request_items(table_name.clone(), request)
                    .set_return_consumed_capacity(batch_get_item.return_consumed_capacity.clone())
                    .send()
                    .await?;
                if let Some(items) = output
                    .responses
                    .and_then(|mut responses| responses.remove(&table_name))
                {
                    responses.extend(items);
                }
                capacities.extend(output.consumed_capacity.unwrap_or_default());
                let Some(remaining) = output
                    .unprocessed_keys
                    .and_then(|mut keys| keys.remove(&table_name))
                    .filter(|remaining| !remaining.keys.is_empty())
                else {
                    break;
                };
                #[cfg(feature = "tracing")]
                tracing::debug!(table = %table_name, keys = remaining.keys.len(), "unprocessed keys left");
                if !backoff::wait(&mut delays).await {
                    match unprocessed.as_mut() {
                        Some(unprocessed) => unprocessed.keys.extend(remaining.keys),
                        None => unprocessed = Some(remaining),
                    }
                    break;
                }
                request = remaining;
            }
        }
        let output = operation::batch_get_item::BatchGetItemOutput::builder()
            .set_responses(Some(collections::HashMap::from([(
                table_name.clone(),
                responses,
            )])))
            .set_unprocessed_keys(
                unprocessed.map(|keys| collections::HashMap::from([(table_name, keys)])),
            )
            .set_consumed_capacity(read::common::aggregate_capacity(capacities).map(|c| vec![c]))
            .build();
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::Error, metadata::PropertyMetadata, value::Value};

    use rstest::rstest;

    fn model() -> ModelMetadata {
        ModelMetadata::builder("Order")
            .table_name("orders")
            .property(PropertyMetadata::new("customer").partition_key())
            .property(PropertyMetadata::new("number").name_db("order_number").sort_key())
            .build()
            .unwrap()
    }

    fn key(customer: &str, number: i64) -> Item {
        Item::from([
            ("customer".to_string(), Value::from(customer)),
            ("number".to_string(), Value::from(number)),
        ])
    }

    fn attribute_key(customer: &str, number: i64) -> AttributeMap {
        AttributeMap::from([
            ("customer".to_string(), types::AttributeValue::S(customer.to_string())),
            ("order_number".to_string(), types::AttributeValue::N(number.to_string())),
        ])
    }

    #[rstest]
    #[case::deduplicated(
        BatchGetItem {
            keys: vec![key("a", 1), key("a", 2), key("a", 1)],
            ..Default::default()
        },
        BatchGetItemInput {
            chunks: vec![
                types::KeysAndAttributes::builder()
                    .set_keys(Some(vec![attribute_key("a", 1), attribute_key("a", 2)]))
                    .build()
                    .unwrap(),
            ],
            table_name: "orders".to_string(),
            ..Default::default()
        }
    )]
    #[case::projection(
        BatchGetItem {
            keys: vec![key("b", 7)],
            single_read_args: read::common::SingleReadArgs {
                consistent_read: Some(true),
                projection: Some(vec!["number".to_string()]),
            },
            return_consumed_capacity: Some(types::ReturnConsumedCapacity::Total),
            ..Default::default()
        },
        BatchGetItemInput {
            chunks: vec![
                types::KeysAndAttributes::builder()
                    .set_consistent_read(Some(true))
                    .set_expression_attribute_names(Some(collections::HashMap::from([(
                        "#order_number".to_string(),
                        "order_number".to_string(),
                    )])))
                    .set_keys(Some(vec![attribute_key("b", 7)]))
                    .set_projection_expression(Some("#order_number".to_string()))
                    .build()
                    .unwrap(),
            ],
            return_consumed_capacity: Some(types::ReturnConsumedCapacity::Total),
            table_name: "orders".to_string(),
        }
    )]
    fn test_batch_get_item(#[case] args: BatchGetItem, #[case] expected: BatchGetItemInput) {
        let actual = args.into_input(&model(), &Marshaller::default()).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_batch_get_item_chunks() {
        let args = BatchGetItem {
            keys: (0..250).map(|number| key("a", number)).collect(),
            ..Default::default()
        };
        let actual = args.into_input(&model(), &Marshaller::default()).unwrap();
        let sizes: Vec<usize> = actual.chunks.iter().map(|chunk| chunk.keys.len()).collect();
        assert_eq!(sizes, vec![100, 100, 50]);
        assert_eq!(actual.chunks[2].keys[0], attribute_key("a", 200));
    }

    #[test]
    fn test_batch_get_item_missing_key() {
        let args = BatchGetItem {
            keys: vec![key("a", 1), Item::from([("number".to_string(), Value::from(1))])],
            ..Default::default()
        };
        let actual = args.into_input(&model(), &Marshaller::default());
        assert!(matches!(actual, Err(Error::MissingKeyValue { name }) if name == "customer"));
    }
}
