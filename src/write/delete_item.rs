use crate::{
    attribute::AttributeMap, error::Result, mapper::Marshaller, metadata::ModelMetadata,
    value::Item, write,
};

use aws_sdk_dynamodb::{Client, error, operation};
use std::collections;

/// Internal representation of a delete item request.
#[derive(Debug, PartialEq)]
struct DeleteItemInput {
    keys: AttributeMap,
    write_operation: write::common::WriteInput,
}

/// Delete item operation.
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
/// let delete_item = write::delete_item::DeleteItem {
///     key: Item::from([("id".to_string(), Value::from("1"))]),
///     ..Default::default()
/// };
/// delete_item.send(client, &model, &Marshaller::default()).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeleteItem {
    /// Object holding at least the key properties of the item.
    pub key: Item,
    /// Condition and return values.
    pub write_args: write::common::WriteArgs,
}

impl DeleteItem {
    fn into_input(self, model: &ModelMetadata, marshaller: &Marshaller) -> Result<DeleteItemInput> {
        let keys = marshaller.to_key(&self.key, model)?;
        let write_operation =
            self.write_args
                .into_input(model, marshaller, &collections::HashSet::new())?;
        Ok(DeleteItemInput {
            keys,
            write_operation,
        })
    }

    /// Execute the delete item operation.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_mapper.delete_item", skip_all, fields(model = %model.name), err)
    )]
    pub async fn send(
        self,
        client: &Client,
        model: &ModelMetadata,
        marshaller: &Marshaller,
    ) -> Result<
        operation::delete_item::DeleteItemOutput,
        error::SdkError<operation::delete_item::DeleteItemError>,
    > {
        let delete_item = self
            .into_input(model, marshaller)
            .map_err(error::BuildError::other)?;
        let builder = client.delete_item().set_key(Some(delete_item.keys));
        crate::apply_write_operation!(builder, delete_item.write_operation)
            .send()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::Error,
        expression,
        metadata::{PropertyMetadata, PropertyType},
        value::Value,
    };

    use aws_sdk_dynamodb::types;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    fn model() -> ModelMetadata {
        ModelMetadata::builder("Reading")
            .table_name("readings")
            .property(PropertyMetadata::new("sensor").partition_key())
            .property(
                PropertyMetadata::new("taken_at")
                    .property_type(PropertyType::Date)
                    .sort_key(),
            )
            .property(PropertyMetadata::new("locked"))
            .build()
            .unwrap()
    }

    fn key() -> Item {
        Item::from([
            ("sensor".to_string(), Value::from("s1")),
            (
                "taken_at".to_string(),
                Value::from(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()),
            ),
            ("locked".to_string(), Value::from(false)),
        ])
    }

    fn keys() -> AttributeMap {
        AttributeMap::from([
            ("sensor".to_string(), types::AttributeValue::S("s1".to_string())),
            (
                "taken_at".to_string(),
                types::AttributeValue::S("2024-01-02T03:04:05Z".to_string()),
            ),
        ])
    }

    #[rstest]
    #[case::keys_only(
        DeleteItem {
            key: key(),
            ..Default::default()
        },
        DeleteItemInput {
            keys: keys(),
            write_operation: write::common::WriteInput {
                table_name: "readings".to_string(),
                ..Default::default()
            },
        }
    )]
    #[case::condition(
        DeleteItem {
            key: key(),
            write_args: write::common::WriteArgs {
                condition: Some(expression::attribute("locked").equals(false)),
                return_values: Some(types::ReturnValue::AllOld),
                ..Default::default()
            },
        },
        DeleteItemInput {
            keys: keys(),
            write_operation: write::common::WriteInput {
                condition_expression: Some("#locked = :locked".to_string()),
                expression_attribute_names: Some(collections::HashMap::from([(
                    "#locked".to_string(),
                    "locked".to_string(),
                )])),
                expression_attribute_values: Some(collections::HashMap::from([(
                    ":locked".to_string(),
                    types::AttributeValue::Bool(false),
                )])),
                return_values: Some(types::ReturnValue::AllOld),
                table_name: "readings".to_string(),
                ..Default::default()
            },
        }
    )]
    fn test_delete_item(#[case] args: DeleteItem, #[case] expected: DeleteItemInput) {
        let actual = args.into_input(&model(), &Marshaller::default()).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_delete_item_null_key() {
        let args = DeleteItem {
            key: Item::from([
                ("sensor".to_string(), Value::Null),
                ("taken_at".to_string(), Value::from("2024")),
            ]),
            ..Default::default()
        };
        let actual = args.into_input(&model(), &Marshaller::default());
        assert!(matches!(actual, Err(Error::MissingKeyValue { name }) if name == "sensor"));
    }
}
