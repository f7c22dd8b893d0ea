use crate::{
    attribute::AttributeMap,
    error::{Error, Result},
    expression,
    mapper::Marshaller,
    metadata::ModelMetadata,
    value::Item,
    write,
};

use aws_sdk_dynamodb::{Client, error, operation};
use std::collections;

/// Internal representation of a put item request.
#[derive(Debug, PartialEq)]
struct PutItemInput {
    item: AttributeMap,
    write_operation: write::common::WriteInput,
}

/// Put item operation.
///
/// The item goes through the model's mappers, so auto-generated partition keys
/// are filled in and transient properties are left out.
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
///     .property(PropertyMetadata::new("name"))
///     .build()?;
/// let put_item = write::put_item::PutItem {
///     item: Item::from([
///         ("id".to_string(), Value::from("1")),
///         ("name".to_string(), Value::from("John")),
///     ]),
///     if_not_exists: true,
///     ..Default::default()
/// };
/// put_item.send(client, &model, &Marshaller::default()).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PutItem {
    /// The object to store.
    pub item: Item,
    /// Only write when no item with the same partition key exists.
    pub if_not_exists: bool,
    /// Condition and return values.
    pub write_args: write::common::WriteArgs,
}

impl PutItem {
    fn into_input(self, model: &ModelMetadata, marshaller: &Marshaller) -> Result<PutItemInput> {
        let item = marshaller.to_db(&self.item, Some(model))?;
        let mut write_args = self.write_args;
        if self.if_not_exists {
            let partition_key = model.partition_key().ok_or_else(|| Error::InvalidMetadata {
                model: model.name.clone(),
                message: "no partition key declared".to_string(),
            })?;
            let guard = expression::attribute(partition_key.name.clone()).attribute_not_exists();
            write_args.condition = Some(match write_args.condition {
                Some(condition) => guard.and(condition),
                None => guard,
            });
        }
        let write_operation =
            write_args.into_input(model, marshaller, &collections::HashSet::new())?;
        Ok(PutItemInput {
            item,
            write_operation,
        })
    }

    /// Execute the put item operation.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_mapper.put_item", skip_all, fields(model = %model.name), err)
    )]
    pub async fn send(
        self,
        client: &Client,
        model: &ModelMetadata,
        marshaller: &Marshaller,
    ) -> Result<
        operation::put_item::PutItemOutput,
        error::SdkError<operation::put_item::PutItemError>,
    > {
        let put_item = self
            .into_input(model, marshaller)
            .map_err(error::BuildError::other)?;
        let builder = client.put_item().set_item(Some(put_item.item));
        crate::apply_write_operation!(builder, put_item.write_operation)
            .send()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metadata::{PropertyMetadata, PropertyType},
        value::Value,
    };

    use aws_sdk_dynamodb::types;
    use rstest::rstest;

    fn model() -> ModelMetadata {
        ModelMetadata::builder("User")
            .table_name("users")
            .property(PropertyMetadata::new("id").name_db("user_id").partition_key())
            .property(PropertyMetadata::new("name"))
            .property(PropertyMetadata::new("tags").property_type(PropertyType::Set))
            .property(PropertyMetadata::new("session").transient())
            .build()
            .unwrap()
    }

    fn item() -> Item {
        Item::from([
            ("id".to_string(), Value::from("1")),
            ("name".to_string(), Value::from("John")),
            ("tags".to_string(), Value::Set(Vec::new())),
            ("session".to_string(), Value::from("xyz")),
        ])
    }

    fn attributes() -> AttributeMap {
        AttributeMap::from([
            ("user_id".to_string(), types::AttributeValue::S("1".to_string())),
            ("name".to_string(), types::AttributeValue::S("John".to_string())),
        ])
    }

    #[rstest]
    #[case::plain(
        PutItem {
            item: item(),
            ..Default::default()
        },
        PutItemInput {
            item: attributes(),
            write_operation: write::common::WriteInput {
                table_name: "users".to_string(),
                ..Default::default()
            },
        }
    )]
    #[case::if_not_exists(
        PutItem {
            item: item(),
            if_not_exists: true,
            ..Default::default()
        },
        PutItemInput {
            item: attributes(),
            write_operation: write::common::WriteInput {
                condition_expression: Some("attribute_not_exists (#user_id)".to_string()),
                expression_attribute_names: Some(collections::HashMap::from([(
                    "#user_id".to_string(),
                    "user_id".to_string(),
                )])),
                table_name: "users".to_string(),
                ..Default::default()
            },
        }
    )]
    #[case::if_not_exists_and_condition(
        PutItem {
            item: item(),
            if_not_exists: true,
            write_args: write::common::WriteArgs {
                condition: Some(expression::attribute("name").not_equals("root")),
                return_values: Some(types::ReturnValue::AllOld),
                ..Default::default()
            },
        },
        PutItemInput {
            item: attributes(),
            write_operation: write::common::WriteInput {
                condition_expression: Some(
                    "(attribute_not_exists (#user_id) AND #name <> :name)".to_string()
                ),
                expression_attribute_names: Some(collections::HashMap::from([
                    ("#user_id".to_string(), "user_id".to_string()),
                    ("#name".to_string(), "name".to_string()),
                ])),
                expression_attribute_values: Some(collections::HashMap::from([(
                    ":name".to_string(),
                    types::AttributeValue::S("root".to_string()),
                )])),
                return_values: Some(types::ReturnValue::AllOld),
                table_name: "users".to_string(),
                ..Default::default()
            },
        }
    )]
    fn test_put_item(#[case] args: PutItem, #[case] expected: PutItemInput) {
        let actual = args.into_input(&model(), &Marshaller::default()).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_put_item_generates_key() {
        let model = ModelMetadata::builder("Event")
            .table_name("events")
            .property(PropertyMetadata::new("id").partition_key().auto_generate())
            .build()
            .unwrap();
        let args = PutItem {
            item: Item::from([("id".to_string(), Value::from(""))]),
            ..Default::default()
        };
        let actual = args.into_input(&model, &Marshaller::default()).unwrap();
        match &actual.item["id"] {
            types::AttributeValue::S(identifier) => assert_eq!(identifier.len(), 36),
            other => panic!("unexpected attribute {other:?}"),
        }
    }
}
