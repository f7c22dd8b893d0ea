use crate::{error::Result, mapper::Marshaller, metadata::ModelMetadata, read};

use aws_sdk_dynamodb::{Client, error, operation, types};
use std::collections;

/// Internal representation of a scan request.
#[derive(Clone, Debug, Default, PartialEq)]
struct ScanInput {
    multiple_read_operation: read::common::MultipleReadInput,
    return_consumed_capacity: Option<types::ReturnConsumedCapacity>,
    segment: Option<i32>,
    total_segments: Option<i32>,
}

/// Scan operation.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_mapper::{
///     expression,
///     mapper::Marshaller,
///     metadata::{ModelMetadata, PropertyMetadata},
///     read,
/// };
///
/// # async fn example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
/// let model = ModelMetadata::builder("User")
///     .table_name("users")
///     .property(PropertyMetadata::new("id").partition_key())
///     .build()?;
/// let scan = read::scan::Scan {
///     multiple_read_args: read::common::MultipleReadArgs {
///         filter: Some(expression::attribute("age").greater_than_or_equal(18)),
///         ..Default::default()
///     },
///     ..Default::default()
/// };
/// scan.send(client, &model, &Marshaller::default()).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scan {
    /// Filter, index, paging and projection.
    pub multiple_read_args: read::common::MultipleReadArgs,
    /// Whether to return the consumed capacity information.
    pub return_consumed_capacity: Option<types::ReturnConsumedCapacity>,
    /// The segment number for parallel scans (0-indexed).
    pub segment: Option<i32>,
    /// The total number of segments for parallel scans.
    pub total_segments: Option<i32>,
}

impl Scan {
    fn into_input(self, model: &ModelMetadata, marshaller: &Marshaller) -> Result<ScanInput> {
        let multiple_read_operation = self.multiple_read_args.into_input(
            model,
            marshaller,
            &collections::HashSet::new(),
        )?;
        Ok(ScanInput {
            multiple_read_operation,
            return_consumed_capacity: self.return_consumed_capacity,
            segment: self.segment,
            total_segments: self.total_segments,
        })
    }

    /// Execute the scan operation, following every page.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_mapper.scan", skip_all, fields(model = %model.name), err)
    )]
    pub async fn send(
        self,
        client: &Client,
        model: &ModelMetadata,
        marshaller: &Marshaller,
    ) -> Result<operation::scan::ScanOutput, error::SdkError<operation::scan::ScanError>> {
        let scan = self
            .into_input(model, marshaller)
            .map_err(error::BuildError::other)?;
        let builder = client
            .scan()
            .set_return_consumed_capacity(scan.return_consumed_capacity)
            .set_segment(scan.segment)
            .set_total_segments(scan.total_segments);
        let mut paginator =
            crate::apply_multiple_read_operation!(builder, scan.multiple_read_operation)
                .into_paginator()
                .send();
        crate::get_paginated_output!(paginator, operation::scan::ScanOutput)
    }
}
