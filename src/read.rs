//! Read requests driven by model metadata.
//!
//! Keys are objects converted through the [`Marshaller`](crate::mapper::Marshaller),
//! filters are [`Condition`](crate::expression::Condition) trees and projections
//! are attribute paths resolved against the model's stored names.

/// Batch get item operation, retrying unprocessed keys.
pub mod batch_get_item;

/// Arguments shared by read operations.
pub mod common;

/// Get item operation for retrieving a single item by primary key.
pub mod get_item;

/// Query operation over the table or one of its secondary indexes.
pub mod query;

/// Scan operation for retrieving all items from a table.
pub mod scan;
