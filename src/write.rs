//! Write requests driven by model metadata.
//!
//! Items and keys go through the [`Marshaller`](crate::mapper::Marshaller);
//! conditions and update definitions are rendered by [`crate::expression`].

/// Batch write item operation, retrying unprocessed requests.
pub mod batch_write_item;

/// Arguments shared by write operations.
pub mod common;

/// Delete item operation for removing items from tables.
pub mod delete_item;

/// Put item operation for creating or replacing items.
pub mod put_item;

/// Update item operation for modifying existing items.
pub mod update_item;
