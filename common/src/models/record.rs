//! Generic record CRUD models.
//!
//! Requests carry column/value maps as JSON objects; the catalog service
//! validates the identifiers and assembles the statements.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for inserting a record into a table.
#[derive(Debug, Deserialize, ToSchema)]
pub struct InsertRecordRequest {
    /// Column/value map. Null and empty-string values are skipped so the
    /// column defaults apply.
    pub values: serde_json::Value,
}

/// Request body for updating a record addressed by primary key.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRecordRequest {
    /// Column/value map. The primary key column and empty values are skipped.
    pub values: serde_json::Value,
}

/// Request body for updating records matching a condition.
#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkUpdateRequest {
    /// Column/value map to apply.
    pub set: serde_json::Value,
    /// Equality conditions, ANDed together. Must not be empty.
    #[serde(rename = "where")]
    pub conditions: serde_json::Value,
}

/// Request body for deleting records matching a condition.
#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkDeleteRequest {
    /// Equality conditions, ANDed together. Must not be empty.
    #[serde(rename = "where")]
    pub conditions: serde_json::Value,
}

/// Rows touched by a write operation.
#[derive(Debug, Serialize, ToSchema)]
pub struct RecordSet {
    /// Affected rows as JSON objects (from RETURNING *).
    pub rows: Vec<serde_json::Value>,
    /// Number of affected rows.
    pub affected: u64,
}
