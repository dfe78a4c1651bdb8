//! Schema introspection models.
//!
//! Shapes mirror what the PostgreSQL information_schema catalog returns.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::response::Pagination;

/// Summary of a user table for the dashboard listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TableSummary {
    /// Table name.
    pub name: String,
    /// Total number of rows.
    pub row_count: u64,
    /// Column names in ordinal order.
    pub columns: Vec<String>,
}

/// Column metadata for a table.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TableColumn {
    /// Column name.
    pub name: String,
    /// Catalog data type (e.g., "integer", "character varying").
    pub data_type: String,
    /// Whether the column accepts NULL.
    pub nullable: bool,
    /// Default expression, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

/// One page of table rows.
#[derive(Debug, Serialize, ToSchema)]
pub struct TableData {
    /// Column names in ordinal order.
    pub columns: Vec<String>,
    /// Column the page is ordered by.
    pub sort_column: String,
    /// Rows as JSON objects keyed by column name.
    pub rows: Vec<serde_json::Value>,
    /// Pagination information.
    pub pagination: Pagination,
}
