//! SQL query models.
//!
//! Contains models for ad-hoc SQL query execution.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for executing an ad-hoc SQL statement.
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct QueryRequest {
    /// SQL statement to execute.
    #[validate(length(min = 1, message = "SQL statement is required"))]
    pub sql: String,

    /// Maximum number of rows to return (default: 1000).
    #[serde(default = "default_limit")]
    pub limit: Option<u32>,
}

fn default_limit() -> Option<u32> {
    Some(1000)
}

/// Result of a SQL query execution.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QueryResult {
    /// Column information.
    pub columns: Vec<ColumnInfo>,

    /// Row data (each row is a vector of JSON values).
    pub rows: Vec<Vec<serde_json::Value>>,

    /// Number of rows returned.
    #[serde(default)]
    pub row_count: usize,

    /// Number of rows affected (for INSERT/UPDATE/DELETE).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affected_rows: Option<u64>,

    /// Query execution time in milliseconds.
    #[serde(default)]
    pub execution_time_ms: u64,
}

/// Column information in query result.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,

    /// Column data type.
    pub data_type: String,

    /// Whether the column is nullable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
}

impl QueryResult {
    /// Creates a query result with affected rows count (for non-SELECT queries).
    pub fn affected(affected: u64, execution_time_ms: u64) -> Self {
        Self {
            columns: vec![],
            rows: vec![],
            row_count: 0,
            affected_rows: Some(affected),
            execution_time_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_result_keeps_column_info() {
        let result = QueryResult {
            columns: vec![ColumnInfo {
                name: "reader_id".into(),
                data_type: "INT4".into(),
                nullable: Some(false),
            }],
            rows: vec![],
            row_count: 0,
            affected_rows: None,
            execution_time_ms: 2,
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["row_count"], 0);
        assert_eq!(json["columns"][0]["name"], "reader_id");
        assert!(json.get("affected_rows").is_none());
    }

    #[test]
    fn test_affected_result_has_no_columns() {
        let result = QueryResult::affected(5, 3);
        assert_eq!(result.affected_rows, Some(5));
        assert!(result.columns.is_empty());
    }
}
