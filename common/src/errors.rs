//! Unified application error type.
//!
//! Every service handler returns `AppResult<T>`; the `IntoResponse` impl
//! turns an `AppError` into the unified `ApiResponse` error JSON with an
//! appropriate HTTP status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::response::ApiResponse;

/// Result alias used across all services.
pub type AppResult<T> = Result<T, AppError>;

/// Application error variants.
#[derive(Debug, Error)]
pub enum AppError {
    /// Request validation failed.
    #[error("validation error: {0}")]
    Validation(String),

    /// A table or column name failed identifier validation.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// The requested table does not exist in the public schema.
    #[error("table not found: {0}")]
    TableNotFound(String),

    /// No row matched the requested key.
    #[error("record not found: {0}")]
    RecordNotFound(String),

    /// Ad-hoc SQL contained a forbidden statement.
    #[error("unsafe SQL: {0}")]
    UnsafeSql(String),

    /// Delete/update rejected because dependent rows reference the target.
    #[error("dependent rows exist: {0}")]
    DependentRows(String),

    /// Could not connect to the database.
    #[error("database connection error: {0}")]
    DatabaseConnection(String),

    /// A database query failed.
    #[error("database query error: {0}")]
    DatabaseQuery(String),

    /// The requested backup file does not exist.
    #[error("backup not found: {0}")]
    BackupNotFound(String),

    /// The requested archive does not exist.
    #[error("archive not found: {0}")]
    ArchiveNotFound(String),

    /// A required external utility is not installed.
    #[error("required tool not installed: {0}")]
    ToolMissing(String),

    /// An external utility exited with an error.
    #[error("external tool failed: {0}")]
    ToolFailed(String),

    /// Filesystem operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A downstream service could not be reached.
    #[error("external service error: {0}")]
    ExternalService(String),

    /// Unclassified internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable error code for client handling.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::InvalidIdentifier(_) => "INVALID_IDENTIFIER",
            AppError::TableNotFound(_) => "TABLE_NOT_FOUND",
            AppError::RecordNotFound(_) => "RECORD_NOT_FOUND",
            AppError::UnsafeSql(_) => "UNSAFE_SQL",
            AppError::DependentRows(_) => "DEPENDENT_ROWS",
            AppError::DatabaseConnection(_) => "DATABASE_CONNECTION_ERROR",
            AppError::DatabaseQuery(_) => "DATABASE_QUERY_ERROR",
            AppError::BackupNotFound(_) => "BACKUP_NOT_FOUND",
            AppError::ArchiveNotFound(_) => "ARCHIVE_NOT_FOUND",
            AppError::ToolMissing(_) => "TOOL_MISSING",
            AppError::ToolFailed(_) => "TOOL_FAILED",
            AppError::Io(_) => "IO_ERROR",
            AppError::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP status code this error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::InvalidIdentifier(_)
            | AppError::UnsafeSql(_) => StatusCode::BAD_REQUEST,
            AppError::TableNotFound(_)
            | AppError::RecordNotFound(_)
            | AppError::BackupNotFound(_)
            | AppError::ArchiveNotFound(_) => StatusCode::NOT_FOUND,
            AppError::DependentRows(_) => StatusCode::CONFLICT,
            AppError::ExternalService(_) => StatusCode::BAD_GATEWAY,
            AppError::DatabaseConnection(_)
            | AppError::DatabaseQuery(_)
            | AppError::ToolMissing(_)
            | AppError::ToolFailed(_)
            | AppError::Io(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "请求处理失败");
        } else {
            tracing::warn!(code = self.code(), error = %self, "请求被拒绝");
        }
        let body = ApiResponse::err(self.code(), self.to_string());
        (status, Json(body)).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => AppError::RecordNotFound("no matching row".into()),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                AppError::DatabaseConnection(e.to_string())
            }
            sqlx::Error::Database(db) => match db.code().as_deref() {
                // foreign_key_violation: dependent rows reference the target
                Some("23503") => AppError::DependentRows(db.message().to_string()),
                // undefined_table
                Some("42P01") => AppError::TableNotFound(db.message().to_string()),
                _ => AppError::DatabaseQuery(db.message().to_string()),
            },
            _ => AppError::DatabaseQuery(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::TableNotFound("books".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::DependentRows("books".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::ToolFailed("pg_dump".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(AppError::UnsafeSql("DROP".into()).code(), "UNSAFE_SQL");
        assert_eq!(
            AppError::BackupNotFound("a.backup".into()).code(),
            "BACKUP_NOT_FOUND"
        );
    }
}
