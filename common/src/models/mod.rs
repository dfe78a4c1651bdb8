//! Shared data models for all services.

pub mod admin;
pub mod query;
pub mod record;
pub mod schema;

// Re-export commonly used types
pub use admin::{
    ArchiveEntry, ArchiveReport, ArchiveRequest, ArchiveTableResult, BackupCreated, BackupFile,
    BackupRequest, RestoreReport,
};
pub use query::{ColumnInfo, QueryRequest, QueryResult};
pub use record::{BulkDeleteRequest, BulkUpdateRequest, InsertRecordRequest, RecordSet, UpdateRecordRequest};
pub use schema::{TableColumn, TableData, TableSummary};
