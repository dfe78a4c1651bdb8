//! Backup, restore and archive models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for creating a database backup.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BackupRequest {
    /// Backup file name. Defaults to a timestamped name; the `.backup`
    /// extension is appended when missing.
    pub backup_name: Option<String>,
    /// Restrict the dump to these tables (full database when omitted).
    pub tables: Option<Vec<String>>,
}

/// Result of a successful backup.
#[derive(Debug, Serialize, ToSchema)]
pub struct BackupCreated {
    /// Path of the written backup file.
    pub backup_path: String,
    /// Size of the backup file in bytes.
    pub file_size: u64,
    /// Tables covered by the backup (empty means the full database).
    pub tables: Vec<String>,
    /// Creation timestamp.
    pub timestamp: DateTime<Utc>,
}

/// A backup file on disk.
#[derive(Debug, Serialize, ToSchema)]
pub struct BackupFile {
    /// File name.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time.
    pub modified_at: DateTime<Utc>,
}

/// Result of a restore run.
#[derive(Debug, Serialize, ToSchema)]
pub struct RestoreReport {
    /// Backup file the database was restored from.
    pub backup_path: String,
    /// Non-fatal warnings emitted by pg_restore.
    pub warnings: Vec<String>,
    /// Completion timestamp.
    pub timestamp: DateTime<Utc>,
}

/// Request body for archiving tables.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ArchiveRequest {
    /// Tables to archive and purge.
    #[validate(length(min = 1, message = "At least one table is required"))]
    pub tables: Vec<String>,
    /// Reason recorded in the archive report.
    #[validate(length(min = 1, message = "Reason is required"))]
    pub reason: String,
}

/// Per-table outcome inside an archive report.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ArchiveTableResult {
    /// Table name.
    pub name: String,
    /// Rows written to the archive (absent on failure).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows_archived: Option<u64>,
    /// Path of the JSON snapshot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_path: Option<String>,
    /// Path of the pg_dump backup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_path: Option<String>,
    /// Error message when archiving this table failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Archive run report, also persisted as archive_report.json.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ArchiveReport {
    /// Archive directory timestamp (YYYYMMDD_HHMMSS).
    pub timestamp: String,
    /// Reason supplied by the operator.
    pub reason: String,
    /// Per-table outcomes.
    pub tables: Vec<ArchiveTableResult>,
    /// Total rows archived across all tables.
    pub total_rows_archived: u64,
    /// Path the report was written to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_path: Option<String>,
}

/// An archive directory on disk.
#[derive(Debug, Serialize, ToSchema)]
pub struct ArchiveEntry {
    /// Directory name (YYYYMMDD_HHMMSS).
    pub name: String,
    /// Creation time parsed from the directory name, if well-formed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Directory path.
    pub path: String,
}
