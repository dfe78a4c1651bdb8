//! 备份、恢复与归档服务模块

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use sqlx::PgPool;
use validator::Validate;

use common::config::AppConfig;
use common::errors::{AppError, AppResult};
use common::models::admin::{
    ArchiveEntry, ArchiveReport, ArchiveRequest, ArchiveTableResult, BackupCreated, BackupFile,
    BackupRequest, RestoreReport,
};
use common::utils::{rows, SqlBuilder};

use crate::tools::PgTools;

/// 列表端点最多返回的条目数
const LIST_LIMIT: usize = 10;

/// 归档目录时间戳格式
const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// 备份与归档编排服务
pub struct AdminService {
    config: AppConfig,
    pool: PgPool,
    tools: PgTools,
}

impl AdminService {
    /// 创建新的管理服务实例
    pub fn new(config: AppConfig, pool: PgPool) -> Self {
        let tools = PgTools::new(config.database.clone());
        Self { config, pool, tools }
    }

    /// 创建数据库备份（可限定表）
    pub async fn create_backup(&self, req: BackupRequest) -> AppResult<BackupCreated> {
        tokio::fs::create_dir_all(&self.config.backup_dir).await?;

        let name = match req.backup_name {
            Some(name) => normalize_backup_name(name)?,
            None => default_backup_name(&self.config.database.name, Local::now().naive_local()),
        };
        let path = self.config.backup_dir.join(&name);
        let tables = req.tables.unwrap_or_default();
        for table in &tables {
            SqlBuilder::validate_identifier(table)?;
        }

        self.tools.dump(&path, &tables).await?;

        let file_size = tokio::fs::metadata(&path).await?.len();
        tracing::info!(backup = %path.display(), size = file_size, "备份已创建");

        Ok(BackupCreated {
            backup_path: path.display().to_string(),
            file_size,
            tables,
            timestamp: Utc::now(),
        })
    }

    /// 列出备份文件（最新在前，最多 10 个）
    pub async fn list_backups(&self) -> AppResult<Vec<BackupFile>> {
        let mut backups = Vec::new();

        if self.config.backup_dir.exists() {
            let mut entries = tokio::fs::read_dir(&self.config.backup_dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("backup") {
                    continue;
                }
                let meta = entry.metadata().await?;
                backups.push(BackupFile {
                    name: entry.file_name().to_string_lossy().into_owned(),
                    size: meta.len(),
                    modified_at: meta
                        .modified()
                        .map(DateTime::<Utc>::from)
                        .unwrap_or_else(|_| Utc::now()),
                });
            }
        }

        backups.sort_by(|a, b| b.modified_at.cmp(&a.modified_at));
        backups.truncate(LIST_LIMIT);
        Ok(backups)
    }

    /// 删除一个备份文件
    pub async fn delete_backup(&self, name: &str) -> AppResult<()> {
        let path = self.backup_path(name)?;
        if !path.is_file() {
            return Err(AppError::BackupNotFound(name.to_string()));
        }
        tokio::fs::remove_file(&path).await?;
        tracing::info!(backup = %path.display(), "备份已删除");
        Ok(())
    }

    /// 从备份恢复数据库（先清空 public 模式）
    pub async fn restore_backup(&self, name: &str) -> AppResult<RestoreReport> {
        let path = self.backup_path(name)?;
        if !path.is_file() {
            return Err(AppError::BackupNotFound(name.to_string()));
        }

        self.tools.reset_public_schema().await?;
        let warnings = self.tools.restore(&path).await?;

        tracing::info!(backup = %path.display(), warnings = warnings.len(), "数据库已恢复");
        Ok(RestoreReport {
            backup_path: path.display().to_string(),
            warnings,
            timestamp: Utc::now(),
        })
    }

    /// 归档并清空一组表，逐表尽力而为，失败记入报告
    pub async fn archive_tables(&self, req: ArchiveRequest) -> AppResult<ArchiveReport> {
        req.validate()?;

        let timestamp = Local::now().naive_local().format(STAMP_FORMAT).to_string();
        let archive_dir = self.config.archive_dir.join(&timestamp);
        tokio::fs::create_dir_all(&archive_dir).await?;

        let mut report = ArchiveReport {
            timestamp,
            reason: req.reason,
            tables: Vec::new(),
            total_rows_archived: 0,
            report_path: None,
        };

        for table in &req.tables {
            match self.archive_one(table, &archive_dir).await {
                Ok(entry) => {
                    report.total_rows_archived += entry.rows_archived.unwrap_or(0);
                    report.tables.push(entry);
                }
                Err(e) => {
                    tracing::warn!(table = %table, error = %e, "归档表失败");
                    report.tables.push(ArchiveTableResult {
                        name: table.clone(),
                        rows_archived: None,
                        json_path: None,
                        backup_path: None,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        let report_path = archive_dir.join("archive_report.json");
        let body = serde_json::to_vec_pretty(&report)
            .map_err(|e| AppError::Internal(format!("failed to serialize report: {}", e)))?;
        tokio::fs::write(&report_path, body).await?;
        report.report_path = Some(report_path.display().to_string());

        tracing::info!(
            tables = report.tables.len(),
            rows = report.total_rows_archived,
            "归档完成"
        );
        Ok(report)
    }

    /// 归档单个表：JSON 快照、pg_dump 备份、清空表数据
    async fn archive_one(&self, table: &str, dir: &Path) -> AppResult<ArchiveTableResult> {
        SqlBuilder::validate_identifier(table)?;

        let select = format!("SELECT * FROM {}", SqlBuilder::quote_ident(table));
        let table_rows = sqlx::query(&select).fetch_all(&self.pool).await?;
        let snapshot: Vec<serde_json::Value> = table_rows.iter().map(rows::row_to_object).collect();

        let json_path = dir.join(format!("{}.json", table));
        let body = serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| AppError::Internal(format!("failed to serialize snapshot: {}", e)))?;
        tokio::fs::write(&json_path, body).await?;

        let backup_path = dir.join(format!("{}.backup", table));
        let dump_tables = [table.to_string()];
        self.tools.dump(&backup_path, &dump_tables).await?;

        let delete = format!("DELETE FROM {}", SqlBuilder::quote_ident(table));
        let purged = sqlx::query(&delete).execute(&self.pool).await?.rows_affected();

        tracing::info!(table = %table, rows = snapshot.len(), purged = purged, "表已归档");
        Ok(ArchiveTableResult {
            name: table.to_string(),
            rows_archived: Some(snapshot.len() as u64),
            json_path: Some(json_path.display().to_string()),
            backup_path: Some(backup_path.display().to_string()),
            error: None,
        })
    }

    /// 列出归档目录（最新在前，最多 10 个）
    pub async fn list_archives(&self) -> AppResult<Vec<ArchiveEntry>> {
        let mut archives = Vec::new();

        if self.config.archive_dir.exists() {
            let mut entries = tokio::fs::read_dir(&self.config.archive_dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if !path.is_dir() {
                    continue;
                }
                let name = entry.file_name().to_string_lossy().into_owned();
                archives.push(ArchiveEntry {
                    created_at: parse_archive_stamp(&name),
                    path: path.display().to_string(),
                    name,
                });
            }
        }

        archives.sort_by(|a, b| b.name.cmp(&a.name));
        archives.truncate(LIST_LIMIT);
        Ok(archives)
    }

    /// 递归删除一个归档目录
    pub async fn delete_archive(&self, name: &str) -> AppResult<()> {
        validate_file_name(name)?;
        let path = self.config.archive_dir.join(name);
        if !path.is_dir() {
            return Err(AppError::ArchiveNotFound(name.to_string()));
        }
        tokio::fs::remove_dir_all(&path).await?;
        tracing::info!(archive = %path.display(), "归档已删除");
        Ok(())
    }

    fn backup_path(&self, name: &str) -> AppResult<PathBuf> {
        validate_file_name(name)?;
        Ok(self.config.backup_dir.join(name))
    }
}

/// 校验文件名不包含路径成分
fn validate_file_name(name: &str) -> AppResult<()> {
    if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(AppError::Validation(format!("invalid file name: {}", name)));
    }
    Ok(())
}

/// 规范化备份名：校验并确保 .backup 扩展名
fn normalize_backup_name(name: String) -> AppResult<String> {
    validate_file_name(&name)?;
    if name.ends_with(".backup") {
        Ok(name)
    } else {
        Ok(format!("{}.backup", name))
    }
}

/// 默认备份名：<库名>_backup_<时间戳>.backup
fn default_backup_name(db_name: &str, now: NaiveDateTime) -> String {
    format!("{}_backup_{}.backup", db_name, now.format(STAMP_FORMAT))
}

/// 从目录名解析归档时间（格式不符时返回 None）
fn parse_archive_stamp(name: &str) -> Option<String> {
    NaiveDateTime::parse_from_str(name, STAMP_FORMAT)
        .ok()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_default_backup_name() {
        let now = NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_opt(9, 26, 53)
            .unwrap();
        assert_eq!(
            default_backup_name("library", now),
            "library_backup_20250314_092653.backup"
        );
    }

    #[test]
    fn test_normalize_backup_name_appends_extension() {
        assert_eq!(
            normalize_backup_name("weekly".into()).unwrap(),
            "weekly.backup"
        );
        assert_eq!(
            normalize_backup_name("weekly.backup".into()).unwrap(),
            "weekly.backup"
        );
    }

    #[test]
    fn test_file_name_traversal_rejected() {
        assert!(validate_file_name("../etc/passwd").is_err());
        assert!(validate_file_name("a/b.backup").is_err());
        assert!(validate_file_name("a\\b.backup").is_err());
        assert!(validate_file_name("").is_err());
        assert!(validate_file_name("weekly.backup").is_ok());
    }

    #[test]
    fn test_archive_report_shape() {
        let report = ArchiveReport {
            timestamp: "20250314_092653".into(),
            reason: "end of term cleanup".into(),
            tables: vec![
                ArchiveTableResult {
                    name: "loans".into(),
                    rows_archived: Some(42),
                    json_path: Some("archives/20250314_092653/loans.json".into()),
                    backup_path: Some("archives/20250314_092653/loans.backup".into()),
                    error: None,
                },
                ArchiveTableResult {
                    name: "readers".into(),
                    rows_archived: None,
                    json_path: None,
                    backup_path: None,
                    error: Some("dependent rows exist".into()),
                },
            ],
            total_rows_archived: 42,
            report_path: None,
        };

        let json = serde_json::to_value(&report).unwrap();
        let ok = &json["tables"][0];
        assert_eq!(ok["rows_archived"], 42);
        assert!(ok.get("error").is_none());

        let failed = &json["tables"][1];
        assert!(failed.get("rows_archived").is_none());
        assert_eq!(failed["error"], "dependent rows exist");
        assert!(json.get("report_path").is_none());
    }

    #[test]
    fn test_parse_archive_stamp() {
        assert_eq!(
            parse_archive_stamp("20250314_092653").as_deref(),
            Some("2025-03-14 09:26:53")
        );
        assert_eq!(parse_archive_stamp("not_a_stamp"), None);
    }
}
