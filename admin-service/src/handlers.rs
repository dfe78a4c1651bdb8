//! Handler模块

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::service::AdminService;
use crate::state::AppState;
use common::errors::AppError;
use common::models::admin::{
    ArchiveEntry, ArchiveReport, ArchiveRequest, BackupCreated, BackupFile, BackupRequest,
    RestoreReport,
};
use common::response::ApiResponse;

const SERVICE: &str = "admin-service";

/// 创建数据库备份
#[utoipa::path(
    post,
    path = "/api/backups",
    tag = "backups",
    request_body = BackupRequest,
    responses(
        (status = 200, description = "备份创建成功", body = ApiResponse<BackupCreated>),
        (status = 400, description = "备份名或表名无效"),
        (status = 500, description = "pg_dump 执行失败")
    )
)]
pub async fn create_backup(
    State(state): State<AppState>,
    Json(req): Json<BackupRequest>,
) -> Result<Json<ApiResponse<BackupCreated>>, AppError> {
    let service = AdminService::new(state.config.clone(), state.pool.clone());
    let data = service.create_backup(req).await?;
    Ok(Json(ApiResponse::ok_with_service(data, SERVICE)))
}

/// 列出最近的备份文件
#[utoipa::path(
    get,
    path = "/api/backups",
    tag = "backups",
    responses(
        (status = 200, description = "备份文件列表", body = ApiResponse<Vec<BackupFile>>)
    )
)]
pub async fn list_backups(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<BackupFile>>>, AppError> {
    let service = AdminService::new(state.config.clone(), state.pool.clone());
    let data = service.list_backups().await?;
    Ok(Json(ApiResponse::ok_with_service(data, SERVICE)))
}

/// 删除一个备份文件
#[utoipa::path(
    delete,
    path = "/api/backups/{name}",
    tag = "backups",
    params(
        ("name" = String, Path, description = "备份文件名")
    ),
    responses(
        (status = 200, description = "备份删除成功", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "文件名无效"),
        (status = 404, description = "备份未找到")
    )
)]
pub async fn delete_backup(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let service = AdminService::new(state.config.clone(), state.pool.clone());
    service.delete_backup(&name).await?;
    Ok(Json(ApiResponse::ok_with_service(
        serde_json::json!({ "deleted": name }),
        SERVICE,
    )))
}

/// 从备份恢复数据库
#[utoipa::path(
    post,
    path = "/api/backups/{name}/restore",
    tag = "backups",
    params(
        ("name" = String, Path, description = "备份文件名")
    ),
    responses(
        (status = 200, description = "恢复完成（可能带警告）", body = ApiResponse<RestoreReport>),
        (status = 404, description = "备份未找到"),
        (status = 500, description = "pg_restore 执行失败")
    )
)]
pub async fn restore_backup(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<RestoreReport>>, AppError> {
    let service = AdminService::new(state.config.clone(), state.pool.clone());
    let data = service.restore_backup(&name).await?;
    Ok(Json(ApiResponse::ok_with_service(data, SERVICE)))
}

/// 归档并清空一组表
#[utoipa::path(
    post,
    path = "/api/archives",
    tag = "archives",
    request_body = ArchiveRequest,
    responses(
        (status = 200, description = "归档报告（逐表结果）", body = ApiResponse<ArchiveReport>),
        (status = 400, description = "请求无效")
    )
)]
pub async fn archive_tables(
    State(state): State<AppState>,
    Json(req): Json<ArchiveRequest>,
) -> Result<Json<ApiResponse<ArchiveReport>>, AppError> {
    let service = AdminService::new(state.config.clone(), state.pool.clone());
    let data = service.archive_tables(req).await?;
    Ok(Json(ApiResponse::ok_with_service(data, SERVICE)))
}

/// 列出最近的归档
#[utoipa::path(
    get,
    path = "/api/archives",
    tag = "archives",
    responses(
        (status = 200, description = "归档列表", body = ApiResponse<Vec<ArchiveEntry>>)
    )
)]
pub async fn list_archives(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ArchiveEntry>>>, AppError> {
    let service = AdminService::new(state.config.clone(), state.pool.clone());
    let data = service.list_archives().await?;
    Ok(Json(ApiResponse::ok_with_service(data, SERVICE)))
}

/// 删除一个归档目录
#[utoipa::path(
    delete,
    path = "/api/archives/{name}",
    tag = "archives",
    params(
        ("name" = String, Path, description = "归档目录名")
    ),
    responses(
        (status = 200, description = "归档删除成功", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "目录名无效"),
        (status = 404, description = "归档未找到")
    )
)]
pub async fn delete_archive(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let service = AdminService::new(state.config.clone(), state.pool.clone());
    service.delete_archive(&name).await?;
    Ok(Json(ApiResponse::ok_with_service(
        serde_json::json!({ "deleted": name }),
        SERVICE,
    )))
}

/// 健康检查端点
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "服务运行正常", body = HealthResponse)
    )
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}
