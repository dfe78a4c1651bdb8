//! Handler模块

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use common::errors::AppError;
use common::models::query::{QueryRequest, QueryResult};
use common::models::record::{
    BulkDeleteRequest, BulkUpdateRequest, InsertRecordRequest, RecordSet, UpdateRecordRequest,
};
use common::models::schema::{TableColumn, TableData, TableSummary};
use common::response::ApiResponse;
use crate::service::{CatalogService, DEFAULT_PAGE_SIZE};
use crate::state::AppState;

const SERVICE: &str = "catalog-service";

/// 分页查询参数
#[derive(Debug, Deserialize, IntoParams)]
pub struct PageParams {
    /// 页码（从 1 开始）
    pub page: Option<u32>,
    /// 每页行数（默认 200）
    pub page_size: Option<u32>,
}

/// 列出所有用户表及其概要
#[utoipa::path(
    get,
    path = "/api/tables",
    tag = "tables",
    responses(
        (status = 200, description = "表概要列表", body = ApiResponse<Vec<TableSummary>>)
    )
)]
pub async fn list_tables(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<TableSummary>>>, AppError> {
    let service = CatalogService::new(state.pool.clone());
    let data = service.table_summaries().await?;
    Ok(Json(ApiResponse::ok_with_service(data, SERVICE)))
}

/// 分页浏览表数据
#[utoipa::path(
    get,
    path = "/api/tables/{table}",
    tag = "tables",
    params(
        ("table" = String, Path, description = "表名"),
        PageParams
    ),
    responses(
        (status = 200, description = "表数据分页", body = ApiResponse<TableData>),
        (status = 404, description = "表未找到")
    )
)]
pub async fn table_data(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<ApiResponse<TableData>>, AppError> {
    let service = CatalogService::new(state.pool.clone());
    let data = service
        .table_data(
            &table,
            params.page.unwrap_or(1),
            params.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
        .await?;
    Ok(Json(ApiResponse::ok_with_service(data, SERVICE)))
}

/// 获取表的列元数据
#[utoipa::path(
    get,
    path = "/api/tables/{table}/columns",
    tag = "tables",
    params(
        ("table" = String, Path, description = "表名")
    ),
    responses(
        (status = 200, description = "列元数据", body = ApiResponse<Vec<TableColumn>>),
        (status = 404, description = "表未找到")
    )
)]
pub async fn table_columns(
    State(state): State<AppState>,
    Path(table): Path<String>,
) -> Result<Json<ApiResponse<Vec<TableColumn>>>, AppError> {
    let service = CatalogService::new(state.pool.clone());
    let data = service.columns(&table).await?;
    Ok(Json(ApiResponse::ok_with_service(data, SERVICE)))
}

/// 按主键读取单条记录
#[utoipa::path(
    get,
    path = "/api/tables/{table}/records/{id}",
    tag = "records",
    params(
        ("table" = String, Path, description = "表名"),
        ("id" = String, Path, description = "主键值")
    ),
    responses(
        (status = 200, description = "记录", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "表或记录未找到")
    )
)]
pub async fn get_record(
    State(state): State<AppState>,
    Path((table, id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let service = CatalogService::new(state.pool.clone());
    let data = service.record_by_key(&table, &id).await?;
    Ok(Json(ApiResponse::ok_with_service(data, SERVICE)))
}

/// 插入记录
#[utoipa::path(
    post,
    path = "/api/tables/{table}/records",
    tag = "records",
    params(
        ("table" = String, Path, description = "表名")
    ),
    request_body = InsertRecordRequest,
    responses(
        (status = 200, description = "插入后的记录", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "请求无效"),
        (status = 404, description = "表未找到"),
        (status = 409, description = "违反外键约束")
    )
)]
pub async fn insert_record(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Json(req): Json<InsertRecordRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let service = CatalogService::new(state.pool.clone());
    let data = service.insert_record(&table, &req.values).await?;
    Ok(Json(ApiResponse::ok_with_service(data, SERVICE)))
}

/// 按主键更新记录
#[utoipa::path(
    put,
    path = "/api/tables/{table}/records/{id}",
    tag = "records",
    params(
        ("table" = String, Path, description = "表名"),
        ("id" = String, Path, description = "主键值")
    ),
    request_body = UpdateRecordRequest,
    responses(
        (status = 200, description = "更新后的记录", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "表或记录未找到")
    )
)]
pub async fn update_record(
    State(state): State<AppState>,
    Path((table, id)): Path<(String, String)>,
    Json(req): Json<UpdateRecordRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let service = CatalogService::new(state.pool.clone());
    let data = service.update_by_key(&table, &id, &req.values).await?;
    Ok(Json(ApiResponse::ok_with_service(data, SERVICE)))
}

/// 按条件批量更新记录
#[utoipa::path(
    put,
    path = "/api/tables/{table}/records",
    tag = "records",
    params(
        ("table" = String, Path, description = "表名")
    ),
    request_body = BulkUpdateRequest,
    responses(
        (status = 200, description = "受影响的行", body = ApiResponse<RecordSet>),
        (status = 400, description = "缺少更新条件")
    )
)]
pub async fn bulk_update(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Json(req): Json<BulkUpdateRequest>,
) -> Result<Json<ApiResponse<RecordSet>>, AppError> {
    let service = CatalogService::new(state.pool.clone());
    let data = service.bulk_update(&table, &req.set, &req.conditions).await?;
    Ok(Json(ApiResponse::ok_with_service(data, SERVICE)))
}

/// 按主键删除记录
#[utoipa::path(
    delete,
    path = "/api/tables/{table}/records/{id}",
    tag = "records",
    params(
        ("table" = String, Path, description = "表名"),
        ("id" = String, Path, description = "主键值")
    ),
    responses(
        (status = 200, description = "被删除的记录", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "表或记录未找到"),
        (status = 409, description = "存在依赖数据，无法删除")
    )
)]
pub async fn delete_record(
    State(state): State<AppState>,
    Path((table, id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let service = CatalogService::new(state.pool.clone());
    let data = service.delete_by_key(&table, &id).await?;
    Ok(Json(ApiResponse::ok_with_service(data, SERVICE)))
}

/// 按条件批量删除记录
#[utoipa::path(
    delete,
    path = "/api/tables/{table}/records",
    tag = "records",
    params(
        ("table" = String, Path, description = "表名")
    ),
    request_body = BulkDeleteRequest,
    responses(
        (status = 200, description = "被删除的行", body = ApiResponse<RecordSet>),
        (status = 400, description = "缺少删除条件"),
        (status = 409, description = "存在依赖数据，无法删除")
    )
)]
pub async fn bulk_delete(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Json(req): Json<BulkDeleteRequest>,
) -> Result<Json<ApiResponse<RecordSet>>, AppError> {
    let service = CatalogService::new(state.pool.clone());
    let data = service.bulk_delete(&table, &req.conditions).await?;
    Ok(Json(ApiResponse::ok_with_service(data, SERVICE)))
}

/// 执行临时 SQL 查询
#[utoipa::path(
    post,
    path = "/api/query",
    tag = "query",
    request_body = QueryRequest,
    responses(
        (status = 200, description = "查询执行成功", body = ApiResponse<QueryResult>),
        (status = 400, description = "SQL 无效或被禁止")
    )
)]
pub async fn execute_query(
    State(state): State<AppState>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<ApiResponse<QueryResult>>, AppError> {
    let service = CatalogService::new(state.pool.clone());
    let result = service.execute(req).await?;
    Ok(Json(ApiResponse::ok_with_service(result, SERVICE)))
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
