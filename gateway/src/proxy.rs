//! 请求转发模块
//!
//! 按路径前缀把请求转发到对应的下游微服务：
//! - /api/tables* 与 /api/query 转发到 catalog-service
//! - /api/backups* 与 /api/archives* 转发到 admin-service

use axum::{
    body::Body,
    extract::{Request, State},
    http::header,
    response::Response,
    routing::any,
    Router,
};
use http_body_util::BodyExt;

use common::errors::{AppError, AppResult};

use crate::state::AppState;

/// 创建转发路由
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/tables", any(proxy_catalog))
        .route("/api/tables/{*rest}", any(proxy_catalog))
        .route("/api/query", any(proxy_catalog))
        .route("/api/backups", any(proxy_admin))
        .route("/api/backups/{*rest}", any(proxy_admin))
        .route("/api/archives", any(proxy_admin))
        .route("/api/archives/{*rest}", any(proxy_admin))
}

/// 转发到目录服务
pub async fn proxy_catalog(
    State(state): State<AppState>,
    req: Request,
) -> AppResult<Response> {
    let base = state.service_urls.catalog_service.clone();
    forward(&state, &base, req).await
}

/// 转发到管理服务
pub async fn proxy_admin(
    State(state): State<AppState>,
    req: Request,
) -> AppResult<Response> {
    let base = state.service_urls.admin_service.clone();
    forward(&state, &base, req).await
}

/// 把请求原样转发到下游服务并回传响应
async fn forward(state: &AppState, base: &str, req: Request) -> AppResult<Response> {
    let (parts, body) = req.into_parts();

    let path_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| parts.uri.path());
    let target = format!("{}{}", base, path_query);

    let bytes = body
        .collect()
        .await
        .map_err(|e| AppError::ExternalService(format!("failed to read request body: {}", e)))?
        .to_bytes();

    tracing::debug!(method = %parts.method, target = %target, "转发请求");

    let mut headers = parts.headers.clone();
    headers.remove(header::HOST);
    headers.remove(header::CONTENT_LENGTH);

    let upstream = state
        .http_client
        .request(parts.method, &target)
        .headers(headers)
        .body(bytes)
        .send()
        .await
        .map_err(|e| AppError::ExternalService(format!("upstream request failed: {}", e)))?;

    let status = upstream.status();
    let upstream_headers = upstream.headers().clone();
    let body_bytes = upstream
        .bytes()
        .await
        .map_err(|e| AppError::ExternalService(format!("failed to read upstream body: {}", e)))?;

    let mut response = Response::builder()
        .status(status)
        .body(Body::from(body_bytes))
        .map_err(|e| AppError::Internal(format!("failed to build response: {}", e)))?;
    for (name, value) in upstream_headers.iter() {
        if name == header::TRANSFER_ENCODING
            || name == header::CONNECTION
            || name == header::CONTENT_LENGTH
        {
            continue;
        }
        response.headers_mut().insert(name.clone(), value.clone());
    }

    Ok(response)
}
