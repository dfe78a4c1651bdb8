//! 备份、恢复与归档服务
//!
//! 通过 PostgreSQL 客户端工具管理数据库的生命周期操作：
//! - pg_dump 自定义格式备份（可限定表）
//! - 两步恢复（重建 public 模式后 pg_restore）
//! - 表归档：JSON 快照 + 备份 + 清空

mod handlers;
mod routes;
mod service;
mod state;
mod tools;

use axum::{middleware, routing::get, Json, Router};
use common::config::AppConfig;
use common::middleware::request_id::request_id_middleware;
use state::AppState;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;

const SERVICE_NAME: &str = "admin-service";
const DEFAULT_PORT: u16 = 8082;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "管理服务 API",
        version = "0.1.0",
        description = "备份、恢复与归档微服务"
    ),
    paths(
        handlers::create_backup,
        handlers::list_backups,
        handlers::delete_backup,
        handlers::restore_backup,
        handlers::archive_tables,
        handlers::list_archives,
        handlers::delete_archive,
        handlers::health_check,
    ),
    components(schemas(
        common::models::BackupRequest,
        common::models::BackupCreated,
        common::models::BackupFile,
        common::models::RestoreReport,
        common::models::ArchiveRequest,
        common::models::ArchiveTableResult,
        common::models::ArchiveReport,
        common::models::ArchiveEntry,
        handlers::HealthResponse,
    )),
    tags(
        (name = "backups", description = "数据库备份与恢复端点"),
        (name = "archives", description = "表归档端点"),
        (name = "health", description = "健康检查端点")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // 加载本地 .env（如存在）
    common::config::load_dotenv();

    // 初始化日志追踪
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // 加载配置
    let mut config = AppConfig::load_with_service(SERVICE_NAME);
    config.port = std::env::var("SERVER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    // 创建应用状态（连接被管理的 PostgreSQL 库）
    let state = AppState::new(config.clone())
        .await
        .expect("Failed to initialize application state (check DB_* settings)");

    // 创建路由
    let app = create_router(state);

    // 启动服务
    let addr = format!("{}:{}", config.host, config.port);
    info!(service = SERVICE_NAME, address = %addr, "启动服务");

    let listener = TcpListener::bind(&addr).await.expect("绑定地址失败");
    axum::serve(listener, app).await.expect("服务启动失败");
}

fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::router())
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
