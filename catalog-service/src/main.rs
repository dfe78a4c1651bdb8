//! 表目录与通用 CRUD 服务
//!
//! 提供面向任意表的管理功能，包括：
//! - public 模式下的表与列元数据发现
//! - 通用记录增删改查（主键自动推断）
//! - 临时 SQL 执行

mod handlers;
mod routes;
mod service;
mod state;

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

const SERVICE_NAME: &str = "catalog-service";
const DEFAULT_PORT: u16 = 8081;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "目录服务 API",
        version = "0.1.0",
        description = "表结构浏览与通用 CRUD 微服务"
    ),
    paths(
        handlers::list_tables,
        handlers::table_data,
        handlers::table_columns,
        handlers::get_record,
        handlers::insert_record,
        handlers::update_record,
        handlers::bulk_update,
        handlers::delete_record,
        handlers::bulk_delete,
        handlers::execute_query,
        handlers::health_check,
    ),
    components(schemas(
        common::models::TableSummary,
        common::models::TableColumn,
        common::models::TableData,
        common::models::InsertRecordRequest,
        common::models::UpdateRecordRequest,
        common::models::BulkUpdateRequest,
        common::models::BulkDeleteRequest,
        common::models::RecordSet,
        common::models::QueryRequest,
        common::models::QueryResult,
        common::models::ColumnInfo,
        handlers::HealthResponse,
    )),
    tags(
        (name = "tables", description = "表结构与数据浏览端点"),
        (name = "records", description = "通用记录 CRUD 端点"),
        (name = "query", description = "临时 SQL 执行端点"),
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
