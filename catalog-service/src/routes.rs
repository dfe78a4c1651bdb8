//! 路由模块

use axum::{
    routing::{get, post},
    Router,
};
use crate::handlers;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/tables", get(handlers::list_tables))
        .route("/api/tables/{table}", get(handlers::table_data))
        .route("/api/tables/{table}/columns", get(handlers::table_columns))
        .route(
            "/api/tables/{table}/records",
            post(handlers::insert_record)
                .put(handlers::bulk_update)
                .delete(handlers::bulk_delete),
        )
        .route(
            "/api/tables/{table}/records/{id}",
            get(handlers::get_record)
                .put(handlers::update_record)
                .delete(handlers::delete_record),
        )
        .route("/api/query", post(handlers::execute_query))
        .route("/api/health", get(handlers::health_check))
}
