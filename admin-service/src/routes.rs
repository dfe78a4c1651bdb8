//! 路由模块

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/backups",
            post(handlers::create_backup).get(handlers::list_backups),
        )
        .route("/api/backups/{name}", delete(handlers::delete_backup))
        .route("/api/backups/{name}/restore", post(handlers::restore_backup))
        .route(
            "/api/archives",
            post(handlers::archive_tables).get(handlers::list_archives),
        )
        .route("/api/archives/{name}", delete(handlers::delete_archive))
        .route("/api/health", get(handlers::health_check))
}
