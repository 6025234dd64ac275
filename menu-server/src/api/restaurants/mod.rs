//! Restaurant API 模块

mod handler;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::core::ServerState;
use crate::services::MAX_FILE_SIZE;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/restaurants", restaurant_routes())
}

fn restaurant_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/{id}", get(handler::get_by_id).put(handler::update))
        .route("/{id}/complete-profile", post(handler::complete_profile))
        .route("/{id}/verify", post(handler::verify))
        .route(
            "/{id}/images",
            // 为 multipart 边界留出余量，大小由服务层校验
            post(handler::upload_image).layer(DefaultBodyLimit::max(MAX_FILE_SIZE + 64 * 1024)),
        )
}
