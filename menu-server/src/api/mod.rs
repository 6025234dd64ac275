//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`restaurants`] - 餐厅资料、审核和图片上传
//! - [`menu_items`] - 菜品管理和热门菜品
//! - [`migration`] - 菜品数据迁移管理
//!
//! Every response body is the `{success, data?, error?}` envelope.

pub mod health;
pub mod menu_items;
pub mod migration;
pub mod restaurants;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(restaurants::router())
        .merge(menu_items::router())
        .merge(migration::router())
}

/// Build the application with middleware and state
pub fn router(state: ServerState) -> Router {
    let mut app = build_router();

    // 本地对象存储的文件通过 /files 提供
    if let Some(dir) = &state.files_dir {
        app = app.nest_service("/files", ServeDir::new(dir));
    }

    app.layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
