//! Admin API 模块 (迁移与数据维护)
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/admin/migration | GET | 迁移状态 (含重跑警告) |
//! | /api/admin/migration/run | POST | 执行迁移 |
//! | /api/admin/migration/verify | GET | 校验扁平集合 |
//! | /api/admin/restaurants/{id}/menu-categories/rename | POST | 批量修改菜品分类 |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .nest("/api/admin/migration", migration_routes())
        .route(
            "/api/admin/restaurants/{id}/menu-categories/rename",
            post(handler::rename_category),
        )
}

fn migration_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::status))
        .route("/run", post(handler::run))
        .route("/verify", get(handler::verify))
}
