//! 健康检查路由
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /health | GET | 简单健康检查 |

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use shared::AppResponse;

use crate::core::ServerState;
use crate::db::repository::Layout;
use crate::utils::ok;

pub fn router() -> Router<ServerState> {
    Router::new().route("/health", get(health))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    /// 菜品 API 使用的存储布局
    menu_layout: Layout,
    environment: String,
}

pub async fn health(State(state): State<ServerState>) -> Json<AppResponse<HealthResponse>> {
    ok(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        menu_layout: state.menu_items.layout(),
        environment: state.config.environment.clone(),
    })
}
