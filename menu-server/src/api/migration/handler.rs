//! Migration Admin API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use shared::AppResponse;

use crate::core::ServerState;
use crate::migration::{MigrationReport, MigrationStatus, RunOutcome, VerifyReport};
use crate::utils::{AppError, AppResult, ok};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    /// 必须为 true 才会执行
    #[serde(default)]
    pub confirm: bool,
    /// 已完成过一次时，确认接受重复数据
    #[serde(default)]
    pub acknowledge_duplicates: bool,
}

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    pub sample: Option<usize>,
}

/// GET /api/admin/migration - 迁移状态
pub async fn status(State(state): State<ServerState>) -> Json<AppResponse<MigrationStatus>> {
    ok(state.migration.status())
}

/// POST /api/admin/migration/run - 执行迁移
pub async fn run(
    State(state): State<ServerState>,
    Json(payload): Json<RunRequest>,
) -> AppResult<Json<AppResponse<MigrationReport>>> {
    if !payload.confirm {
        return Err(AppError::validation(
            "Migration not confirmed: send {\"confirm\": true} to run it",
        ));
    }

    match state
        .migration
        .run_with_guard(payload.acknowledge_duplicates)
        .await?
    {
        RunOutcome::Completed(report) => Ok(ok(report)),
        RunOutcome::Refused { warning } => Err(AppError::Conflict(warning.to_string())),
    }
}

/// GET /api/admin/migration/verify - 校验扁平集合
pub async fn verify(
    State(state): State<ServerState>,
    Query(query): Query<VerifyQuery>,
) -> AppResult<Json<AppResponse<VerifyReport>>> {
    let report = state.migration.verify(query.sample).await?;
    Ok(ok(report))
}

#[derive(Debug, Deserialize)]
pub struct RenameCategoryRequest {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameCategoryResponse {
    pub updated_count: usize,
}

/// POST /api/admin/restaurants/{id}/menu-categories/rename - 批量修改分类
pub async fn rename_category(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<RenameCategoryRequest>,
) -> AppResult<Json<AppResponse<RenameCategoryResponse>>> {
    if state.restaurants.find_by_id(&id).await?.is_none() {
        return Err(AppError::not_found(format!("Restaurant {} not found", id)));
    }
    let updated_count = state
        .menu_items
        .rename_category(&id, &payload.from, &payload.to)
        .await?;
    Ok(ok(RenameCategoryResponse { updated_count }))
}
