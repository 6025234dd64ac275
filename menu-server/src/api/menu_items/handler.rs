//! Menu Item API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::AppResponse;
use shared::models::{MenuItem, MenuItemCreate, MenuItemUpdate};

use crate::core::ServerState;
use crate::utils::{AppError, AppResult, ok};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRequest {
    pub is_available: bool,
}

#[derive(Debug, Deserialize)]
pub struct PopularQuery {
    pub limit: Option<usize>,
}

/// GET /api/restaurants/{id}/menu-items - 获取餐厅菜品
pub async fn list(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Vec<MenuItem>>>> {
    let items = state.menu_items.list(&id).await?;
    Ok(ok(items))
}

/// GET /api/restaurants/{id}/menu-items/{item_id} - 获取单个菜品
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path((id, item_id)): Path<(String, String)>,
) -> AppResult<Json<AppResponse<MenuItem>>> {
    let item = state
        .menu_items
        .get(&id, &item_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Menu item {} not found", item_id)))?;
    Ok(ok(item))
}

/// POST /api/restaurants/{id}/menu-items - 创建菜品
///
/// `restaurantName` is copied from the restaurant document.
pub async fn create(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<MenuItemCreate>,
) -> AppResult<Json<AppResponse<MenuItem>>> {
    let restaurant = state
        .restaurants
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Restaurant {} not found", id)))?;

    let item = state
        .menu_items
        .create(&id, Some(restaurant.name.as_str()), payload)
        .await?;
    Ok(ok(item))
}

/// PUT /api/restaurants/{id}/menu-items/{item_id} - 更新菜品
pub async fn update(
    State(state): State<ServerState>,
    Path((id, item_id)): Path<(String, String)>,
    Json(payload): Json<MenuItemUpdate>,
) -> AppResult<Json<AppResponse<MenuItem>>> {
    let item = state.menu_items.update(&id, &item_id, payload).await?;
    Ok(ok(item))
}

/// PUT /api/restaurants/{id}/menu-items/{item_id}/availability - 上下架
pub async fn set_availability(
    State(state): State<ServerState>,
    Path((id, item_id)): Path<(String, String)>,
    Json(payload): Json<AvailabilityRequest>,
) -> AppResult<Json<AppResponse<MenuItem>>> {
    let item = state
        .menu_items
        .set_availability(&id, &item_id, payload.is_available)
        .await?;
    Ok(ok(item))
}

/// DELETE /api/restaurants/{id}/menu-items/{item_id} - 删除菜品
pub async fn delete(
    State(state): State<ServerState>,
    Path((id, item_id)): Path<(String, String)>,
) -> AppResult<Json<AppResponse<bool>>> {
    state.menu_items.delete(&id, &item_id).await?;
    Ok(ok(true))
}

/// GET /api/menu-items/popular - 热门菜品 (可售、按价格升序)
pub async fn popular(
    State(state): State<ServerState>,
    Query(query): Query<PopularQuery>,
) -> AppResult<Json<AppResponse<Vec<MenuItem>>>> {
    let items = state.menu_items.popular(query.limit).await?;
    Ok(ok(items))
}
