//! Restaurant API Handlers

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
};
use serde::Deserialize;
use shared::AppResponse;
use shared::models::{ImageRef, Restaurant, RestaurantProfile};

use crate::core::ServerState;
use crate::utils::{AppError, AppResult, ok};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
}

/// Signup payload: identity-provider user id plus the initial profile
#[derive(Debug, Deserialize)]
pub struct CreateRestaurantRequest {
    pub id: String,
    #[serde(flatten)]
    pub profile: RestaurantProfile,
}

/// GET /api/restaurants - 获取餐厅列表
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<AppResponse<Vec<Restaurant>>>> {
    let restaurants = state.restaurants.find_all(query.limit).await?;
    Ok(ok(restaurants))
}

/// POST /api/restaurants - 注册餐厅 (已存在则原样返回)
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CreateRestaurantRequest>,
) -> AppResult<Json<AppResponse<Restaurant>>> {
    let restaurant = state
        .restaurants
        .create_if_absent(&payload.id, payload.profile)
        .await?;
    Ok(ok(restaurant))
}

/// GET /api/restaurants/{id} - 获取单个餐厅
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Restaurant>>> {
    let restaurant = state
        .restaurants
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Restaurant {} not found", id)))?;
    Ok(ok(restaurant))
}

/// PUT /api/restaurants/{id} - 更新餐厅资料
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<RestaurantProfile>,
) -> AppResult<Json<AppResponse<Restaurant>>> {
    let restaurant = state.restaurants.update_profile(&id, payload).await?;
    Ok(ok(restaurant))
}

/// POST /api/restaurants/{id}/complete-profile - 完成资料设置
pub async fn complete_profile(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<RestaurantProfile>,
) -> AppResult<Json<AppResponse<Restaurant>>> {
    let restaurant = state.restaurants.complete_profile(&id, payload).await?;
    Ok(ok(restaurant))
}

/// POST /api/restaurants/{id}/verify - 审核通过
pub async fn verify(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Restaurant>>> {
    let restaurant = state.restaurants.mark_verified(&id).await?;
    Ok(ok(restaurant))
}

/// POST /api/restaurants/{id}/images - 上传图片 (multipart, 字段名 `file`)
pub async fn upload_image(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> AppResult<Json<AppResponse<ImageRef>>> {
    if state.restaurants.find_by_id(&id).await?.is_none() {
        return Err(AppError::not_found(format!("Restaurant {} not found", id)));
    }

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::validation("No filename provided in file field"))?;
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await?.to_vec();

        let image = state
            .images
            .upload(&id, &file_name, &content_type, bytes)
            .await?;
        return Ok(ok(image));
    }

    Err(AppError::validation(
        "No 'file' field found. Field name must be 'file'",
    ))
}
