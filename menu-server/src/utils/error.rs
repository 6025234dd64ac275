//! 统一错误处理
//!
//! [`AppError`] is the HTTP-boundary error. Every variant renders the
//! `{success: false, error}` envelope with a matching status code.
//!
//! | Variant | Status |
//! |---------|--------|
//! | `NotFound` | 404 |
//! | `Validation` | 400 |
//! | `Conflict` | 409 |
//! | `StoreUnavailable` | 503 |
//! | `MigrationFailed` | 500 |

use crate::db::repository::RepoError;
use crate::migration::MigrationError;
use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use shared::AppResponse;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    /// 资源不存在 (404)
    NotFound(String),

    #[error("Validation failed: {0}")]
    /// 验证失败 (400)
    Validation(String),

    #[error("Conflict: {0}")]
    /// 状态冲突 (409)
    Conflict(String),

    #[error("Store unavailable: {0}")]
    /// 存储不可用 (503)
    StoreUnavailable(String),

    #[error("{0}")]
    /// 迁移中途失败 (500)，消息包含已处理数量
    MigrationFailed(String),
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::StoreUnavailable(msg) => {
                error!(target: "store", error = %msg, "Store unavailable");
                (StatusCode::SERVICE_UNAVAILABLE, "Store unavailable".to_string())
            }
            AppError::MigrationFailed(msg) => {
                error!(target: "migration", error = %msg, "Migration failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
        };

        (status, Json(AppResponse::<()>::error(message))).into_response()
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => AppError::NotFound(msg),
            RepoError::Validation(msg) => AppError::Validation(msg),
            RepoError::StoreUnavailable(msg) => AppError::StoreUnavailable(msg),
        }
    }
}

impl From<MigrationError> for AppError {
    fn from(err: MigrationError) -> Self {
        match err {
            MigrationError::Store(e) => RepoError::from(e).into(),
            partial @ MigrationError::PartialFailure { .. } => {
                AppError::MigrationFailed(partial.to_string())
            }
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        AppError::Validation(format!("Multipart error: {}", e))
    }
}

/// Result type for handlers
pub type AppResult<T> = Result<T, AppError>;

/// Create a successful response
pub fn ok<T: Serialize>(data: T) -> Json<AppResponse<T>> {
    Json(AppResponse::success(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::StoreError;

    #[test]
    fn repo_errors_map_to_status_codes() {
        let cases = [
            (RepoError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (RepoError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (RepoError::StoreUnavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn invalid_store_request_is_a_bad_request() {
        let err = AppError::from(RepoError::from(StoreError::Invalid("invalid object path".into())));
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn partial_failure_message_keeps_counts() {
        let err = AppError::from(MigrationError::PartialFailure {
            restaurants_processed: 2,
            items_migrated: 7,
            source: StoreError::Unavailable("down".into()),
        });
        let AppError::MigrationFailed(msg) = &err else {
            panic!("expected MigrationFailed, got {err:?}");
        };
        assert!(msg.contains("2 restaurants"));
        assert!(msg.contains("7 items"));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
