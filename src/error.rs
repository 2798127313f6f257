//! 接口错误类型
//! 统一映射为 `{ success: false, error }` JSON 响应

use crate::favorites::ListingError;
use crate::resolver::ResolveError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum AppError {
    /// 分页参数不合法，不会发起任何上游请求
    #[error("{0}")]
    InvalidPageRequest(String),

    /// 收藏夹列表获取失败，整页失败
    #[error(transparent)]
    UpstreamListing(#[from] ListingError),

    /// 单个视频解析接口不可用 (仅 /resolve 使用)
    #[error(transparent)]
    Resolution(#[from] ResolveError),

    #[error("视频无法解析: {0}")]
    NotResolved(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Internal server error")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidPageRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotResolved(_) => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::UpstreamListing(_) | AppError::Resolution(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if let AppError::Internal(detail) = &self {
            warn!("内部错误: {}", detail);
        }
        (
            status,
            Json(json!({
                "success": false,
                "error": self.to_string(),
            })),
        )
            .into_response()
    }
}
