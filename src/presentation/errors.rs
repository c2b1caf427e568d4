// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use validator::ValidationErrors;

use crate::engines::traits::EngineError;

/// 应用错误类型
///
/// 封装所有可能的应用层错误，提供统一的错误处理接口
#[derive(Debug)]
pub struct AppError(anyhow::Error);

impl AppError {
    /// 错误对应的 HTTP 状态码
    pub fn status(&self) -> StatusCode {
        if self.0.downcast_ref::<ValidationErrors>().is_some() {
            return StatusCode::BAD_REQUEST;
        }
        match self.0.downcast_ref::<EngineError>() {
            Some(EngineError::InvalidQuery(_)) => StatusCode::BAD_REQUEST,
            Some(EngineError::Cancelled) | Some(EngineError::RenderTimeout { .. }) => {
                StatusCode::GATEWAY_TIMEOUT
            }
            Some(EngineError::FetchFailed { .. })
            | Some(EngineError::HttpStatus { .. })
            | Some(EngineError::UpstreamApi { .. })
            | Some(EngineError::RenderFailed(_))
            | Some(EngineError::Request(_)) => StatusCode::BAD_GATEWAY,
            None => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut body = json!({ "success": false, "error": self.0.to_string() });
        if let Some(engine_error) = self.0.downcast_ref::<EngineError>() {
            body["kind"] = json!(engine_error.kind());
            body["retryable"] = json!(engine_error.is_retryable());
        }
        (status, Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
