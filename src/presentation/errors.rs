// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::application::dto::crawl_response::ErrorResponseDto;
use crate::application::use_cases::crawl_use_case::CrawlUseCaseError;
use crate::domain::repositories::job_registry::RegistryError;

pub const CRAWL_FAILED: &str = "Error occurred during crawling";
pub const RETRIEVE_FAILED: &str = "Error occurred during retrieving";
pub const NOT_READY: &str = "Job not yet completed or submitted.";

/// API 错误响应
///
/// 响应体固定为 `{ "message": ..., "error": ... }`，`error` 可省略
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: &'static str,
    error: Option<Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: &'static str, error: Option<Value>) -> Self {
        Self {
            status,
            message,
            error,
        }
    }

    /// 提交路径上的错误
    pub fn crawl(err: CrawlUseCaseError) -> Self {
        match err {
            CrawlUseCaseError::Validation(e) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, CRAWL_FAILED, Some(e.details()))
            }
            CrawlUseCaseError::Registry(e @ RegistryError::CapacityExceeded(_)) => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                CRAWL_FAILED,
                Some(json!(e.to_string())),
            ),
            other => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                CRAWL_FAILED,
                Some(json!(other.to_string())),
            ),
        }
    }

    /// 检索路径上的错误
    pub fn retrieve(err: CrawlUseCaseError) -> Self {
        match err {
            CrawlUseCaseError::NotFound => Self::not_ready(),
            other => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                RETRIEVE_FAILED,
                Some(json!(other.to_string())),
            ),
        }
    }

    pub fn not_ready() -> Self {
        Self::new(StatusCode::NOT_FOUND, NOT_READY, None)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponseDto {
            message: self.message.to_string(),
            error: self.error,
        };
        (self.status, Json(body)).into_response()
    }
}
