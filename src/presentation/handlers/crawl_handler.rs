// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use axum::{
    extract::{Extension, Path},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    application::use_cases::crawl_use_case::CrawlUseCase, presentation::errors::ApiError,
};

/// 提交爬取任务
///
/// 校验通过后立即返回任务ID，爬取在后台进行
pub async fn create_crawl(
    Extension(use_case): Extension<Arc<CrawlUseCase>>,
    Json(payload): Json<Value>,
) -> impl IntoResponse {
    match use_case.submit(payload).await {
        Ok(accepted) => (StatusCode::OK, Json(accepted)).into_response(),
        Err(e) => {
            warn!("Crawl request rejected: {}", e);
            ApiError::crawl(e).into_response()
        }
    }
}

/// 获取已完成任务的结果
///
/// 返回产物文件的原始内容
pub async fn retrieve_crawl(
    Extension(use_case): Extension<Arc<CrawlUseCase>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    // Anything that is not a job id cannot name a known job
    let Ok(id) = Uuid::parse_str(&id) else {
        debug!(id = %id, "Retrieve called with malformed job id");
        return ApiError::not_ready().into_response();
    };

    match use_case.retrieve(id).await {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        Err(e) => {
            let error = ApiError::retrieve(e);
            if error.status().is_server_error() {
                warn!(job_id = %id, "Failed to retrieve results");
            }
            error.into_response()
        }
    }
}
