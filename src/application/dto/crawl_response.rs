// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// 爬取任务受理响应
#[derive(Debug, Deserialize, Serialize)]
pub struct CrawlAcceptedDto {
    /// 提示信息，内容取决于交付模式
    pub message: String,
    /// 任务的唯一标识符
    pub id: Uuid,
}

/// 错误响应
#[derive(Debug, Deserialize, Serialize)]
pub struct ErrorResponseDto {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}
