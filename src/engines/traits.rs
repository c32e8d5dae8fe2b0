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

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::domain::models::artifact::ArtifactHandle;
use crate::domain::models::job_config::JobConfig;

/// 爬取错误类型
#[derive(Error, Debug)]
pub enum CrawlError {
    /// 请求失败
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    /// 没有任何页面抓取成功
    #[error("No pages could be crawled from {0}")]
    NoPages(String),
    /// 超时
    #[error("Crawl timed out after {0:?}")]
    Timeout(Duration),
    /// 产物序列化失败
    #[error("Failed to serialize artifact: {0}")]
    Serialization(#[from] serde_json::Error),
    /// 产物写入失败
    #[error("Failed to write artifact: {0}")]
    Io(#[from] std::io::Error),
    /// 爬取任务异常终止
    #[error("Crawl aborted: {0}")]
    Aborted(String),
    /// 其他错误
    #[error("Other error: {0}")]
    Other(String),
}

/// 爬取引擎特质
///
/// 以已校验的配置运行一次完整爬取，成功时返回产物句柄
#[async_trait]
pub trait CrawlEngine: Send + Sync {
    /// 执行爬取并写出产物
    async fn execute(&self, config: &JobConfig) -> Result<ArtifactHandle, CrawlError>;

    /// 引擎名称
    fn name(&self) -> &'static str;
}
