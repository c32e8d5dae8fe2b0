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

use crate::{
    application::dto::{
        crawl_request::{validate_job_request, ConfigValidationError},
        crawl_response::CrawlAcceptedDto,
    },
    domain::{
        models::{
            artifact,
            job::{ArtifactLocation, JobState},
        },
        repositories::job_registry::{JobRegistry, RegistryError},
        services::delivery_service::{DeliveryMode, DeliveryStrategy},
    },
    infrastructure::metrics,
    workers::crawl_worker::CrawlWorker,
};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum CrawlUseCaseError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ConfigValidationError),
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
    #[error("Job not yet completed or submitted")]
    NotFound,
    #[error("Failed to read artifact: {0}")]
    ReadFailed(#[source] std::io::Error),
}

/// 爬取任务用例
///
/// 提交路径只做同步校验和注册表登记，爬取本身交给工作器在后台完成
pub struct CrawlUseCase {
    registry: Arc<dyn JobRegistry>,
    worker: CrawlWorker,
    delivery: Arc<dyn DeliveryStrategy>,
}

impl CrawlUseCase {
    pub fn new(
        registry: Arc<dyn JobRegistry>,
        worker: CrawlWorker,
        delivery: Arc<dyn DeliveryStrategy>,
    ) -> Self {
        Self {
            registry,
            worker,
            delivery,
        }
    }

    pub fn delivery_mode(&self) -> DeliveryMode {
        self.delivery.mode()
    }

    /// 校验并受理一个爬取任务
    ///
    /// 返回时任务已登记为 `Pending` 并已调度，响应不会等待爬取完成
    pub async fn submit(&self, raw: Value) -> Result<CrawlAcceptedDto, CrawlUseCaseError> {
        let config = validate_job_request(raw)?;

        let evicted = self.registry.create(config.id).await?;
        artifact::discard_local_artifacts(&evicted).await;
        metrics::record_job_submitted();

        let accepted = CrawlAcceptedDto {
            message: self.delivery.acceptance_message(&config),
            id: config.id,
        };
        info!(
            job_id = %config.id,
            url = %config.url,
            mode = ?self.delivery.mode(),
            "Crawl job accepted"
        );

        // Detached: the worker records the outcome in the registry
        let _ = self.worker.dispatch(config);
        Ok(accepted)
    }

    /// 读取已完成任务的产物
    ///
    /// 任务不存在、仍在运行或已失败时都返回 `NotFound`
    pub async fn retrieve(&self, id: Uuid) -> Result<Vec<u8>, CrawlUseCaseError> {
        let job = self
            .registry
            .lookup(id)
            .await?
            .ok_or(CrawlUseCaseError::NotFound)?;

        match (job.state, job.artifact_location) {
            (JobState::Completed, Some(ArtifactLocation::LocalPath { path })) => {
                debug!(job_id = %id, path = %path.display(), "Reading artifact");
                tokio::fs::read(&path)
                    .await
                    .map_err(CrawlUseCaseError::ReadFailed)
            }
            (state, _) => {
                debug!(job_id = %id, %state, "Artifact not available");
                Err(CrawlUseCaseError::NotFound)
            }
        }
    }
}
