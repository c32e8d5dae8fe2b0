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

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::domain::models::job_config::JobConfig;
use crate::domain::repositories::job_registry::JobRegistry;
use crate::domain::services::delivery_service::DeliveryStrategy;
use crate::engines::traits::{CrawlEngine, CrawlError};
use crate::infrastructure::metrics::{self, InFlightGuard};

/// 爬取工作器
///
/// 每个已接受的任务在独立的 tokio 任务中运行：获取并发许可，在截止时间内执行爬取，
/// 然后把产物交给交付策略。任务的任何结局（成功、失败、超时、panic）都会反映到注册表中，
/// 不会有任务永远停留在 `Pending`。
#[derive(Clone)]
pub struct CrawlWorker {
    engine: Arc<dyn CrawlEngine>,
    delivery: Arc<dyn DeliveryStrategy>,
    registry: Arc<dyn JobRegistry>,
    permits: Arc<Semaphore>,
    job_timeout: Duration,
}

impl CrawlWorker {
    pub fn new(
        engine: Arc<dyn CrawlEngine>,
        delivery: Arc<dyn DeliveryStrategy>,
        registry: Arc<dyn JobRegistry>,
        max_concurrent_crawls: usize,
        job_timeout: Duration,
    ) -> Self {
        Self {
            engine,
            delivery,
            registry,
            permits: Arc::new(Semaphore::new(max_concurrent_crawls.max(1))),
            job_timeout,
        }
    }

    /// 调度一个已登记为 `Pending` 的任务，立即返回
    ///
    /// 返回的句柄在任务结果写入注册表后结束，请求路径不需要等待它
    pub fn dispatch(&self, config: JobConfig) -> JoinHandle<()> {
        let worker = self.clone();
        tokio::spawn(async move {
            let id = config.id;
            let job = {
                let worker = worker.clone();
                tokio::spawn(async move { worker.run_job(config).await })
            };

            if let Err(e) = job.await {
                let reason = if e.is_panic() {
                    "crawl task panicked"
                } else {
                    "crawl task was cancelled"
                };
                error!(job_id = %id, "Job aborted: {}", reason);
                worker
                    .record_failure(id, "aborted", CrawlError::Aborted(reason.to_string()).to_string())
                    .await;
            }
        })
    }

    #[instrument(skip(self, config), fields(job_id = %config.id, url = %config.url, engine = self.engine.name()))]
    async fn run_job(&self, config: JobConfig) {
        let _permit = match self.permits.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                self.record_failure(config.id, "crawl", "worker is shutting down".to_string())
                    .await;
                return;
            }
        };
        let _in_flight = InFlightGuard::enter();

        info!("Crawl started");
        let started = Instant::now();

        let outcome = tokio::time::timeout(self.job_timeout, self.engine.execute(&config))
            .await
            .unwrap_or_else(|_| Err(CrawlError::Timeout(self.job_timeout)));

        let artifact = match outcome {
            Ok(artifact) => artifact,
            Err(e) => {
                error!("Crawl failed: {}", e);
                self.record_failure(config.id, "crawl", e.to_string()).await;
                return;
            }
        };

        match self.delivery.deliver(&config, artifact).await {
            Ok(()) => {
                metrics::record_job_completed();
                info!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    mode = ?self.delivery.mode(),
                    "Job completed"
                );
            }
            Err(e) => {
                error!("Delivery failed: {}", e);
                self.record_failure(config.id, "delivery", e.to_string()).await;
            }
        }
    }

    async fn record_failure(&self, id: Uuid, stage: &'static str, reason: String) {
        metrics::record_job_failed(stage);
        if let Err(e) = self.registry.fail(id, reason).await {
            warn!(job_id = %id, "Failed to record job failure: {}", e);
        }
    }
}

#[cfg(test)]
#[path = "crawl_worker_test.rs"]
mod tests;
