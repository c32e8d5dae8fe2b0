use crate::domain::models::artifact;
use crate::domain::repositories::job_registry::JobRegistry;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// 任务过期清理工作器
///
/// 负责定期扫描并清理超过保留时间的已结束任务
pub struct ExpirationWorker {
    registry: Arc<dyn JobRegistry>,
    interval: Duration,
}

impl ExpirationWorker {
    pub fn new(registry: Arc<dyn JobRegistry>, interval: Duration) -> Self {
        Self {
            registry,
            interval: interval.max(Duration::from_millis(1)),
        }
    }

    /// 运行工作器
    pub async fn run(&self) {
        info!("Job expiration worker started (interval {:?})", self.interval);

        let mut interval = tokio::time::interval(self.interval);
        // The first tick completes immediately
        interval.tick().await;

        loop {
            interval.tick().await;
            self.sweep().await;
        }
    }

    /// 启动后台运行
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    /// 执行一次清理，删除过期任务及其本地产物，返回删除的任务数
    pub async fn sweep(&self) -> usize {
        match self.registry.evict_expired(Utc::now()).await {
            Ok(expired) => {
                if expired.is_empty() {
                    debug!("No expired jobs to evict");
                } else {
                    let files = artifact::discard_local_artifacts(&expired).await;
                    info!("Evicted {} expired jobs, removed {} artifacts", expired.len(), files);
                }
                expired.len()
            }
            Err(e) => {
                error!("Failed to evict expired jobs: {}", e);
                0
            }
        }
    }
}

#[cfg(test)]
#[path = "expiration_worker_test.rs"]
mod tests;
