// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use axum_test::TestServer;
use crawljob::application::use_cases::crawl_use_case::CrawlUseCase;
use crawljob::domain::models::artifact::ArtifactHandle;
use crawljob::domain::models::job::{Job, JobState};
use crawljob::domain::models::job_config::JobConfig;
use crawljob::domain::repositories::job_registry::JobRegistry;
use crawljob::domain::repositories::storage_repository::StorageRepository;
use crawljob::domain::services::delivery_service::{
    DeliveryStrategy, LocalRetrieval, PushDelivery,
};
use crawljob::engines::page_crawler::PageCrawler;
use crawljob::engines::traits::{CrawlEngine, CrawlError};
use crawljob::infrastructure::repositories::job_registry_impl::InMemoryJobRegistry;
use crawljob::infrastructure::storage::InMemoryStorage;
use crawljob::presentation::routes;
use crawljob::workers::crawl_worker::CrawlWorker;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Semaphore;
use uuid::Uuid;

#[allow(dead_code)]
pub struct TestApp {
    pub server: TestServer,
    pub registry: Arc<InMemoryJobRegistry>,
    pub storage: Option<Arc<InMemoryStorage>>,
    // Keep the output directory alive
    pub output_dir: TempDir,
}

impl TestApp {
    /// 等待任务离开 `Pending`，返回最终记录（推送模式下成功的任务会被删除，返回 `None`）
    #[allow(dead_code)]
    pub async fn wait_for_job(&self, id: Uuid) -> Option<Job> {
        for _ in 0..500 {
            match self.registry.lookup(id).await.unwrap() {
                Some(job) if job.state == JobState::Pending => {}
                other => return other,
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {} did not finish in time", id);
    }
}

pub struct AppOptions {
    pub capacity: usize,
    pub max_concurrent_crawls: usize,
    pub job_timeout: Duration,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            capacity: 1024,
            max_concurrent_crawls: 8,
            job_timeout: Duration::from_secs(30),
        }
    }
}

/// 本地检索模式，使用真实的页面爬取引擎
#[allow(dead_code)]
pub async fn create_local_app() -> TestApp {
    let output_dir = tempfile::tempdir().unwrap();
    let engine = Arc::new(PageCrawler::new(output_dir.path(), "crawljob-test"));
    build_app(engine, output_dir, None, AppOptions::default())
}

/// 本地检索模式，使用指定引擎
#[allow(dead_code)]
pub fn create_local_app_with_engine(
    engine: Arc<dyn CrawlEngine>,
    output_dir: TempDir,
    options: AppOptions,
) -> TestApp {
    build_app(engine, output_dir, None, options)
}

/// 推送模式，产物上传到内存存储
#[allow(dead_code)]
pub async fn create_push_app() -> TestApp {
    let output_dir = tempfile::tempdir().unwrap();
    let engine = Arc::new(PageCrawler::new(output_dir.path(), "crawljob-test"));
    let storage = Arc::new(InMemoryStorage::new("crawl-results"));
    build_app(engine, output_dir, Some(storage), AppOptions::default())
}

fn build_app(
    engine: Arc<dyn CrawlEngine>,
    output_dir: TempDir,
    storage: Option<Arc<InMemoryStorage>>,
    options: AppOptions,
) -> TestApp {
    let registry = Arc::new(InMemoryJobRegistry::new(
        options.capacity,
        chrono::Duration::hours(1),
    ));
    let delivery: Arc<dyn DeliveryStrategy> = match &storage {
        Some(storage) => Arc::new(PushDelivery::new(
            registry.clone(),
            storage.clone() as Arc<dyn StorageRepository>,
        )),
        None => Arc::new(LocalRetrieval::new(registry.clone())),
    };
    let worker = CrawlWorker::new(
        engine,
        delivery.clone(),
        registry.clone(),
        options.max_concurrent_crawls,
        options.job_timeout,
    );
    let use_case = Arc::new(CrawlUseCase::new(registry.clone(), worker, delivery));

    let server = TestServer::new(routes::routes(use_case)).unwrap();

    TestApp {
        server,
        registry,
        storage,
        output_dir,
    }
}

/// 在放行前一直阻塞的引擎，放行后写出固定产物
#[allow(dead_code)]
pub struct GatedEngine {
    gate: Semaphore,
    dir: std::path::PathBuf,
    body: Vec<u8>,
}

#[allow(dead_code)]
impl GatedEngine {
    pub fn new(dir: &std::path::Path, body: &[u8]) -> Self {
        Self {
            gate: Semaphore::new(0),
            dir: dir.to_path_buf(),
            body: body.to_vec(),
        }
    }

    pub fn release(&self, jobs: usize) {
        self.gate.add_permits(jobs);
    }
}

#[async_trait]
impl CrawlEngine for GatedEngine {
    async fn execute(&self, config: &JobConfig) -> Result<ArtifactHandle, CrawlError> {
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| CrawlError::Aborted(e.to_string()))?;
        permit.forget();

        let path = self.dir.join(&config.output_file_name);
        tokio::fs::write(&path, &self.body).await?;
        Ok(ArtifactHandle::new(config.output_file_name.clone(), path))
    }

    fn name(&self) -> &'static str {
        "gated"
    }
}
