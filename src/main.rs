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

use crawljob::application::use_cases::crawl_use_case::CrawlUseCase;
use crawljob::config::settings::Settings;
use crawljob::domain::repositories::job_registry::JobRegistry;
use crawljob::domain::services::delivery_service::{
    DeliveryMode, DeliveryStrategy, LocalRetrieval, PushDelivery,
};
use crawljob::engines::page_crawler::PageCrawler;
use crawljob::infrastructure::repositories::job_registry_impl::InMemoryJobRegistry;
use crawljob::infrastructure::storage::S3Storage;
use crawljob::presentation::routes;
use crawljob::workers::crawl_worker::CrawlWorker;
use crawljob::workers::expiration_worker::ExpirationWorker;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crawljob::utils::telemetry;

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting crawljob...");

    // 2. Load configuration
    let settings = Settings::new()?;
    info!(mode = ?settings.delivery.mode, "Configuration loaded");

    if settings.metrics.enabled {
        crawljob::infrastructure::metrics::init_metrics(settings.metrics.listen);
    }

    // 3. Job registry
    let ttl = chrono::Duration::seconds(i64::try_from(settings.registry.ttl_secs)?);
    let registry: Arc<dyn JobRegistry> =
        Arc::new(InMemoryJobRegistry::new(settings.registry.capacity, ttl));

    // 4. Delivery strategy, fixed for the lifetime of the process
    let delivery: Arc<dyn DeliveryStrategy> = match settings.delivery.mode {
        DeliveryMode::Local => Arc::new(LocalRetrieval::new(registry.clone())),
        DeliveryMode::Push => {
            let s3 = settings.storage.s3()?;
            info!(bucket = %s3.bucket, region = %s3.region, "Push delivery enabled");
            Arc::new(PushDelivery::new(registry.clone(), Arc::new(S3Storage::new(s3))))
        }
    };

    // 5. Workers
    let engine = Arc::new(PageCrawler::new(
        &settings.storage.output_dir,
        &settings.crawler.user_agent,
    ));
    let worker = CrawlWorker::new(
        engine,
        delivery.clone(),
        registry.clone(),
        settings.crawler.max_concurrent_crawls,
        settings.crawler.job_timeout(),
    );
    let expiration = ExpirationWorker::new(
        registry.clone(),
        Duration::from_secs(settings.registry.sweep_interval_secs),
    )
    .start();

    // 6. Start HTTP server
    let use_case = Arc::new(CrawlUseCase::new(registry, worker, delivery));
    let app = routes::routes(use_case);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    expiration.abort();
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
