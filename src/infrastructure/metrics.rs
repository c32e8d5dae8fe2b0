// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

pub const JOBS_SUBMITTED: &str = "crawljob_jobs_submitted_total";
pub const JOBS_COMPLETED: &str = "crawljob_jobs_completed_total";
pub const JOBS_FAILED: &str = "crawljob_jobs_failed_total";
pub const CRAWLS_IN_FLIGHT: &str = "crawljob_crawls_in_flight";

pub fn init_metrics(addr: SocketAddr) {
    let builder = PrometheusBuilder::new();

    // Ignore error if address is already in use (for development/testing)
    if let Err(e) = builder.with_http_listener(addr).install() {
        warn!(
            "Failed to install Prometheus recorder: {}. This might happen if the port is already in use.",
            e
        );
        return;
    }

    info!("Metrics exporter listening on {}", addr);
}

pub fn record_job_submitted() {
    metrics::counter!(JOBS_SUBMITTED).increment(1);
}

pub fn record_job_completed() {
    metrics::counter!(JOBS_COMPLETED).increment(1);
}

pub fn record_job_failed(stage: &'static str) {
    metrics::counter!(JOBS_FAILED, "stage" => stage).increment(1);
}

/// 正在运行的爬取数量守卫，析构时自动递减
pub struct InFlightGuard;

impl InFlightGuard {
    pub fn enter() -> Self {
        metrics::gauge!(CRAWLS_IN_FLIGHT).increment(1.0);
        Self
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        metrics::gauge!(CRAWLS_IN_FLIGHT).decrement(1.0);
    }
}
