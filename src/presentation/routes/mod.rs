// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::use_cases::crawl_use_case::CrawlUseCase;
use crate::domain::services::delivery_service::DeliveryMode;
use crate::presentation::handlers::crawl_handler;
use axum::{
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// 创建应用路由
///
/// 检索接口只在本地交付模式下注册，推送模式下的产物不在本地保留
///
/// # 返回值
///
/// 返回配置好的路由
pub fn routes(use_case: Arc<CrawlUseCase>) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/version", get(version));

    let mut crawl_routes = Router::new().route("/crawl", post(crawl_handler::create_crawl));
    if use_case.delivery_mode() == DeliveryMode::Local {
        crawl_routes = crawl_routes.route("/retrieve/{id}", get(crawl_handler::retrieve_crawl));
    }

    Router::new()
        .merge(public_routes)
        .merge(crawl_routes)
        .layer(Extension(use_case))
        .layer(TraceLayer::new_for_http())
}

/// 健康检查端点
///
/// # 返回值
///
/// 返回"OK"字符串
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
