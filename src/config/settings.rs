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

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

use crate::domain::services::delivery_service::DeliveryMode;

/// 应用程序配置设置
///
/// 包含服务器、交付策略、存储、爬虫、任务注册表和指标等所有配置项
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// 服务器配置
    pub server: ServerSettings,
    /// 交付策略配置
    pub delivery: DeliverySettings,
    /// 存储配置
    pub storage: StorageSettings,
    /// 爬虫配置
    pub crawler: CrawlerSettings,
    /// 任务注册表配置
    pub registry: RegistrySettings,
    /// 指标配置
    pub metrics: MetricsSettings,
}

/// 服务器配置设置
#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
}

/// 交付策略配置设置
#[derive(Debug, Deserialize)]
pub struct DeliverySettings {
    /// 交付模式 (local, push)
    pub mode: DeliveryMode,
}

/// 存储配置设置
#[derive(Debug, Deserialize)]
pub struct StorageSettings {
    /// 爬取结果的本地输出目录
    pub output_dir: String,
    /// S3 区域
    pub s3_region: Option<String>,
    /// S3 存储桶名称
    pub s3_bucket: Option<String>,
    /// S3 访问密钥
    pub s3_access_key: Option<String>,
    /// S3 密钥
    pub s3_secret_key: Option<String>,
    /// S3 端点 (可选，用于 MinIO 等兼容服务)
    pub s3_endpoint: Option<String>,
}

/// 爬虫配置设置
#[derive(Debug, Deserialize)]
pub struct CrawlerSettings {
    /// 同时运行的爬取任务上限
    pub max_concurrent_crawls: usize,
    /// 单个任务的最长运行时间（秒）
    pub job_timeout_secs: u64,
    /// 请求使用的 User-Agent
    pub user_agent: String,
}

impl CrawlerSettings {
    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_secs)
    }
}

/// 任务注册表配置设置
#[derive(Debug, Deserialize)]
pub struct RegistrySettings {
    /// 注册表最多保留的任务数
    pub capacity: usize,
    /// 已结束任务的保留时间（秒）
    pub ttl_secs: u64,
    /// 过期清理间隔（秒）
    pub sweep_interval_secs: u64,
}

/// 指标配置设置
#[derive(Debug, Deserialize)]
pub struct MetricsSettings {
    /// 是否启用 Prometheus 导出
    pub enabled: bool,
    /// 导出器监听地址
    pub listen: SocketAddr,
}

/// 推送模式下已解析的 S3 配置
#[derive(Debug, Clone)]
pub struct S3Settings {
    pub region: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub endpoint: Option<String>,
}

impl StorageSettings {
    /// 解析推送模式所需的 S3 配置
    ///
    /// 缺少任一必填项时返回 `ConfigError::NotFound`
    pub fn s3(&self) -> Result<S3Settings, ConfigError> {
        fn required(value: &Option<String>, key: &str) -> Result<String, ConfigError> {
            value
                .as_ref()
                .filter(|v| !v.trim().is_empty())
                .cloned()
                .ok_or_else(|| ConfigError::NotFound(format!("storage.{}", key)))
        }

        Ok(S3Settings {
            region: required(&self.s3_region, "s3_region")?,
            bucket: required(&self.s3_bucket, "s3_bucket")?,
            access_key: required(&self.s3_access_key, "s3_access_key")?,
            secret_key: required(&self.s3_secret_key, "s3_secret_key")?,
            endpoint: self.s3_endpoint.clone(),
        })
    }
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次加载默认值、`config/default.toml`、`config/{APP_ENVIRONMENT}.toml`
    /// 以及 `CRAWLJOB__` 前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Self::builder()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("CRAWLJOB").separator("__"));

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// 仅包含默认值的配置构建器
    pub fn builder() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            // Server, same defaults as API_HOST / API_PORT
            .set_default("server.host", "localhost")?
            .set_default("server.port", 3000)?
            .set_default("delivery.mode", "local")?
            .set_default("storage.output_dir", "./storage")?
            .set_default("crawler.max_concurrent_crawls", 8)?
            .set_default("crawler.job_timeout_secs", 1800)?
            .set_default("crawler.user_agent", "Mozilla/5.0 (compatible; crawljob/0.1)")?
            .set_default("registry.capacity", 10_000)?
            .set_default("registry.ttl_secs", 86_400)?
            .set_default("registry.sweep_interval_secs", 300)?
            .set_default("metrics.enabled", false)?
            .set_default("metrics.listen", "0.0.0.0:9000")
    }

    /// 校验跨字段约束
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.crawler.max_concurrent_crawls == 0 {
            return Err(ConfigError::Message(
                "crawler.max_concurrent_crawls must be greater than 0".to_string(),
            ));
        }
        if self.crawler.job_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "crawler.job_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.registry.capacity == 0 {
            return Err(ConfigError::Message(
                "registry.capacity must be greater than 0".to_string(),
            ));
        }
        if self.delivery.mode == DeliveryMode::Push {
            self.storage.s3()?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
