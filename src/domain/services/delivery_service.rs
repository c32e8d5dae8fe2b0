// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};

use crate::domain::models::artifact::ArtifactHandle;
use crate::domain::models::job::ArtifactLocation;
use crate::domain::models::job_config::JobConfig;
use crate::domain::repositories::job_registry::{JobRegistry, RegistryError};
use crate::domain::repositories::storage_repository::{StorageError, StorageRepository};

/// 交付模式，每个部署只启用一种
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// 保留本地文件，由检索接口按需读取
    Local,
    /// 上传到对象存储
    Push,
}

/// 交付错误类型
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// 读取产物失败
    #[error("Failed to read artifact: {0}")]
    Read(#[source] std::io::Error),
    /// 上传失败
    #[error("Failed to upload artifact: {0}")]
    Upload(#[from] StorageError),
    /// 注册表更新失败
    #[error("Failed to update job registry: {0}")]
    Registry(#[from] RegistryError),
}

/// 交付策略特质
///
/// 爬取成功后由工作器调用，负责让产物到达使用方并更新任务注册表
#[async_trait]
pub trait DeliveryStrategy: Send + Sync {
    fn mode(&self) -> DeliveryMode;

    /// 提交成功后返回给调用方的提示信息
    fn acceptance_message(&self, config: &JobConfig) -> String;

    /// 交付产物，产物所有权随调用转移
    async fn deliver(
        &self,
        config: &JobConfig,
        artifact: ArtifactHandle,
    ) -> Result<(), DeliveryError>;
}

/// 本地检索交付
///
/// 只在注册表中记录产物路径，检索接口之后按需读取文件
pub struct LocalRetrieval {
    registry: Arc<dyn JobRegistry>,
}

impl LocalRetrieval {
    pub fn new(registry: Arc<dyn JobRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl DeliveryStrategy for LocalRetrieval {
    fn mode(&self) -> DeliveryMode {
        DeliveryMode::Local
    }

    fn acceptance_message(&self, config: &JobConfig) -> String {
        format!(
            "Config is valid. Use GET /retrieve/{} to get the results.",
            config.id
        )
    }

    async fn deliver(
        &self,
        config: &JobConfig,
        artifact: ArtifactHandle,
    ) -> Result<(), DeliveryError> {
        let path = artifact.into_path();
        info!(job_id = %config.id, path = %path.display(), "Artifact ready for retrieval");
        self.registry
            .complete(config.id, ArtifactLocation::LocalPath { path })
            .await?;
        Ok(())
    }
}

/// 推送交付
///
/// 读取产物并以产物名称为键执行一次 put，成功后删除本地文件和注册表记录。
/// 上传失败不会影响已经返回给调用方的响应，只会被记录下来。
pub struct PushDelivery {
    registry: Arc<dyn JobRegistry>,
    storage: Arc<dyn StorageRepository>,
}

impl PushDelivery {
    pub fn new(registry: Arc<dyn JobRegistry>, storage: Arc<dyn StorageRepository>) -> Self {
        Self { registry, storage }
    }

    fn destination(&self, key: &str) -> ArtifactLocation {
        ArtifactLocation::Remote {
            bucket: self.storage.bucket().to_string(),
            key: key.to_string(),
        }
    }
}

#[async_trait]
impl DeliveryStrategy for PushDelivery {
    fn mode(&self) -> DeliveryMode {
        DeliveryMode::Push
    }

    fn acceptance_message(&self, config: &JobConfig) -> String {
        format!(
            "Config is valid. Results will be uploaded to {} when the crawl completes.",
            self.destination(&config.output_file_name)
        )
    }

    async fn deliver(
        &self,
        config: &JobConfig,
        artifact: ArtifactHandle,
    ) -> Result<(), DeliveryError> {
        let key = artifact.name().to_string();
        let path = artifact.path().to_path_buf();
        let data = artifact.read().await.map_err(DeliveryError::Read)?;

        // Local copy is kept on failure so the result can still be recovered by hand
        self.storage.save(&key, &data).await?;

        info!(
            job_id = %config.id,
            destination = %self.destination(&key),
            bytes = data.len(),
            "Artifact uploaded"
        );

        if let Err(e) = fs::remove_file(&path).await {
            warn!(job_id = %config.id, path = %path.display(), "Failed to remove local artifact: {}", e);
        }

        // The object store owns the artifact now
        self.registry.remove(config.id).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "delivery_service_test.rs"]
mod tests;
