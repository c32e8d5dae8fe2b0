// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::models::job::{ArtifactLocation, Job, JobState};

/// 注册表错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// 任务ID重复，属于内部不变量被破坏
    #[error("Job {0} already exists")]
    AlreadyExists(Uuid),
    /// 任务不存在
    #[error("Job {0} not found")]
    NotFound(Uuid),
    /// 非法的状态转换
    #[error("Job {id} is already {from}")]
    InvalidTransition { id: Uuid, from: JobState },
    /// 注册表已满
    #[error("Job registry is full ({0} jobs)")]
    CapacityExceeded(usize),
}

/// 任务注册表特质
///
/// 任务ID到任务状态的映射，是系统中唯一的共享可变资源。
/// 实现必须在无需调用方加锁的情况下支持并发的插入、更新和读取，
/// 读取方只能看到完整的状态转换前或转换后的记录。
#[async_trait]
pub trait JobRegistry: Send + Sync {
    /// 插入一个 `Pending` 任务
    ///
    /// 注册表已满时会先淘汰已结束的任务，返回被淘汰的任务，由调用方清理其产物
    async fn create(&self, id: Uuid) -> Result<Vec<Job>, RegistryError>;

    /// Pending → Completed
    async fn complete(&self, id: Uuid, location: ArtifactLocation) -> Result<(), RegistryError>;

    /// Pending → Failed
    async fn fail(&self, id: Uuid, error: String) -> Result<(), RegistryError>;

    /// 读取任务快照
    async fn lookup(&self, id: Uuid) -> Result<Option<Job>, RegistryError>;

    /// 删除任务，返回任务是否存在
    async fn remove(&self, id: Uuid) -> Result<bool, RegistryError>;

    /// 删除超过保留时间的已结束任务，返回被删除的任务
    async fn evict_expired(&self, now: DateTime<Utc>) -> Result<Vec<Job>, RegistryError>;
}
