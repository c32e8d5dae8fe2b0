// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// 爬取任务
///
/// 从提交到终止状态的一次爬取请求。任务在提交时处于 `Pending`，
/// 爬取结束时恰好转换一次到 `Completed` 或 `Failed`，之后不再变化。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Job {
    /// 任务唯一标识符，同时也是产物名称的来源
    pub id: Uuid,
    /// 任务状态
    pub state: JobState,
    /// 产物位置，仅在 `Completed` 时存在
    pub artifact_location: Option<ArtifactLocation>,
    /// 失败原因，仅在 `Failed` 时存在
    pub error: Option<String>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 进入终止状态的时间
    pub finished_at: Option<DateTime<Utc>>,
}

/// 任务状态枚举
///
/// 状态转换遵循以下流程：
/// Pending → Completed/Failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// 爬取尚未结束
    Pending,
    /// 产物已交付
    Completed,
    /// 爬取或交付失败
    Failed,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JobState::Pending => write!(f, "pending"),
            JobState::Completed => write!(f, "completed"),
            JobState::Failed => write!(f, "failed"),
        }
    }
}

/// 产物位置
///
/// 含义取决于交付策略：本地检索模式下是文件路径，推送模式下是对象存储中的位置
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArtifactLocation {
    LocalPath { path: PathBuf },
    Remote { bucket: String, key: String },
}

impl fmt::Display for ArtifactLocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ArtifactLocation::LocalPath { path } => write!(f, "{}", path.display()),
            ArtifactLocation::Remote { bucket, key } => write!(f, "s3://{}/{}", bucket, key),
        }
    }
}

impl Job {
    pub fn pending(id: Uuid) -> Self {
        Self {
            id,
            state: JobState::Pending,
            artifact_location: None,
            error: None,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state != JobState::Pending
    }

    /// 已结束且超过保留时间
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match self.finished_at {
            Some(finished_at) => self.is_terminal() && finished_at + ttl <= now,
            None => false,
        }
    }

    /// Pending → Completed
    ///
    /// 当前状态不是 `Pending` 时返回当前状态，记录保持不变
    pub fn complete(&mut self, location: ArtifactLocation) -> Result<(), JobState> {
        if self.state != JobState::Pending {
            return Err(self.state);
        }
        self.state = JobState::Completed;
        self.artifact_location = Some(location);
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    /// Pending → Failed
    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), JobState> {
        if self.state != JobState::Pending {
            return Err(self.state);
        }
        self.state = JobState::Failed;
        self.error = Some(error.into());
        self.finished_at = Some(Utc::now());
        Ok(())
    }
}
