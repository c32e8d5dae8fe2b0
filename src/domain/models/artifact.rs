// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use super::job::{ArtifactLocation, Job};

/// 爬取产物句柄
///
/// 由爬取引擎产生，随后所有权移交给交付策略。`read` 会消费句柄，
/// 因此产物内容最多被读取一次。
#[derive(Debug)]
pub struct ArtifactHandle {
    name: String,
    path: PathBuf,
}

impl ArtifactHandle {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// 产物名称，用作对象存储的键
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 放弃读取，只保留文件路径
    pub fn into_path(self) -> PathBuf {
        self.path
    }

    /// 读取产物全部内容
    pub async fn read(self) -> std::io::Result<Vec<u8>> {
        fs::read(&self.path).await
    }
}

/// 删除被淘汰任务留在本地的产物文件，返回删除的文件数
///
/// 任务记录被淘汰后没有任何ID能再访问这些文件。删除失败只记录日志。
pub async fn discard_local_artifacts(jobs: &[Job]) -> usize {
    let mut removed = 0;
    for job in jobs {
        let Some(ArtifactLocation::LocalPath { path }) = &job.artifact_location else {
            continue;
        };
        match fs::remove_file(path).await {
            Ok(()) => {
                debug!(job_id = %job.id, path = %path.display(), "Removed evicted artifact");
                removed += 1;
            }
            Err(e) => {
                warn!(job_id = %job.id, path = %path.display(), "Failed to remove evicted artifact: {}", e);
            }
        }
    }
    removed
}
