// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::domain::models::job::{ArtifactLocation, Job, JobState};
use crate::domain::repositories::job_registry::{JobRegistry, RegistryError};

/// 内存任务注册表
///
/// 基于 `DashMap` 的有界注册表。每次状态转换都在对应分片的写锁内完成，
/// 读取方得到的是完整记录的快照。
///
/// 容量策略：注册表已满时先清理过期任务，再按结束时间淘汰最早结束的任务；
/// `Pending` 任务不会被淘汰，全部为 `Pending` 时拒绝新任务。
pub struct InMemoryJobRegistry {
    jobs: DashMap<Uuid, Job>,
    capacity: usize,
    ttl: Duration,
    /// 串行化插入，使容量检查与插入保持原子
    admission: Mutex<()>,
}

impl InMemoryJobRegistry {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            jobs: DashMap::new(),
            capacity,
            ttl,
            admission: Mutex::new(()),
        }
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    fn remove_expired(&self, now: DateTime<Utc>) -> Vec<Job> {
        let expired: Vec<Uuid> = self
            .jobs
            .iter()
            .filter(|entry| entry.value().is_expired(now, self.ttl))
            .map(|entry| *entry.key())
            .collect();

        expired
            .into_iter()
            .filter_map(|id| {
                self.jobs
                    .remove_if(&id, |_, job| job.is_expired(now, self.ttl))
                    .map(|(_, job)| job)
            })
            .collect()
    }

    /// 淘汰最早结束的任务，直到腾出 `needed` 个位置
    fn evict_oldest_terminal(&self, needed: usize) -> Vec<Job> {
        let mut terminal: Vec<(Uuid, DateTime<Utc>)> = self
            .jobs
            .iter()
            .filter_map(|entry| entry.value().finished_at.map(|at| (*entry.key(), at)))
            .collect();
        terminal.sort_by_key(|(_, finished_at)| *finished_at);

        terminal
            .into_iter()
            .filter_map(|(id, _)| {
                self.jobs
                    .remove_if(&id, |_, job| job.is_terminal())
                    .map(|(_, job)| job)
            })
            .take(needed)
            .collect()
    }

    fn transition<F>(&self, id: Uuid, apply: F) -> Result<(), RegistryError>
    where
        F: FnOnce(&mut Job) -> Result<(), JobState>,
    {
        let mut job = self.jobs.get_mut(&id).ok_or(RegistryError::NotFound(id))?;
        apply(job.value_mut()).map_err(|from| RegistryError::InvalidTransition { id, from })
    }
}

#[async_trait]
impl JobRegistry for InMemoryJobRegistry {
    async fn create(&self, id: Uuid) -> Result<Vec<Job>, RegistryError> {
        let _admission = self.admission.lock();

        let mut evicted = Vec::new();
        if self.jobs.len() >= self.capacity {
            evicted = self.remove_expired(Utc::now());
            let expired = evicted.len();
            let overflow = (self.jobs.len() + 1).saturating_sub(self.capacity);
            if overflow > 0 {
                evicted.extend(self.evict_oldest_terminal(overflow));
            }
            debug!(
                expired,
                evicted = evicted.len() - expired,
                "Registry at capacity, evicted finished jobs"
            );

            if self.jobs.len() >= self.capacity {
                return Err(RegistryError::CapacityExceeded(self.capacity));
            }
        }

        match self.jobs.entry(id) {
            Entry::Occupied(_) => Err(RegistryError::AlreadyExists(id)),
            Entry::Vacant(slot) => {
                slot.insert(Job::pending(id));
                Ok(evicted)
            }
        }
    }

    async fn complete(&self, id: Uuid, location: ArtifactLocation) -> Result<(), RegistryError> {
        self.transition(id, |job| job.complete(location))
    }

    async fn fail(&self, id: Uuid, error: String) -> Result<(), RegistryError> {
        self.transition(id, |job| job.fail(error))
    }

    async fn lookup(&self, id: Uuid) -> Result<Option<Job>, RegistryError> {
        Ok(self.jobs.get(&id).map(|job| job.value().clone()))
    }

    async fn remove(&self, id: Uuid) -> Result<bool, RegistryError> {
        Ok(self.jobs.remove(&id).is_some())
    }

    async fn evict_expired(&self, now: DateTime<Utc>) -> Result<Vec<Job>, RegistryError> {
        Ok(self.remove_expired(now))
    }
}

#[cfg(test)]
#[path = "job_registry_impl_test.rs"]
mod tests;
