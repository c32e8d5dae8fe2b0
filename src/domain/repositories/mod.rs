// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 该模块定义了领域层的仓库接口，遵循依赖倒置原则。
/// 具体实现由基础设施层提供。
///
/// 包含的仓库接口：
/// - 任务注册表（job_registry）：管理爬取任务的状态
/// - 存储仓库（storage_repository）：推送交付使用的对象存储
pub mod job_registry;
pub mod storage_repository;
