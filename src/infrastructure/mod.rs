// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 该模块包含系统的技术实现细节，负责与外部系统的交互。
///
/// 包含的子模块：
/// - 指标（metrics）：Prometheus 指标收集与导出
/// - 仓库实现（repositories）：任务注册表的具体实现
/// - 存储（storage）：对象存储客户端
///
/// 基础设施层依赖于领域层的抽象接口。
pub mod metrics;
pub mod repositories;
pub mod storage;
