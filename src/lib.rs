// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 包含请求校验和爬取任务用例
pub mod application;

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含任务模型、注册表接口和交付策略
pub mod domain;

/// 引擎模块
///
/// 实现网页爬取引擎
pub mod engines;

/// 基础设施模块
///
/// 提供注册表、对象存储和指标的具体实现
pub mod infrastructure;

/// 表示层模块
///
/// 处理HTTP请求和响应，包括路由和处理器
pub mod presentation;

/// 工具模块
pub mod utils;

/// 工作器模块
///
/// 实现后台爬取和过期清理
pub mod workers;
