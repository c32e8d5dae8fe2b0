// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 交付策略：产物生成后如何到达使用方
pub mod delivery_service;
