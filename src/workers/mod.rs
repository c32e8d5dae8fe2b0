// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 爬取工作器
///
/// 在后台执行已接受的爬取任务并交付产物
pub mod crawl_worker;

/// 过期清理工作器
pub mod expiration_worker;
