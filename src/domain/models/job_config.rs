// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::Duration;
use uuid::Uuid;

/// 每页默认抓取超时
pub const DEFAULT_PAGE_TIMEOUT: Duration = Duration::from_millis(10_000);

/// 默认最多抓取的页面数
pub const DEFAULT_MAX_PAGES: u32 = 50;

/// 已校验的爬取配置
///
/// 只能通过请求校验器构造，`id` 和 `output_file_name` 由服务端分配
#[derive(Debug, Clone)]
pub struct JobConfig {
    /// 任务ID
    pub id: Uuid,
    /// 产物名称，形如 `<id>.json`
    pub output_file_name: String,
    /// 起始URL，以 `sitemap.xml` 结尾时展开为站点地图中的全部URL
    pub url: String,
    /// 需要跟随的链接模式（glob）
    pub match_patterns: Vec<String>,
    /// 需要排除的链接模式（glob）
    pub exclude_patterns: Vec<String>,
    /// 提取页面内容的CSS选择器
    pub selector: Option<String>,
    /// 最多抓取的页面数
    pub max_pages_to_crawl: u32,
    /// 最大链接深度，种子页为 0
    pub max_depth: Option<u32>,
    /// 每个请求携带的 Cookie
    pub cookies: Vec<Cookie>,
    /// 单页抓取超时
    pub page_timeout: Duration,
    /// 不抓取的资源扩展名（不含点）
    pub resource_exclusions: Vec<String>,
    /// 产物大小上限（字节）
    pub max_file_size_bytes: Option<u64>,
    /// 产物估算 token 上限
    pub max_tokens: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

impl JobConfig {
    /// 由任务ID派生产物名称
    pub fn artifact_name(id: Uuid) -> String {
        format!("{}.json", id)
    }

    /// `Cookie` 请求头的值
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|c| format!("{}={}", c.name, c.value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}
