// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, COOKIE};
use scraper::{Html, Selector};
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info, warn};
use url::Url;

use crate::domain::models::artifact::ArtifactHandle;
use crate::domain::models::job_config::JobConfig;
use crate::engines::link_matcher::LinkMatcher;
use crate::engines::traits::{CrawlEngine, CrawlError};

/// 产物中的单个页面
#[derive(Debug, Clone, Serialize)]
pub struct PageRecord {
    pub title: String,
    pub url: String,
    pub html: String,
}

/// 单个页面的解析结果
struct ParsedPage {
    title: String,
    content: Option<String>,
    links: Vec<Url>,
}

/// 页面爬取引擎
///
/// 基于 reqwest 的广度优先爬虫，将抓取到的页面写成单个 JSON 产物
pub struct PageCrawler {
    output_dir: PathBuf,
    user_agent: String,
}

impl PageCrawler {
    pub fn new(output_dir: impl Into<PathBuf>, user_agent: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            user_agent: user_agent.into(),
        }
    }

    fn build_client(&self, config: &JobConfig) -> Result<reqwest::Client, CrawlError> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = config.cookie_header() {
            let value = HeaderValue::from_str(&cookie)
                .map_err(|e| CrawlError::Other(format!("Invalid cookie: {}", e)))?;
            headers.insert(COOKIE, value);
        }

        Ok(reqwest::Client::builder()
            .user_agent(self.user_agent.as_str())
            .default_headers(headers)
            .timeout(config.page_timeout)
            .cookie_store(true)
            .build()?)
    }

    /// 计算种子 URL，`sitemap.xml` 会被展开为其中列出的页面
    async fn seeds(&self, client: &reqwest::Client, config: &JobConfig) -> Result<Vec<Url>, CrawlError> {
        let root = Url::parse(&config.url)
            .map_err(|e| CrawlError::Other(format!("Invalid url '{}': {}", config.url, e)))?;

        if !root.path().ends_with("sitemap.xml") {
            return Ok(vec![root]);
        }

        let body = client
            .get(root.clone())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let urls = parse_sitemap(&body);
        info!(sitemap = %root, count = urls.len(), "Expanded sitemap");

        if urls.is_empty() {
            return Err(CrawlError::NoPages(config.url.clone()));
        }
        Ok(urls)
    }

    /// 抓取单个页面，非成功状态或非 HTML 内容返回 `None`
    async fn fetch(&self, client: &reqwest::Client, url: &Url) -> Result<Option<String>, CrawlError> {
        let response = client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "Skipping page with error status");
            return Ok(None);
        }

        let is_html = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("html"))
            .unwrap_or(true);
        if !is_html {
            debug!(url = %url, "Skipping non-HTML resource");
            return Ok(None);
        }

        Ok(Some(response.text().await?))
    }

    async fn write_artifact(
        &self,
        config: &JobConfig,
        pages: Vec<PageRecord>,
    ) -> Result<ArtifactHandle, CrawlError> {
        let pages = apply_limits(pages, config.max_file_size_bytes, config.max_tokens)?;
        let body = serde_json::to_vec(&pages)?;

        fs::create_dir_all(&self.output_dir).await?;
        let path = self.output_dir.join(&config.output_file_name);
        fs::write(&path, &body).await?;

        info!(
            job_id = %config.id,
            pages = pages.len(),
            bytes = body.len(),
            path = %path.display(),
            "Artifact written"
        );
        Ok(ArtifactHandle::new(config.output_file_name.clone(), path))
    }
}

#[async_trait]
impl CrawlEngine for PageCrawler {
    async fn execute(&self, config: &JobConfig) -> Result<ArtifactHandle, CrawlError> {
        let matcher = LinkMatcher::new(
            &config.match_patterns,
            &config.exclude_patterns,
            &config.resource_exclusions,
        )
        .map_err(|e| CrawlError::Other(e.to_string()))?;
        let client = self.build_client(config)?;

        let mut queue: VecDeque<(Url, u32)> = VecDeque::new();
        let mut seen: HashSet<String> = HashSet::new();
        for seed in self.seeds(&client, config).await? {
            if seen.insert(seed.to_string()) {
                queue.push_back((seed, 0));
            }
        }

        let mut pages = Vec::new();
        let mut requests = 0u32;

        while let Some((url, depth)) = queue.pop_front() {
            if requests >= config.max_pages_to_crawl {
                debug!(job_id = %config.id, "Reached maxPagesToCrawl");
                break;
            }
            requests += 1;

            let body = match self.fetch(&client, &url).await {
                Ok(Some(body)) => body,
                Ok(None) => continue,
                Err(e) => {
                    warn!(url = %url, "Failed to fetch page: {}", e);
                    continue;
                }
            };

            let parsed = parse_page(&body, &url, config.selector.as_deref());
            let Some(content) = parsed.content else {
                warn!(
                    url = %url,
                    selector = config.selector.as_deref().unwrap_or("body"),
                    "Selector not found, skipping page"
                );
                continue;
            };

            info!(job_id = %config.id, url = %url, title = %parsed.title, "Crawled page");
            pages.push(PageRecord {
                title: parsed.title,
                url: url.to_string(),
                html: content,
            });

            if config.max_depth.is_some_and(|max| depth >= max) {
                continue;
            }
            for link in parsed.links {
                if matcher.allows(&link) && seen.insert(link.to_string()) {
                    queue.push_back((link, depth + 1));
                }
            }
        }

        if pages.is_empty() {
            return Err(CrawlError::NoPages(config.url.clone()));
        }

        self.write_artifact(config, pages).await
    }

    fn name(&self) -> &'static str {
        "page_crawler"
    }
}

/// 解析页面标题、内容和链接
///
/// `Html` 不是 `Send`，因此解析必须在同步函数中完成
fn parse_page(body: &str, base: &Url, selector: Option<&str>) -> ParsedPage {
    let document = Html::parse_document(body);

    let title = Selector::parse("title")
        .ok()
        .and_then(|s| document.select(&s).next())
        .map(|el| normalize_whitespace(&el.text().collect::<String>()))
        .unwrap_or_default();

    let content = Selector::parse(selector.unwrap_or("body"))
        .ok()
        .and_then(|s| document.select(&s).next())
        .map(|el| normalize_whitespace(&el.text().collect::<Vec<_>>().join(" ")));

    let mut links = Vec::new();
    if let Ok(anchor) = Selector::parse("a[href]") {
        for element in document.select(&anchor) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            // Ignore fragment identifiers, mailto and javascript links
            if href.starts_with('#') || href.starts_with("mailto:") || href.starts_with("javascript:") {
                continue;
            }
            if let Ok(mut url) = base.join(href) {
                if url.scheme() == "http" || url.scheme() == "https" {
                    url.set_fragment(None);
                    links.push(url);
                }
            }
        }
    }

    ParsedPage {
        title,
        content,
        links,
    }
}

static SITEMAP_LOC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<loc>\s*(.*?)\s*</loc>").expect("sitemap <loc> pattern is valid"));

fn parse_sitemap(body: &str) -> Vec<Url> {
    SITEMAP_LOC
        .captures_iter(body)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str().replace("&amp;", "&"))
        .filter_map(|raw| Url::parse(&raw).ok())
        .collect()
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 粗略估算 token 数，按每 4 个字符一个 token
pub fn estimate_tokens(text: &str) -> u64 {
    (text.chars().count() as u64).div_ceil(4)
}

/// 按大小和 token 上限截断页面列表，保留能放下的前缀
fn apply_limits(
    pages: Vec<PageRecord>,
    max_bytes: Option<u64>,
    max_tokens: Option<u64>,
) -> Result<Vec<PageRecord>, serde_json::Error> {
    if max_bytes.is_none() && max_tokens.is_none() {
        return Ok(pages);
    }

    let total = pages.len();
    let mut kept = Vec::with_capacity(total);
    // "[" + "]"
    let mut bytes = 2u64;
    let mut tokens = 0u64;

    for page in pages {
        let encoded = serde_json::to_string(&page)?;
        let page_bytes = encoded.len() as u64 + u64::from(!kept.is_empty());
        let page_tokens = estimate_tokens(&encoded);

        if max_bytes.is_some_and(|max| bytes + page_bytes > max)
            || max_tokens.is_some_and(|max| tokens + page_tokens > max)
        {
            warn!(kept = kept.len(), total, "Artifact limit reached, dropping remaining pages");
            break;
        }

        bytes += page_bytes;
        tokens += page_tokens;
        kept.push(page);
    }

    Ok(kept)
}

#[cfg(test)]
#[path = "page_crawler_test.rs"]
mod tests;
