// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::borrow::Cow;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::domain::models::job_config::{Cookie, JobConfig, DEFAULT_MAX_PAGES, DEFAULT_PAGE_TIMEOUT};
use crate::engines::link_matcher::GlobPattern;

/// 单个值或值列表
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }

    fn as_slice(&self) -> &[T] {
        match self {
            OneOrMany::One(value) => std::slice::from_ref(value),
            OneOrMany::Many(values) => values,
        }
    }
}

/// 爬取请求
///
/// 字段与爬虫配置文件保持一致（camelCase）。`outputFileName` 由服务端分配，
/// 客户端传入的值会被忽略。
#[derive(Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CrawlRequestDto {
    #[validate(url, custom(function = "validate_seed_scheme"))]
    pub url: String,
    #[serde(rename = "match")]
    #[validate(custom(function = "validate_patterns"))]
    pub match_patterns: OneOrMany<String>,
    #[validate(custom(function = "validate_patterns"))]
    pub exclude: Option<OneOrMany<String>>,
    #[validate(custom(function = "validate_selector"))]
    pub selector: Option<String>,
    #[validate(range(min = 1, max = 10000))]
    pub max_pages_to_crawl: Option<u32>,
    #[validate(range(max = 20))]
    pub max_depth: Option<u32>,
    #[validate(custom(function = "validate_cookies"))]
    pub cookie: Option<OneOrMany<CookieDto>>,
    #[validate(range(min = 1, max = 600000))]
    pub wait_for_selector_timeout: Option<u64>,
    pub resource_exclusions: Option<Vec<String>>,
    #[validate(range(min = 1, max = 1024))]
    pub max_file_size: Option<u64>,
    #[validate(range(min = 1, max = 10000000))]
    pub max_tokens: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CookieDto {
    pub name: String,
    pub value: String,
}

/// 请求校验错误
#[derive(Error, Debug)]
pub enum ConfigValidationError {
    /// 请求体无法解析为爬取配置
    #[error("Invalid crawl config: {0}")]
    Malformed(#[from] serde_json::Error),
    /// 字段校验失败
    #[error("Invalid crawl config: {0}")]
    Invalid(#[from] ValidationErrors),
}

impl ConfigValidationError {
    /// 按字段组织的错误详情
    pub fn details(&self) -> Value {
        match self {
            ConfigValidationError::Malformed(e) => json!({
                "payload": [{ "code": "malformed", "message": e.to_string() }]
            }),
            ConfigValidationError::Invalid(errors) => {
                let fields: serde_json::Map<String, Value> = errors
                    .field_errors()
                    .into_iter()
                    .map(|(field, errors)| {
                        let entries = errors
                            .iter()
                            .map(|e| json!({ "code": e.code, "message": e.message, "params": e.params }))
                            .collect();
                        (field.to_string(), Value::Array(entries))
                    })
                    .collect();
                Value::Object(fields)
            }
        }
    }
}

fn invalid(code: &'static str, message: String) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Owned(message))
}

fn validate_seed_scheme(url: &str) -> Result<(), ValidationError> {
    // Unparseable URLs are reported by the `url` check
    match url::Url::parse(url) {
        Ok(parsed) if !matches!(parsed.scheme(), "http" | "https") => Err(invalid(
            "scheme",
            format!("unsupported URL scheme '{}', expected http or https", parsed.scheme()),
        )),
        _ => Ok(()),
    }
}

fn validate_patterns(patterns: &OneOrMany<String>) -> Result<(), ValidationError> {
    let patterns = patterns.as_slice();
    if patterns.is_empty() {
        return Err(invalid("empty", "at least one pattern is required".to_string()));
    }
    for pattern in patterns {
        GlobPattern::compile(pattern).map_err(|e| invalid("glob", e.to_string()))?;
    }
    Ok(())
}

fn validate_selector(selector: &str) -> Result<(), ValidationError> {
    scraper::Selector::parse(selector)
        .map(|_| ())
        .map_err(|e| invalid("selector", format!("invalid CSS selector '{}': {}", selector, e)))
}

fn validate_cookies(cookies: &OneOrMany<CookieDto>) -> Result<(), ValidationError> {
    for cookie in cookies.as_slice() {
        if cookie.name.trim().is_empty() {
            return Err(invalid("cookie", "cookie name cannot be empty".to_string()));
        }
        if cookie.name.contains(['=', ';']) || cookie.value.contains(';') {
            return Err(invalid(
                "cookie",
                format!("cookie '{}' contains reserved characters", cookie.name),
            ));
        }
    }
    Ok(())
}

impl CrawlRequestDto {
    /// 转换为已校验的领域配置
    pub fn into_job_config(self, id: Uuid) -> JobConfig {
        JobConfig {
            id,
            output_file_name: JobConfig::artifact_name(id),
            url: self.url,
            match_patterns: self.match_patterns.into_vec(),
            exclude_patterns: self.exclude.map(OneOrMany::into_vec).unwrap_or_default(),
            selector: self.selector.filter(|s| !s.trim().is_empty()),
            max_pages_to_crawl: self.max_pages_to_crawl.unwrap_or(DEFAULT_MAX_PAGES),
            max_depth: self.max_depth,
            cookies: self
                .cookie
                .map(OneOrMany::into_vec)
                .unwrap_or_default()
                .into_iter()
                .map(|c| Cookie {
                    name: c.name,
                    value: c.value,
                })
                .collect(),
            page_timeout: self
                .wait_for_selector_timeout
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_PAGE_TIMEOUT),
            resource_exclusions: self.resource_exclusions.unwrap_or_default(),
            max_file_size_bytes: self.max_file_size.map(|mb| mb * 1024 * 1024),
            max_tokens: self.max_tokens,
        }
    }
}

/// 校验原始请求并生成爬取配置
///
/// 分配新的任务ID并由其派生产物名称。校验是同步的，失败时没有任何副作用。
pub fn validate_job_request(raw: Value) -> Result<JobConfig, ConfigValidationError> {
    let dto: CrawlRequestDto = serde_json::from_value(raw)?;
    dto.validate()?;
    Ok(dto.into_job_config(Uuid::new_v4()))
}
