// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use regex::Regex;
use thiserror::Error;

#[derive(Error, Debug)]
#[error("Invalid glob pattern '{pattern}': {reason}")]
pub struct PatternError {
    pub pattern: String,
    pub reason: String,
}

/// URL glob 模式
///
/// 支持 `**`（任意字符）、`*`（除 `/` 外的任意字符）、`?`（除 `/` 外的单个字符）
/// 以及 `{a,b}` 形式的分支
#[derive(Debug, Clone)]
pub struct GlobPattern {
    source: String,
    regex: Regex,
}

impl GlobPattern {
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        let error = |reason: &str| PatternError {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        if pattern.trim().is_empty() {
            return Err(error("pattern is empty"));
        }

        let mut out = String::with_capacity(pattern.len() * 2);
        out.push('^');
        let mut chars = pattern.chars().peekable();
        let mut in_group = false;

        while let Some(c) = chars.next() {
            match c {
                '*' => {
                    if chars.peek() == Some(&'*') {
                        chars.next();
                        out.push_str(".*");
                    } else {
                        out.push_str("[^/]*");
                    }
                }
                '?' => out.push_str("[^/]"),
                '{' if !in_group => {
                    in_group = true;
                    out.push_str("(?:");
                }
                '{' => return Err(error("nested braces are not supported")),
                ',' if in_group => out.push('|'),
                '}' if in_group => {
                    in_group = false;
                    out.push(')');
                }
                other => {
                    let mut buf = [0u8; 4];
                    out.push_str(&regex::escape(other.encode_utf8(&mut buf)));
                }
            }
        }

        if in_group {
            return Err(error("unclosed brace"));
        }
        out.push('$');

        let regex = Regex::new(&out).map_err(|e| error(&e.to_string()))?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, url: &str) -> bool {
        self.regex.is_match(url)
    }
}

/// 链接过滤器
///
/// 链接必须匹配至少一个包含模式，且不能匹配任何排除模式或被排除的资源扩展名
#[derive(Debug, Clone)]
pub struct LinkMatcher {
    include: Vec<GlobPattern>,
    exclude: Vec<GlobPattern>,
    resource_exclusions: Vec<String>,
}

impl LinkMatcher {
    pub fn new(
        include: &[String],
        exclude: &[String],
        resource_exclusions: &[String],
    ) -> Result<Self, PatternError> {
        Ok(Self {
            include: include
                .iter()
                .map(|p| GlobPattern::compile(p))
                .collect::<Result<_, _>>()?,
            exclude: exclude
                .iter()
                .map(|p| GlobPattern::compile(p))
                .collect::<Result<_, _>>()?,
            resource_exclusions: resource_exclusions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                .filter(|ext| !ext.is_empty())
                .collect(),
        })
    }

    pub fn is_excluded_resource(&self, url: &url::Url) -> bool {
        let path = url.path().to_ascii_lowercase();
        self.resource_exclusions
            .iter()
            .any(|ext| path.ends_with(&format!(".{}", ext)))
    }

    pub fn allows(&self, url: &url::Url) -> bool {
        let link = url.as_str();
        self.include.iter().any(|p| p.matches(link))
            && !self.exclude.iter().any(|p| p.matches(link))
            && !self.is_excluded_resource(url)
    }
}
