//! 文本规范化
//!
//! 将聊天消息转换为可朗读的文本：去除首尾空白、替换 URL、限制长度

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use thiserror::Error;

/// 默认最大字符数
pub const DEFAULT_MAX_LENGTH: usize = 100;

/// URL 替换后的占位符
pub const URL_PLACEHOLDER: &str = "URL";

/// 严格的 URL 模式（scheme + host + port + path + query + fragment）
static STRICT_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)https?://[-\w.]+(?::[0-9]+)?(?:/[\w/_.]*(?:\?[\w&=%.]*)?(?:#[\w.]*)?)?|ftp://[-\w.]+(?::[0-9]+)?(?:/[\w/_.]*)?",
    )
    .expect("valid regex")
});

/// 宽松的 URL 模式，兜底处理严格模式无法识别的 URL
static FALLBACK_URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:https?|ftp)://\S+").expect("valid regex"));

/// 规范化失败
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("Text is empty after normalization")]
    Rejected,
}

/// 规范化后的文本
///
/// 不变量:
/// - 非空且不全是空白
/// - 字符数不超过 max_length
/// - URL 已替换为占位符
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct NormalizedText(String);

impl NormalizedText {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 字符数（非字节数）
    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }
}

impl AsRef<str> for NormalizedText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NormalizedText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// 替换文本中的 URL
///
/// 先用严格模式替换，再用宽松模式兜底
pub fn replace_urls(text: &str) -> String {
    let replaced = STRICT_URL_PATTERN.replace_all(text, URL_PLACEHOLDER);
    let replaced = FALLBACK_URL_PATTERN.replace_all(&replaced, URL_PLACEHOLDER);
    replaced.into_owned()
}

/// 按字符数截断
fn truncate_chars(text: &str, max_length: usize) -> &str {
    match text.char_indices().nth(max_length) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// 规范化一条消息文本
///
/// 处理顺序：trim → URL 替换 → 截断 → 校验
pub fn normalize(raw: &str, max_length: usize) -> Result<NormalizedText, NormalizeError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(NormalizeError::Rejected);
    }

    let replaced = replace_urls(trimmed);
    let truncated = truncate_chars(&replaced, max_length);

    if truncated.trim().is_empty() {
        tracing::debug!(raw_len = raw.len(), "Text rejected after normalization");
        return Err(NormalizeError::Rejected);
    }

    if truncated.len() != raw.len() {
        tracing::debug!(
            raw_chars = raw.chars().count(),
            normalized_chars = truncated.chars().count(),
            "Text normalized"
        );
    }

    Ok(NormalizedText(truncated.to_string()))
}
