//! Audio Cache Port - 音频缓存管理
//!
//! 定义音频缓存的抽象接口，具体实现使用文件系统 (TTL + LRU)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::domain::VoiceSettings;

/// 缓存 key 长度（十六进制字符数）
pub const CACHE_KEY_LEN: usize = 16;

/// Audio Cache 错误
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        CacheError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::SerializationError(err.to_string())
    }
}

/// 缓存 key
///
/// 由 (文本, 合成参数) 计算得到，一经生成不再改变
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 从文件名恢复 key（仅接受合法的十六进制 key）
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.len() == CACHE_KEY_LEN && raw.bytes().all(|b| b.is_ascii_hexdigit()) {
            Some(Self(raw.to_ascii_lowercase()))
        } else {
            None
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// 生成缓存 key
///
/// sha256({"settings": <key 排序后的参数>, "text": text}) 的前 16 位十六进制
pub fn compute_cache_key(text: &str, settings: &VoiceSettings) -> CacheKey {
    let canonical = serde_json::json!({
        "text": text,
        "settings": settings.canonical_value(),
    });
    let digest = Sha256::digest(canonical.to_string().as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(CACHE_KEY_LEN);
    CacheKey(hex)
}

/// 缓存查找结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLookup {
    Hit,
    Miss,
}

impl CacheLookup {
    pub fn is_hit(&self) -> bool {
        matches!(self, CacheLookup::Hit)
    }
}

/// 缓存元数据（与音频文件一起持久化）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMetadata {
    /// 原始文本
    pub text: String,
    /// 合成参数快照
    pub settings: VoiceSettings,
    /// 创建时间（Unix 秒）
    pub created_at: f64,
    /// 访问次数
    pub access_count: u64,
    /// 最后访问时间（Unix 秒）
    pub last_accessed: f64,
}

impl CacheMetadata {
    pub fn new(text: impl Into<String>, settings: VoiceSettings, now: f64) -> Self {
        Self {
            text: text.into(),
            settings,
            created_at: now,
            access_count: 1,
            last_accessed: now,
        }
    }

    /// 是否已过期
    pub fn is_expired(&self, ttl_secs: f64, now: f64) -> bool {
        now > self.created_at + ttl_secs
    }

    /// 记录一次访问
    pub fn touch(&mut self, now: f64) {
        self.access_count += 1;
        self.last_accessed = now;
    }
}

/// 缓存统计信息
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    pub entry_count: usize,
    pub total_bytes: u64,
    pub max_size_bytes: u64,
    pub ttl_secs: u64,
}

impl CacheStats {
    /// 使用率（百分比）
    pub fn usage_percent(&self) -> f64 {
        if self.max_size_bytes == 0 {
            return 0.0;
        }
        self.total_bytes as f64 / self.max_size_bytes as f64 * 100.0
    }
}

/// 清理结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupResult {
    /// 删除的条目数量
    pub deleted_entries: u64,
    /// 释放的空间（字节）
    pub freed_bytes: u64,
}

/// Audio Cache Port
///
/// 基于 (text, settings) 内容寻址的持久化缓存
/// - 过期条目在 lookup 时惰性删除
/// - 超过容量时按 (last_accessed, access_count) 升序淘汰
#[async_trait]
pub trait AudioCachePort: Send + Sync {
    /// 检查缓存是否存在且未过期
    ///
    /// 过期条目会被删除并返回 Miss
    async fn lookup(&self, key: &CacheKey) -> Result<CacheLookup, CacheError>;

    /// 获取音频数据
    ///
    /// 命中时更新 access_count 与 last_accessed
    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError>;

    /// 存储音频数据
    ///
    /// 空数据不写入；写入后检查容量，必要时执行淘汰
    async fn put(
        &self,
        key: &CacheKey,
        text: &str,
        settings: &VoiceSettings,
        audio_data: &[u8],
    ) -> Result<(), CacheError>;

    /// 删除缓存条目
    async fn remove(&self, key: &CacheKey) -> Result<(), CacheError>;

    /// 超过容量时按 LRU 淘汰至容量的 80%
    async fn evict_if_over_capacity(&self) -> Result<CleanupResult, CacheError>;

    /// 删除所有过期条目
    async fn sweep_expired(&self) -> Result<CleanupResult, CacheError>;

    /// 获取缓存统计信息
    async fn stats(&self) -> Result<CacheStats, CacheError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_is_deterministic() {
        let settings = VoiceSettings::default();
        let a = compute_cache_key("こんにちは", &settings);
        let b = compute_cache_key("こんにちは", &settings);
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), CACHE_KEY_LEN);
    }

    #[test]
    fn test_cache_key_changes_with_text() {
        let settings = VoiceSettings::default();
        assert_ne!(
            compute_cache_key("hello", &settings),
            compute_cache_key("hello!", &settings)
        );
    }

    #[test]
    fn test_cache_key_changes_with_any_setting() {
        let base = VoiceSettings::default();
        let base_key = compute_cache_key("hello", &base);

        let variants: Vec<VoiceSettings> = vec![
            VoiceSettings { model_id: 8, ..base.clone() },
            VoiceSettings { speaker_id: 1, ..base.clone() },
            VoiceSettings { style: "Happy".to_string(), ..base.clone() },
            VoiceSettings { sdp_ratio: 0.3, ..base.clone() },
            VoiceSettings { noise: 0.5, ..base.clone() },
            VoiceSettings { noisew: 0.9, ..base.clone() },
            VoiceSettings { length: 1.2, ..base.clone() },
            VoiceSettings { language: "EN".to_string(), ..base.clone() },
            VoiceSettings { auto_split: false, ..base.clone() },
            VoiceSettings { split_interval: 1.0, ..base.clone() },
        ];

        for variant in variants {
            assert_ne!(compute_cache_key("hello", &variant), base_key, "{:?}", variant);
        }
    }

    #[test]
    fn test_cache_key_parse() {
        let key = compute_cache_key("hello", &VoiceSettings::default());
        assert_eq!(CacheKey::parse(key.as_str()), Some(key));
        assert_eq!(CacheKey::parse("not-a-key"), None);
        assert_eq!(CacheKey::parse("zzzzzzzzzzzzzzzz"), None);
    }

    #[test]
    fn test_metadata_expiry() {
        let meta = CacheMetadata::new("hi", VoiceSettings::default(), 1000.0);
        assert!(!meta.is_expired(60.0, 1060.0));
        assert!(meta.is_expired(60.0, 1060.5));
    }

    #[test]
    fn test_usage_percent() {
        let stats = CacheStats {
            entry_count: 1,
            total_bytes: 50,
            max_size_bytes: 200,
            ttl_secs: 3600,
        };
        assert_eq!(stats.usage_percent(), 25.0);
    }
}
