//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::application::DEFAULT_ATTACHMENT_LABEL;
use crate::domain::{VoiceSettings, DEFAULT_MAX_LENGTH};

const BYTES_PER_MB: u64 = 1024 * 1024;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// TTS 服务配置
    #[serde(default)]
    pub tts: TtsConfig,

    /// 默认合成参数
    #[serde(default)]
    pub voice: VoiceSettings,

    /// 音频缓存配置
    #[serde(default)]
    pub cache: CacheConfig,

    /// 文本处理配置
    #[serde(default)]
    pub text: TextConfig,

    /// 播放时序配置
    #[serde(default)]
    pub playback: PlaybackTimingConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5060
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// TTS 服务配置（Style-Bert-VITS2）
#[derive(Debug, Clone, Deserialize)]
pub struct TtsConfig {
    /// TTS 服务基础 URL
    #[serde(default = "default_tts_url")]
    pub url: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_tts_timeout")]
    pub timeout_secs: u64,
}

fn default_tts_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_tts_timeout() -> u64 {
    10
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            url: default_tts_url(),
            timeout_secs: default_tts_timeout(),
        }
    }
}

/// 音频缓存配置
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// 缓存目录
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,

    /// 条目存活时间（小时）
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: u64,

    /// 最大缓存大小（MB）
    #[serde(default = "default_max_size_mb")]
    pub max_size_mb: u64,

    /// 过期清扫间隔（秒）
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("cache")
}

fn default_ttl_hours() -> u64 {
    24
}

fn default_max_size_mb() -> u64 {
    500
}

fn default_sweep_interval() -> u64 {
    3600
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
            ttl_hours: default_ttl_hours(),
            max_size_mb: default_max_size_mb(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_hours * 3600)
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_mb.saturating_mul(BYTES_PER_MB)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// 文本处理配置
#[derive(Debug, Clone, Deserialize)]
pub struct TextConfig {
    /// 最大朗读字符数（超出部分截断）
    #[serde(default = "default_max_length")]
    pub max_length: usize,

    /// 带附件消息追加的朗读文本
    #[serde(default = "default_attachment_label")]
    pub attachment_label: String,
}

fn default_max_length() -> usize {
    DEFAULT_MAX_LENGTH
}

fn default_attachment_label() -> String {
    DEFAULT_ATTACHMENT_LABEL.to_string()
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            max_length: default_max_length(),
            attachment_label: default_attachment_label(),
        }
    }
}

/// 播放时序配置
#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackTimingConfig {
    /// 播放状态轮询间隔（毫秒）
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// 单条播放超时（秒）
    #[serde(default = "default_playback_timeout")]
    pub timeout_secs: u64,

    /// 朗读间隔（毫秒）
    #[serde(default = "default_gap")]
    pub gap_ms: u64,
}

fn default_poll_interval() -> u64 {
    100
}

fn default_playback_timeout() -> u64 {
    30
}

fn default_gap() -> u64 {
    500
}

impl Default for PlaybackTimingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            timeout_secs: default_playback_timeout(),
            gap_ms: default_gap(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否输出 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.addr(), "0.0.0.0:5060");
        assert_eq!(config.tts.url, "http://localhost:5000");
        assert_eq!(config.tts.timeout_secs, 10);
        assert_eq!(config.cache.ttl(), Duration::from_secs(24 * 3600));
        assert_eq!(config.cache.max_size_bytes(), 500 * 1024 * 1024);
        assert_eq!(config.text.max_length, 100);
        assert_eq!(config.text.attachment_label, "ファイル");
        assert_eq!(config.playback.poll_interval_ms, 100);
        assert_eq!(config.playback.timeout_secs, 30);
        assert_eq!(config.playback.gap_ms, 500);
        assert_eq!(config.voice, VoiceSettings::default());
    }
}
