//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml / config.local.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 环境变量前缀
const ENV_PREFIX: &str = "YOMIAGE";

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `YOMIAGE_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `YOMIAGE_SERVER__PORT=8080`
/// - `YOMIAGE_TTS__URL=http://sbv2:5000`
/// - `YOMIAGE_VOICE__MODEL_ID=3`
/// - `YOMIAGE_CACHE__MAX_SIZE_MB=1024`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级），voice 段由 VoiceSettings 自身的 serde 默认值补齐
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5060)?
        .set_default("tts.url", "http://localhost:5000")?
        .set_default("tts.timeout_secs", 10)?
        .set_default("cache.dir", "cache")?
        .set_default("cache.ttl_hours", 24)?
        .set_default("cache.max_size_mb", 500)?
        .set_default("cache.sweep_interval_secs", 3600)?
        .set_default("text.max_length", 100)?
        .set_default("playback.poll_interval_ms", 100)?
        .set_default("playback.timeout_secs", 30)?
        .set_default("playback.gap_ms", 500)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 注意: 环境变量名会被转换为小写
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.tts.url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "TTS URL cannot be empty".to_string(),
        ));
    }

    if config.tts.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "TTS timeout cannot be 0".to_string(),
        ));
    }

    if config.cache.dir.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "Cache directory cannot be empty".to_string(),
        ));
    }

    if config.cache.ttl_hours == 0 {
        return Err(ConfigError::ValidationError(
            "Cache TTL cannot be 0".to_string(),
        ));
    }

    if config.cache.sweep_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Cache sweep interval cannot be 0".to_string(),
        ));
    }

    if config.text.max_length == 0 {
        return Err(ConfigError::ValidationError(
            "Text max_length cannot be 0".to_string(),
        ));
    }

    if config.playback.poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "Playback poll interval cannot be 0".to_string(),
        ));
    }

    config
        .voice
        .validate()
        .map_err(|e| ConfigError::ValidationError(format!("Invalid voice settings: {}", e)))?;

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}", config.server.addr());
    tracing::info!("TTS URL: {}", config.tts.url);
    tracing::info!("TTS Timeout: {}s", config.tts.timeout_secs);
    tracing::info!(
        "Voice: model_id={} speaker_id={} style={} language={}",
        config.voice.model_id,
        config.voice.speaker_id,
        config.voice.style,
        config.voice.language
    );
    tracing::info!("Cache Directory: {:?}", config.cache.dir);
    tracing::info!(
        "Cache Limits: ttl={}h max={}MB sweep={}s",
        config.cache.ttl_hours,
        config.cache.max_size_mb,
        config.cache.sweep_interval_secs
    );
    tracing::info!("Text Max Length: {}", config.text.max_length);
    tracing::info!(
        "Playback: poll={}ms timeout={}s gap={}ms",
        config.playback.poll_interval_ms,
        config.playback.timeout_secs,
        config.playback.gap_ms
    );
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
