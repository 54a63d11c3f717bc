//! Stats Query Handlers

use serde::Serialize;
use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::AudioCachePort;
use crate::application::queries::{GetCacheStats, GetErrorStats, GetVoiceSettings};
use crate::domain::VoiceSettings;
use crate::infrastructure::memory::{ErrorStats, ErrorStatsSnapshot};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// 缓存统计响应
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsResponse {
    pub entry_count: usize,
    pub total_bytes: u64,
    pub total_mb: f64,
    pub max_size_mb: f64,
    pub usage_percent: f64,
    pub ttl_hours: f64,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// GetCacheStats Handler
pub struct GetCacheStatsHandler {
    audio_cache: Arc<dyn AudioCachePort>,
}

impl GetCacheStatsHandler {
    pub fn new(audio_cache: Arc<dyn AudioCachePort>) -> Self {
        Self { audio_cache }
    }

    pub async fn handle(
        &self,
        _query: GetCacheStats,
    ) -> Result<CacheStatsResponse, ApplicationError> {
        let stats = self.audio_cache.stats().await?;

        Ok(CacheStatsResponse {
            entry_count: stats.entry_count,
            total_bytes: stats.total_bytes,
            total_mb: round2(stats.total_bytes as f64 / BYTES_PER_MB),
            max_size_mb: round2(stats.max_size_bytes as f64 / BYTES_PER_MB),
            usage_percent: round2(stats.usage_percent()),
            ttl_hours: round2(stats.ttl_secs as f64 / 3600.0),
        })
    }
}

/// GetVoiceSettings Handler
pub struct GetVoiceSettingsHandler {
    voice_settings: Arc<VoiceSettings>,
}

impl GetVoiceSettingsHandler {
    pub fn new(voice_settings: Arc<VoiceSettings>) -> Self {
        Self { voice_settings }
    }

    pub fn handle(&self, _query: GetVoiceSettings) -> VoiceSettings {
        self.voice_settings.as_ref().clone()
    }
}

/// GetErrorStats Handler
pub struct GetErrorStatsHandler {
    error_stats: Arc<ErrorStats>,
}

impl GetErrorStatsHandler {
    pub fn new(error_stats: Arc<ErrorStats>) -> Self {
        Self { error_stats }
    }

    pub fn handle(&self, _query: GetErrorStats) -> ErrorStatsSnapshot {
        self.error_stats.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::compute_cache_key;
    use crate::infrastructure::persistence::file::{FileAudioCache, FileCacheConfig};
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_cache_stats_response() {
        let dir = TempDir::new().unwrap();
        let cache = FileAudioCache::new(FileCacheConfig {
            cache_dir: dir.path().to_path_buf(),
            ttl: Duration::from_secs(24 * 3600),
            max_size_bytes: 1024 * 1024,
        })
        .await
        .unwrap();

        let settings = VoiceSettings::default();
        let key = compute_cache_key("hello", &settings);
        cache
            .put(&key, "hello", &settings, &vec![0u8; 10 * 1024])
            .await
            .unwrap();

        let handler = GetCacheStatsHandler::new(Arc::new(cache));
        let response = handler.handle(GetCacheStats).await.unwrap();

        assert_eq!(response.entry_count, 1);
        assert_eq!(response.max_size_mb, 1.0);
        assert_eq!(response.ttl_hours, 24.0);
        assert!(response.usage_percent > 0.9 && response.usage_percent < 1.5);
    }

    #[test]
    fn test_voice_settings_view() {
        let handler = GetVoiceSettingsHandler::new(Arc::new(VoiceSettings::default()));
        assert_eq!(handler.handle(GetVoiceSettings), VoiceSettings::default());
    }
}
