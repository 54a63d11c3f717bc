//! Fake TTS Client - 用于测试的 TTS 客户端
//!
//! 不调用外部服务，返回由文本生成的伪音频数据

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::application::ports::{SynthesisRequest, TtsEnginePort, TtsError};

/// 伪音频数据的前缀
pub const FAKE_AUDIO_HEADER: &[u8] = b"RIFF";

/// Fake TTS Client 配置
#[derive(Debug, Clone, Default)]
pub struct FakeTtsClientConfig {
    /// 模拟合成延迟
    pub latency: Duration,
    /// 这些文本的合成请求返回错误
    pub failing_texts: HashSet<String>,
    /// 这些文本返回空音频
    pub empty_texts: HashSet<String>,
}

impl FakeTtsClientConfig {
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn failing_on(mut self, text: impl Into<String>) -> Self {
        self.failing_texts.insert(text.into());
        self
    }

    pub fn empty_on(mut self, text: impl Into<String>) -> Self {
        self.empty_texts.insert(text.into());
        self
    }
}

/// Fake TTS Client
pub struct FakeTtsClient {
    config: FakeTtsClientConfig,
    calls: AtomicUsize,
}

impl FakeTtsClient {
    pub fn new(config: FakeTtsClientConfig) -> Self {
        Self {
            config,
            calls: AtomicUsize::new(0),
        }
    }

    /// 合成请求次数
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// 给定文本对应的伪音频
    pub fn audio_for(text: &str) -> Vec<u8> {
        let mut audio = FAKE_AUDIO_HEADER.to_vec();
        audio.extend_from_slice(text.as_bytes());
        audio
    }

    /// 从伪音频中还原文本
    pub fn text_of(audio: &[u8]) -> Option<&str> {
        audio
            .strip_prefix(FAKE_AUDIO_HEADER)
            .and_then(|rest| std::str::from_utf8(rest).ok())
    }
}

impl Default for FakeTtsClient {
    fn default() -> Self {
        Self::new(FakeTtsClientConfig::default())
    }
}

#[async_trait]
impl TtsEnginePort for FakeTtsClient {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<Vec<u8>, TtsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }

        if self.config.failing_texts.contains(&request.text) {
            return Err(TtsError::ServiceError {
                status: 500,
                body: "fake failure".to_string(),
            });
        }
        if self.config.empty_texts.contains(&request.text) {
            return Err(TtsError::EmptyAudio);
        }

        Ok(Self::audio_for(&request.text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::VoiceSettings;

    #[tokio::test]
    async fn test_fake_audio_round_trip() {
        let client = FakeTtsClient::default();
        let audio = client
            .synthesize(SynthesisRequest::new("hello", VoiceSettings::default()))
            .await
            .unwrap();

        assert_eq!(FakeTtsClient::text_of(&audio), Some("hello"));
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_configured_failures() {
        let client = FakeTtsClient::new(
            FakeTtsClientConfig::default()
                .failing_on("boom")
                .empty_on("silence"),
        );

        let settings = VoiceSettings::default();
        assert!(matches!(
            client.synthesize(SynthesisRequest::new("boom", settings.clone())).await,
            Err(TtsError::ServiceError { status: 500, .. })
        ));
        assert!(matches!(
            client.synthesize(SynthesisRequest::new("silence", settings)).await,
            Err(TtsError::EmptyAudio)
        ));
        assert_eq!(client.call_count(), 2);
    }
}
