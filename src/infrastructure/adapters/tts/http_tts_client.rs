//! HTTP TTS Client - 调用 Style-Bert-VITS2 HTTP 服务
//!
//! 实现 TtsEnginePort trait
//!
//! Style-Bert-VITS2 API:
//! POST {base}/voice?text=...&model_id=...&speaker_id=...&style=...&auto_split=true ...
//! Response: audio/wav binary
//! GET  {base}/models/info
//! Response: JSON object keyed by model id

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::application::ports::{SynthesisRequest, TtsEnginePort, TtsError, MAX_SYNTHESIS_CHARS};

/// HTTP TTS 客户端配置
#[derive(Debug, Clone)]
pub struct HttpTtsClientConfig {
    /// TTS 服务基础 URL
    pub base_url: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for HttpTtsClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_secs: 10,
        }
    }
}

impl HttpTtsClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HTTP TTS 客户端
///
/// 内部的 reqwest::Client 复用连接池，无重试
pub struct HttpTtsClient {
    client: Client,
    base_url: String,
}

impl HttpTtsClient {
    /// 创建新的 HTTP TTS 客户端
    pub fn new(config: HttpTtsClientConfig) -> Result<Self, TtsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TtsError::NetworkError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn voice_url(&self) -> String {
        format!("{}/voice", self.base_url)
    }

    fn models_info_url(&self) -> String {
        format!("{}/models/info", self.base_url)
    }

    /// 获取可用模型信息
    pub async fn models_info(&self) -> Result<serde_json::Value, TtsError> {
        let response = self
            .client
            .get(self.models_info_url())
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TtsError::ServiceError {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| TtsError::InvalidResponse(e.to_string()))
    }
}

/// 将传输层错误归类
fn classify_transport_error(e: reqwest::Error) -> TtsError {
    if e.is_timeout() {
        TtsError::Timeout
    } else if e.is_connect() {
        TtsError::NetworkError(format!("Cannot connect to TTS service: {}", e))
    } else {
        TtsError::NetworkError(e.to_string())
    }
}

/// 截断到服务端允许的最大字符数
fn clamp_text(text: &str) -> &str {
    match text.char_indices().nth(MAX_SYNTHESIS_CHARS) {
        Some((byte_idx, _)) => {
            tracing::warn!(
                chars = text.chars().count(),
                limit = MAX_SYNTHESIS_CHARS,
                "Synthesis text too long, truncating"
            );
            &text[..byte_idx]
        }
        None => text,
    }
}

/// 组装 /voice 的查询参数
fn build_query(request: &SynthesisRequest) -> Result<Vec<(&'static str, String)>, TtsError> {
    if request.text.trim().is_empty() {
        return Err(TtsError::InvalidRequest("Text cannot be empty".to_string()));
    }
    request
        .settings
        .validate()
        .map_err(|e| TtsError::InvalidRequest(e.to_string()))?;

    let mut query = Vec::with_capacity(11);
    query.push(("text", clamp_text(&request.text).to_string()));
    query.extend(request.settings.to_query_pairs());
    Ok(query)
}

#[async_trait]
impl TtsEnginePort for HttpTtsClient {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<Vec<u8>, TtsError> {
        let query = build_query(&request)?;

        tracing::debug!(
            url = %self.voice_url(),
            text_len = request.text.chars().count(),
            model_id = request.settings.model_id,
            style = %request.settings.style,
            "Sending TTS synthesis request"
        );

        let response = self
            .client
            .post(self.voice_url())
            .query(&query)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = %body, "TTS service error");
            return Err(TtsError::ServiceError {
                status: status.as_u16(),
                body,
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.starts_with("audio/") {
            tracing::warn!(content_type = %content_type, "Unexpected content type from TTS service");
        }

        let audio_data = response
            .bytes()
            .await
            .map_err(|e| TtsError::InvalidResponse(format!("Failed to read audio: {}", e)))?
            .to_vec();

        if audio_data.is_empty() {
            return Err(TtsError::EmptyAudio);
        }

        tracing::debug!(audio_size = audio_data.len(), "TTS synthesis completed");

        Ok(audio_data)
    }

    async fn health_check(&self) -> bool {
        match self.models_info().await {
            Ok(models) => {
                let count = models.as_object().map_or(0, |m| m.len());
                tracing::info!(models = count, "TTS service reachable");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "TTS service health check failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::VoiceSettings;

    #[test]
    fn test_config_default() {
        let config = HttpTtsClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:5000");
        assert_eq!(config.timeout_secs, 10);
    }

    #[test]
    fn test_config_builder() {
        let config = HttpTtsClientConfig::new("http://example.com:9000/").with_timeout(60);
        assert_eq!(config.timeout_secs, 60);

        let client = HttpTtsClient::new(config).unwrap();
        assert_eq!(client.voice_url(), "http://example.com:9000/voice");
        assert_eq!(client.models_info_url(), "http://example.com:9000/models/info");
    }

    #[test]
    fn test_build_query_contains_all_parameters() {
        let request = SynthesisRequest::new("こんにちは", VoiceSettings::default());
        let query = build_query(&request).unwrap();

        let keys: Vec<&str> = query.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            keys,
            vec![
                "text",
                "model_id",
                "speaker_id",
                "style",
                "sdp_ratio",
                "noise",
                "noisew",
                "length",
                "language",
                "auto_split",
                "split_interval",
            ]
        );
        assert_eq!(query[0].1, "こんにちは");
    }

    #[test]
    fn test_build_query_truncates_long_text() {
        let long = "あ".repeat(150);
        let request = SynthesisRequest::new(long, VoiceSettings::default());
        let query = build_query(&request).unwrap();
        assert_eq!(query[0].1.chars().count(), MAX_SYNTHESIS_CHARS);
    }

    #[test]
    fn test_build_query_rejects_empty_text() {
        let request = SynthesisRequest::new("   ", VoiceSettings::default());
        assert!(matches!(
            build_query(&request),
            Err(TtsError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_network_error() {
        // 端口 9 (discard) 通常没有 HTTP 服务
        let client =
            HttpTtsClient::new(HttpTtsClientConfig::new("http://127.0.0.1:9").with_timeout(2))
                .unwrap();

        let result = client
            .synthesize(SynthesisRequest::new("hello", VoiceSettings::default()))
            .await;
        assert!(matches!(
            result,
            Err(TtsError::NetworkError(_)) | Err(TtsError::Timeout)
        ));
        assert!(!client.health_check().await);
    }
}
