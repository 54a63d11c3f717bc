//! TTS Engine Port - TTS 合成引擎抽象
//!
//! 定义语音合成的抽象接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::VoiceSettings;

/// 单次请求允许的最大字符数
pub const MAX_SYNTHESIS_CHARS: usize = 100;

/// TTS 错误
#[derive(Debug, Error)]
pub enum TtsError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: HTTP {status}: {body}")]
    ServiceError { status: u16, body: String },

    #[error("Empty audio data received")]
    EmptyAudio,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// TTS 合成请求
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    /// 要合成的文本内容
    pub text: String,
    /// 合成参数
    pub settings: VoiceSettings,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>, settings: VoiceSettings) -> Self {
        Self {
            text: text.into(),
            settings,
        }
    }
}

/// TTS Engine Port
///
/// 外部 TTS 服务的抽象接口。失败不重试，由调用方放弃该条朗读。
#[async_trait]
pub trait TtsEnginePort: Send + Sync {
    /// 执行语音合成，返回编码后的音频数据（WAV）
    async fn synthesize(&self, request: SynthesisRequest) -> Result<Vec<u8>, TtsError>;

    /// 检查 TTS 服务是否可用
    async fn health_check(&self) -> bool {
        true // 默认实现
    }
}
