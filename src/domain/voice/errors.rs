//! Voice Context - Errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("无效的合成参数: {0}")]
    InvalidSetting(String),
}
