//! 应用层错误定义
//!
//! - ApplicationError: 统一的命令/查询错误类型
//! - PipelineError: 单条朗读处理失败（不会中断频道 worker）

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

use crate::application::ports::{CacheError, PlaybackError, SessionError, TtsError};

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 资源未找到
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 状态无效
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// 存储错误
    #[error("Storage error: {0}")]
    StorageError(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建 NotFound 错误
    pub fn not_found(resource_type: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            resource_type,
            id: id.to_string(),
        }
    }

    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// 创建状态无效错误
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }
}

impl From<CacheError> for ApplicationError {
    fn from(err: CacheError) -> Self {
        Self::StorageError(err.to_string())
    }
}

impl From<SessionError> for ApplicationError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotAttached(channel_id) => Self::invalid_state(format!(
                "Channel {} is not attached to a voice session",
                channel_id
            )),
        }
    }
}

/// 错误分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Normalization,
    Synthesis,
    Cache,
    Playback,
}

impl ErrorCategory {
    pub const ALL: [ErrorCategory; 4] = [
        ErrorCategory::Normalization,
        ErrorCategory::Synthesis,
        ErrorCategory::Cache,
        ErrorCategory::Playback,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Normalization => "normalization",
            ErrorCategory::Synthesis => "synthesis",
            ErrorCategory::Cache => "cache",
            ErrorCategory::Playback => "playback",
        }
    }
}

/// 单条朗读处理错误
///
/// 所有变体都只影响当前条目，worker 继续处理下一条
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Text rejected by normalizer")]
    NormalizationRejected,

    #[error("Synthesis failed: {0}")]
    SynthesisFailed(#[from] TtsError),

    #[error("Cache I/O error: {0}")]
    CacheIo(#[from] CacheError),

    #[error("Playback did not finish within {0:?}")]
    PlaybackTimeout(Duration),

    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),
}

impl PipelineError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PipelineError::NormalizationRejected => ErrorCategory::Normalization,
            PipelineError::SynthesisFailed(_) => ErrorCategory::Synthesis,
            PipelineError::CacheIo(_) => ErrorCategory::Cache,
            PipelineError::PlaybackTimeout(_) | PipelineError::Playback(_) => {
                ErrorCategory::Playback
            }
        }
    }
}
