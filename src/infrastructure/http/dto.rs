//! Data Transfer Objects

use serde::{Deserialize, Serialize};

use crate::domain::ChannelId;

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

/// 空数据响应
#[derive(Debug, Serialize)]
pub struct Empty {}

impl ApiResponse<Empty> {
    /// 成功但无数据
    pub fn ok() -> Self {
        Self::success(Empty {})
    }
}

// ============================================================================
// Speak DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SpeakRequest {
    pub channel_id: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub text: String,
    /// 附件数量
    #[serde(default)]
    pub attachments: usize,
}

#[derive(Debug, Serialize)]
pub struct SpeakResponseDto {
    pub channel_id: ChannelId,
    pub text: String,
    pub queue_length: usize,
}

// ============================================================================
// Channel DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct QueueParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SkipResponseDto {
    pub channel_id: ChannelId,
    pub skipped: bool,
}

#[derive(Debug, Serialize)]
pub struct ClearResponseDto {
    pub channel_id: ChannelId,
    pub cleared: usize,
}
