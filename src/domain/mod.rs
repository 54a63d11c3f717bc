//! Domain Layer - 领域层
//!
//! 包含两个限界上下文:
//! - Channel Context: 频道与朗读队列
//! - Voice Context: 合成参数

pub mod channel;
pub mod voice;

// 共享的文本规范化
mod text_normalizer;

pub use channel::{ChannelId, QueueItem};
pub use text_normalizer::{
    normalize, replace_urls, NormalizeError, NormalizedText, DEFAULT_MAX_LENGTH, URL_PLACEHOLDER,
};
pub use voice::{VoiceError, VoiceSettings};
