//! Playback Sink Port - 音频输出端抽象
//!
//! 由外部传输层（语音连接）实现。播放完成不会主动通知，
//! 调用方通过轮询 `is_playing` 观察。

use async_trait::async_trait;
use thiserror::Error;

/// 播放错误
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("Sink disconnected")]
    Disconnected,

    #[error("Playback failed: {0}")]
    Failed(String),
}

/// Playback Sink Port
#[async_trait]
pub trait PlaybackSink: Send + Sync {
    /// 输出端是否仍然连接
    fn is_connected(&self) -> bool;

    /// 开始播放一段音频
    async fn play(&self, audio_data: Vec<u8>) -> Result<(), PlaybackError>;

    /// 是否正在播放
    fn is_playing(&self) -> bool;

    /// 立即停止当前播放
    fn stop(&self);
}
