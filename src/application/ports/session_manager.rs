//! Session Manager Port - 频道会话生命周期管理
//!
//! 定义频道 worker 注册表的抽象接口，具体实现在 infrastructure/memory 层

use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use super::PlaybackSink;
use crate::domain::{ChannelId, QueueItem};

/// Session Manager 错误
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Channel not attached: {0}")]
    NotAttached(ChannelId),
}

/// 队列快照中的单条预览
#[derive(Debug, Clone, Serialize)]
pub struct QueuedPreview {
    pub author: String,
    pub text: String,
}

/// 频道队列快照
#[derive(Debug, Clone, Serialize)]
pub struct QueueSnapshot {
    pub channel_id: ChannelId,
    pub attached: bool,
    pub processing: bool,
    pub length: usize,
    pub items: Vec<QueuedPreview>,
}

/// Session Manager Port
///
/// 管理每个频道的 worker，按需创建，频道关闭且队列排空后移除
pub trait SessionManagerPort: Send + Sync {
    /// 绑定输出端（频道加入语音会话）
    fn attach(&self, channel_id: ChannelId, sink: Arc<dyn PlaybackSink>);

    /// 解绑输出端（频道离开语音会话）
    fn detach(&self, channel_id: &ChannelId);

    /// 仅当当前输出端正是 `sink` 时解绑（连接断开时使用）
    fn detach_sink(&self, channel_id: &ChannelId, sink: &Arc<dyn PlaybackSink>);

    /// 频道是否绑定了已连接的输出端
    fn is_attached(&self, channel_id: &ChannelId) -> bool;

    /// 加入朗读队列，返回入队后的队列长度
    fn enqueue(&self, channel_id: &ChannelId, item: QueueItem) -> Result<usize, SessionError>;

    /// 清空待朗读队列，返回删除的条目数
    fn clear(&self, channel_id: &ChannelId) -> usize;

    /// 跳过当前朗读，返回是否有正在播放的音频
    fn skip(&self, channel_id: &ChannelId) -> bool;

    /// 获取队列快照（最多 `limit` 条预览）
    fn snapshot(&self, channel_id: &ChannelId, limit: usize) -> Option<QueueSnapshot>;

    /// 获取所有频道 ID
    fn list_all(&self) -> Vec<ChannelId>;
}
