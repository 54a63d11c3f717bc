//! Channel Commands - 频道队列控制

use crate::domain::ChannelId;

/// 跳过当前播放
#[derive(Debug, Clone)]
pub struct SkipCommand {
    pub channel_id: ChannelId,
}

#[derive(Debug, Clone)]
pub struct SkipResponse {
    pub channel_id: ChannelId,
    pub skipped: bool,
}

/// 清空待处理队列
#[derive(Debug, Clone)]
pub struct ClearQueueCommand {
    pub channel_id: ChannelId,
}

#[derive(Debug, Clone)]
pub struct ClearQueueResponse {
    pub channel_id: ChannelId,
    pub cleared: usize,
}

/// 重置错误统计
#[derive(Debug, Clone, Default)]
pub struct ResetErrorStatsCommand;
