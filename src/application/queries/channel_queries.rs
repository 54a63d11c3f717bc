//! Channel Queries

use crate::domain::ChannelId;

/// 队列预览默认条数
pub const DEFAULT_PREVIEW_LIMIT: usize = 5;

/// 查询频道队列
#[derive(Debug, Clone)]
pub struct GetQueue {
    pub channel_id: ChannelId,
    pub limit: usize,
}

impl GetQueue {
    pub fn new(channel_id: ChannelId) -> Self {
        Self {
            channel_id,
            limit: DEFAULT_PREVIEW_LIMIT,
        }
    }
}
