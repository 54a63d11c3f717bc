//! Speak Commands - 朗读请求

use crate::domain::ChannelId;

/// 朗读命令 - 来自外部的一条消息
#[derive(Debug, Clone)]
pub struct SpeakCommand {
    pub channel_id: ChannelId,
    pub author: String,
    pub text: String,
    /// 附件数量
    pub attachments: usize,
}

/// 朗读响应
#[derive(Debug, Clone)]
pub struct SpeakResponse {
    pub channel_id: ChannelId,
    /// 规范化后实际入队的文本
    pub text: String,
    /// 入队后的队列长度
    pub queue_length: usize,
}
