//! Channel Context - Value Objects

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::NormalizedText;

/// 频道唯一标识（语音会话所在的频道）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(String);

impl ChannelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ChannelId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 队列条目 - 一次朗读
///
/// 创建后不可变，由 worker 消费后丢弃
#[derive(Debug, Clone, Serialize)]
pub struct QueueItem {
    text: NormalizedText,
    author: String,
    enqueued_at: DateTime<Utc>,
}

impl QueueItem {
    pub fn new(text: NormalizedText, author: impl Into<String>) -> Self {
        Self {
            text,
            author: author.into(),
            enqueued_at: Utc::now(),
        }
    }

    pub fn text(&self) -> &NormalizedText {
        &self.text
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn enqueued_at(&self) -> DateTime<Utc> {
        self.enqueued_at
    }
}
