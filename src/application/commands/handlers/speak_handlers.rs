//! Speak Command Handler

use std::sync::Arc;

use crate::application::commands::speak_commands::*;
use crate::application::error::{ApplicationError, PipelineError};
use crate::application::ports::{SessionError, SessionManagerPort};
use crate::domain::{normalize, QueueItem, DEFAULT_MAX_LENGTH};
use crate::infrastructure::memory::ErrorStats;

/// 附件的默认朗读文本
pub const DEFAULT_ATTACHMENT_LABEL: &str = "ファイル";

/// 入队前的文本处理规则
#[derive(Debug, Clone)]
pub struct TextPolicy {
    pub max_length: usize,
    pub attachment_label: String,
}

impl Default for TextPolicy {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
            attachment_label: DEFAULT_ATTACHMENT_LABEL.to_string(),
        }
    }
}

impl TextPolicy {
    /// 拼接消息正文与附件标签
    fn compose(&self, text: &str, attachments: usize) -> String {
        let text = text.trim();
        match (text.is_empty(), attachments > 0) {
            (_, false) => text.to_string(),
            (true, true) => self.attachment_label.clone(),
            (false, true) => format!("{} {}", text, self.attachment_label),
        }
    }
}

/// Speak Handler - 规范化文本并加入频道队列
pub struct SpeakHandler {
    session_manager: Arc<dyn SessionManagerPort>,
    error_stats: Arc<ErrorStats>,
    policy: TextPolicy,
}

impl SpeakHandler {
    pub fn new(
        session_manager: Arc<dyn SessionManagerPort>,
        error_stats: Arc<ErrorStats>,
        policy: TextPolicy,
    ) -> Self {
        Self {
            session_manager,
            error_stats,
            policy,
        }
    }

    pub fn handle(&self, cmd: SpeakCommand) -> Result<SpeakResponse, ApplicationError> {
        // 未绑定播放端的频道直接忽略
        if !self.session_manager.is_attached(&cmd.channel_id) {
            tracing::debug!(channel_id = %cmd.channel_id, "Speak ignored: channel not attached");
            return Err(SessionError::NotAttached(cmd.channel_id).into());
        }

        let raw = self.policy.compose(&cmd.text, cmd.attachments);
        let text = normalize(&raw, self.policy.max_length).map_err(|_| {
            self.error_stats.record(&PipelineError::NormalizationRejected);
            ApplicationError::validation("Nothing to read aloud")
        })?;

        let queued_text = text.as_str().to_string();
        let item = QueueItem::new(text, cmd.author.clone());
        let queue_length = self.session_manager.enqueue(&cmd.channel_id, item)?;

        tracing::info!(
            channel_id = %cmd.channel_id,
            author = %cmd.author,
            chars = queued_text.chars().count(),
            queue_length = queue_length,
            "Utterance queued"
        );

        Ok(SpeakResponse {
            channel_id: cmd.channel_id,
            text: queued_text,
            queue_length,
        })
    }
}
