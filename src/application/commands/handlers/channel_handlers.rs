//! Channel Command Handlers

use std::sync::Arc;

use crate::application::commands::channel_commands::*;
use crate::application::error::ApplicationError;
use crate::application::ports::SessionManagerPort;
use crate::infrastructure::memory::ErrorStats;

/// Skip Handler - 停止当前播放，循环继续处理下一条
pub struct SkipHandler {
    session_manager: Arc<dyn SessionManagerPort>,
}

impl SkipHandler {
    pub fn new(session_manager: Arc<dyn SessionManagerPort>) -> Self {
        Self { session_manager }
    }

    pub fn handle(&self, cmd: SkipCommand) -> Result<SkipResponse, ApplicationError> {
        if !self.session_manager.is_attached(&cmd.channel_id) {
            return Err(ApplicationError::not_found("Channel", &cmd.channel_id));
        }

        let skipped = self.session_manager.skip(&cmd.channel_id);

        Ok(SkipResponse {
            channel_id: cmd.channel_id,
            skipped,
        })
    }
}

/// ClearQueue Handler - 丢弃频道的待处理条目
pub struct ClearQueueHandler {
    session_manager: Arc<dyn SessionManagerPort>,
}

impl ClearQueueHandler {
    pub fn new(session_manager: Arc<dyn SessionManagerPort>) -> Self {
        Self { session_manager }
    }

    pub fn handle(&self, cmd: ClearQueueCommand) -> Result<ClearQueueResponse, ApplicationError> {
        let cleared = self.session_manager.clear(&cmd.channel_id);

        tracing::info!(channel_id = %cmd.channel_id, cleared = cleared, "Queue clear requested");

        Ok(ClearQueueResponse {
            channel_id: cmd.channel_id,
            cleared,
        })
    }
}

/// ResetErrorStats Handler
pub struct ResetErrorStatsHandler {
    error_stats: Arc<ErrorStats>,
}

impl ResetErrorStatsHandler {
    pub fn new(error_stats: Arc<ErrorStats>) -> Self {
        Self { error_stats }
    }

    pub fn handle(&self, _cmd: ResetErrorStatsCommand) {
        self.error_stats.reset();
    }
}
