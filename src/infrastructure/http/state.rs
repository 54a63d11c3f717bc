//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::sync::Arc;

use crate::application::{
    // Command handlers
    ClearQueueHandler, ResetErrorStatsHandler, SkipHandler, SpeakHandler, TextPolicy,
    // Query handlers
    GetCacheStatsHandler, GetErrorStatsHandler, GetQueueHandler, GetVoiceSettingsHandler,
    // Ports
    AudioCachePort, SessionManagerPort,
};
use crate::domain::VoiceSettings;
use crate::infrastructure::memory::ErrorStats;

/// 应用状态
pub struct AppState {
    // ========== Ports ==========
    pub session_manager: Arc<dyn SessionManagerPort>,

    // ========== Command Handlers ==========
    pub speak_handler: SpeakHandler,
    pub skip_handler: SkipHandler,
    pub clear_queue_handler: ClearQueueHandler,
    pub reset_error_stats_handler: ResetErrorStatsHandler,

    // ========== Query Handlers ==========
    pub get_queue_handler: GetQueueHandler,
    pub get_cache_stats_handler: GetCacheStatsHandler,
    pub get_voice_settings_handler: GetVoiceSettingsHandler,
    pub get_error_stats_handler: GetErrorStatsHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        session_manager: Arc<dyn SessionManagerPort>,
        audio_cache: Arc<dyn AudioCachePort>,
        voice_settings: Arc<VoiceSettings>,
        error_stats: Arc<ErrorStats>,
        text_policy: TextPolicy,
    ) -> Self {
        Self {
            session_manager: session_manager.clone(),

            // Command handlers
            speak_handler: SpeakHandler::new(
                session_manager.clone(),
                error_stats.clone(),
                text_policy,
            ),
            skip_handler: SkipHandler::new(session_manager.clone()),
            clear_queue_handler: ClearQueueHandler::new(session_manager.clone()),
            reset_error_stats_handler: ResetErrorStatsHandler::new(error_stats.clone()),

            // Query handlers
            get_queue_handler: GetQueueHandler::new(session_manager),
            get_cache_stats_handler: GetCacheStatsHandler::new(audio_cache),
            get_voice_settings_handler: GetVoiceSettingsHandler::new(voice_settings),
            get_error_stats_handler: GetErrorStatsHandler::new(error_stats),
        }
    }
}
