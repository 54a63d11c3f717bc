//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（TtsEngine、AudioCache、PlaybackSink、SessionManager）
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;

// Re-exports
pub use commands::{
    handlers::{
        ClearQueueHandler, ResetErrorStatsHandler, SkipHandler, SpeakHandler, TextPolicy,
        DEFAULT_ATTACHMENT_LABEL,
    },
    ClearQueueCommand, ClearQueueResponse, ResetErrorStatsCommand, SkipCommand, SkipResponse,
    SpeakCommand, SpeakResponse,
};

pub use error::{ApplicationError, ErrorCategory, PipelineError};

pub use ports::{
    compute_cache_key, AudioCachePort, CacheError, CacheKey, CacheLookup, CacheMetadata,
    CacheStats, CleanupResult, PlaybackError, PlaybackSink, QueueSnapshot, QueuedPreview,
    SessionError, SessionManagerPort, SynthesisRequest, TtsEnginePort, TtsError,
};

pub use queries::{
    handlers::{
        CacheStatsResponse, GetCacheStatsHandler, GetErrorStatsHandler, GetQueueHandler,
        GetVoiceSettingsHandler,
    },
    GetCacheStats, GetErrorStats, GetQueue, GetVoiceSettings, DEFAULT_PREVIEW_LIMIT,
};
