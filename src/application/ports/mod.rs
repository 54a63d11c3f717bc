//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_cache;
mod playback_sink;
mod session_manager;
mod tts_engine;

pub use audio_cache::{
    compute_cache_key, AudioCachePort, CacheError, CacheKey, CacheLookup, CacheMetadata,
    CacheStats, CleanupResult, CACHE_KEY_LEN,
};
pub use playback_sink::{PlaybackError, PlaybackSink};
pub use session_manager::{QueueSnapshot, QueuedPreview, SessionError, SessionManagerPort};
pub use tts_engine::{SynthesisRequest, TtsEnginePort, TtsError, MAX_SYNTHESIS_CHARS};
