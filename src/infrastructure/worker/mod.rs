//! Worker Layer - Background Task Processing
//!
//! 每个频道一个播放循环

mod channel_worker;

pub use channel_worker::{ChannelWorker, PipelineContext, PlaybackConfig, WorkerMap, PREVIEW_CHARS};
