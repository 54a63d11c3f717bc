//! Yomiage - 聊天频道朗读服务
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Channel Context: 频道与朗读队列
//! - Voice Context: 合成参数
//!
//! 应用层 (application/):
//! - Ports: 端口定义（TtsEngine, AudioCache, PlaybackSink, SessionManager）
//! - Commands: CQRS 命令处理器
//! - Queries: CQRS 查询处理器
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API + WebSocket 播放端
//! - Memory: 频道注册表, 错误统计
//! - Worker: 每频道播放循环
//! - Persistence: 文件系统音频缓存
//! - Adapters: TTS Client, Playback Sink

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
