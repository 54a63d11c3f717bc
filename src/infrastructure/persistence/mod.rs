//! Persistence Layer - 数据持久化
//!
//! 文件系统音频缓存

pub mod file;

pub use self::file::{FileAudioCache, FileCacheConfig};
