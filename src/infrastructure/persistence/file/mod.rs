//! File-system persistence
//!
//! 音频缓存的文件系统实现

mod audio_cache;
mod key_locks;

pub use audio_cache::{FileAudioCache, FileCacheConfig};
pub use key_locks::{KeyGuard, KeyLocks};
