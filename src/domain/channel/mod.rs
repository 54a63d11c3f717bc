//! Channel Context - 频道限界上下文
//!
//! 职责:
//! - 频道标识
//! - 待朗读队列条目

mod value_objects;

pub use value_objects::{ChannelId, QueueItem};
