//! 应用层 - 命令（写操作）
//!
//! CQRS 命令侧：处理所有写操作

mod channel_commands;
mod speak_commands;

pub mod handlers;

pub use channel_commands::*;
pub use speak_commands::*;
