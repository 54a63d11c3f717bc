//! Command Handlers 实现
//!
//! 所有 CommandHandler 的具体实现

mod channel_handlers;
mod speak_handlers;

pub use channel_handlers::*;
pub use speak_handlers::*;
