//! Query Handlers 实现
//!
//! 所有 QueryHandler 的具体实现

mod channel_handlers;
mod stats_handlers;

pub use channel_handlers::*;
pub use stats_handlers::*;
