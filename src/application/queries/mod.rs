//! 应用层 - 查询（读操作）
//!
//! CQRS 查询侧：处理所有读操作

mod channel_queries;
mod stats_queries;

pub mod handlers;

pub use channel_queries::*;
pub use stats_queries::*;
