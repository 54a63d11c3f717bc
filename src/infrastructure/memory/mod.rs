//! Memory Layer - In-Memory State Management
//!
//! 频道 worker 注册表与错误统计

mod error_stats;
mod session_registry;

pub use error_stats::{ErrorStats, ErrorStatsSnapshot};
pub use session_registry::SessionRegistry;
