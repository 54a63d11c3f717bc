//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping                          GET   健康检查
//! - /api/speak                         POST  提交一条朗读消息
//! - /api/channel/{id}/queue            GET   队列预览
//! - /api/channel/{id}/skip             POST  跳过当前朗读
//! - /api/channel/{id}/clear            POST  清空待朗读队列
//! - /api/cache/stats                   GET   缓存统计
//! - /api/voice                         GET   当前合成参数
//! - /api/stats/errors                  GET   错误统计
//! - /api/stats/errors                  DELETE 重置错误统计
//! - /ws/channel/{id}                   WS    播放端连接

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api", api_routes())
        .route(
            "/ws/channel/:channel_id",
            get(handlers::channel_websocket_handler),
        )
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route("/speak", post(handlers::speak))
        .nest("/channel", channel_routes())
        .route("/cache/stats", get(handlers::cache_stats))
        .route("/voice", get(handlers::voice_settings))
        .route(
            "/stats/errors",
            get(handlers::error_stats).delete(handlers::reset_error_stats),
        )
}

/// Channel 路由
fn channel_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/:channel_id/queue", get(handlers::get_queue))
        .route("/:channel_id/skip", post(handlers::skip))
        .route("/:channel_id/clear", post(handlers::clear))
}
