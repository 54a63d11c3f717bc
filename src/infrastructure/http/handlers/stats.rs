//! Stats Handlers - 缓存、音色与错误统计

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::{
    CacheStatsResponse, GetCacheStats, GetErrorStats, GetVoiceSettings, ResetErrorStatsCommand,
};
use crate::domain::VoiceSettings;
use crate::infrastructure::http::dto::{ApiResponse, Empty};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;
use crate::infrastructure::memory::ErrorStatsSnapshot;

pub async fn cache_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<CacheStatsResponse>>, ApiError> {
    let stats = state.get_cache_stats_handler.handle(GetCacheStats).await?;
    Ok(Json(ApiResponse::success(stats)))
}

pub async fn voice_settings(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<VoiceSettings>> {
    Json(ApiResponse::success(
        state.get_voice_settings_handler.handle(GetVoiceSettings),
    ))
}

pub async fn error_stats(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<ErrorStatsSnapshot>> {
    Json(ApiResponse::success(
        state.get_error_stats_handler.handle(GetErrorStats),
    ))
}

pub async fn reset_error_stats(State(state): State<Arc<AppState>>) -> Json<ApiResponse<Empty>> {
    state
        .reset_error_stats_handler
        .handle(ResetErrorStatsCommand);
    Json(ApiResponse::ok())
}
