//! Channel Handlers - 队列查看与控制

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use crate::application::{ClearQueueCommand, GetQueue, QueueSnapshot, SkipCommand};
use crate::domain::ChannelId;
use crate::infrastructure::http::dto::{ApiResponse, ClearResponseDto, QueueParams, SkipResponseDto};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

// ============================================================================
// Queue
// ============================================================================

pub async fn get_queue(
    State(state): State<Arc<AppState>>,
    Path(channel_id): Path<String>,
    Query(params): Query<QueueParams>,
) -> Result<Json<ApiResponse<QueueSnapshot>>, ApiError> {
    let mut query = GetQueue::new(ChannelId::new(channel_id));
    if let Some(limit) = params.limit {
        query.limit = limit;
    }

    let snapshot = state.get_queue_handler.handle(query)?;
    Ok(Json(ApiResponse::success(snapshot)))
}

// ============================================================================
// Skip
// ============================================================================

pub async fn skip(
    State(state): State<Arc<AppState>>,
    Path(channel_id): Path<String>,
) -> Result<Json<ApiResponse<SkipResponseDto>>, ApiError> {
    let result = state.skip_handler.handle(SkipCommand {
        channel_id: ChannelId::new(channel_id),
    })?;

    Ok(Json(ApiResponse::success(SkipResponseDto {
        channel_id: result.channel_id,
        skipped: result.skipped,
    })))
}

// ============================================================================
// Clear
// ============================================================================

pub async fn clear(
    State(state): State<Arc<AppState>>,
    Path(channel_id): Path<String>,
) -> Result<Json<ApiResponse<ClearResponseDto>>, ApiError> {
    let result = state.clear_queue_handler.handle(ClearQueueCommand {
        channel_id: ChannelId::new(channel_id),
    })?;

    Ok(Json(ApiResponse::success(ClearResponseDto {
        channel_id: result.channel_id,
        cleared: result.cleared,
    })))
}
