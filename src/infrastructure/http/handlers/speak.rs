//! Speak Handler - 消息入口

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::SpeakCommand;
use crate::domain::ChannelId;
use crate::infrastructure::http::dto::{ApiResponse, SpeakRequest, SpeakResponseDto};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

pub async fn speak(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SpeakRequest>,
) -> Result<Json<ApiResponse<SpeakResponseDto>>, ApiError> {
    if req.channel_id.trim().is_empty() {
        return Err(ApiError::BadRequest("channel_id is required".to_string()));
    }

    let cmd = SpeakCommand {
        channel_id: ChannelId::new(req.channel_id),
        author: req.author,
        text: req.text,
        attachments: req.attachments,
    };

    let result = state.speak_handler.handle(cmd)?;

    Ok(Json(ApiResponse::success(SpeakResponseDto {
        channel_id: result.channel_id,
        text: result.text,
        queue_length: result.queue_length,
    })))
}
