//! Channel WebSocket Handler - 播放端连接
//!
//! 连接建立即绑定频道，断开即解绑

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;

use crate::application::PlaybackSink;
use crate::domain::ChannelId;
use crate::infrastructure::adapters::{
    audio_header, parse_ended, SinkCommand, WebSocketSink, STOP_MESSAGE,
};
use crate::infrastructure::http::state::AppState;

/// 频道 WebSocket 连接处理
pub async fn channel_websocket_handler(
    ws: WebSocketUpgrade,
    Path(channel_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let channel_id = ChannelId::new(channel_id);
    ws.on_upgrade(move |socket| handle_channel_socket(socket, channel_id, state))
}

async fn handle_channel_socket(socket: WebSocket, channel_id: ChannelId, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let (sink, mut commands) = WebSocketSink::new();
    let attached: Arc<dyn PlaybackSink> = sink.clone();

    state
        .session_manager
        .attach(channel_id.clone(), attached.clone());

    tracing::info!(channel_id = %channel_id, "Playback WebSocket connected");

    // 指令转发任务
    let forward_channel = channel_id.clone();
    let mut forward_task = tokio::spawn(async move {
        while let Some(command) = commands.recv().await {
            let frames = match command {
                SinkCommand::Audio { seq, data } => {
                    vec![Message::Text(audio_header(seq)), Message::Binary(data)]
                }
                SinkCommand::Stop => vec![Message::Text(STOP_MESSAGE.to_string())],
            };

            for msg in frames {
                if let Err(e) = sender.send(msg).await {
                    tracing::debug!(
                        channel_id = %forward_channel,
                        error = %e,
                        "Failed to send WebSocket message"
                    );
                    return;
                }
            }
        }
    });

    // 接收客户端播放状态
    let receive_channel = channel_id.clone();
    let receive_sink = sink.clone();
    let mut receive_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => match parse_ended(&text) {
                    Some(seq) => {
                        receive_sink.mark_ended(seq);
                    }
                    None => {
                        tracing::debug!(
                            channel_id = %receive_channel,
                            message = %text,
                            "Unknown client message"
                        );
                    }
                },
                Ok(Message::Close(_)) => {
                    tracing::info!(channel_id = %receive_channel, "WebSocket closed by client");
                    break;
                }
                Err(e) => {
                    tracing::debug!(channel_id = %receive_channel, error = %e, "WebSocket error");
                    break;
                }
                _ => {}
            }
        }
    });

    // 任一方向结束即关闭连接
    tokio::select! {
        _ = &mut forward_task => receive_task.abort(),
        _ = &mut receive_task => forward_task.abort(),
    }

    sink.mark_disconnected();
    state.session_manager.detach_sink(&channel_id, &attached);
    tracing::info!(channel_id = %channel_id, "Playback WebSocket disconnected");
}
