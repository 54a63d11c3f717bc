//! Playback Adapter - 播放端实现

mod recording_sink;
mod websocket_sink;

pub use recording_sink::RecordingSink;
pub use websocket_sink::{
    audio_header, parse_ended, SinkCommand, WebSocketSink, AUDIO_HEADER_PREFIX, ENDED_MESSAGE,
    STOP_MESSAGE,
};
