//! WebSocket Sink - 通过 WebSocket 客户端播放
//!
//! 协议：
//! - 服务端 -> 客户端: 文本 `audio <seq>` 后紧跟一个二进制帧 = 一条 WAV 音频
//! - 服务端 -> 客户端: 文本 `stop` = 停止当前播放
//! - 客户端 -> 服务端: 文本 `ended <seq>` = 编号为 seq 的音频播放结束
//!
//! seq 从 1 开始递增，旧音频迟到的 `ended` 不会结束新音频

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::application::ports::{PlaybackError, PlaybackSink};

/// 发往客户端的待发送缓冲
const OUTBOUND_BUFFER: usize = 16;

/// 无音频播放中
const IDLE_SEQ: u64 = 0;

/// 音频帧之前的文本头前缀
pub const AUDIO_HEADER_PREFIX: &str = "audio";
/// 客户端通知播放结束的文本前缀
pub const ENDED_MESSAGE: &str = "ended";
/// 通知客户端停止播放的文本
pub const STOP_MESSAGE: &str = "stop";

/// 发往客户端的指令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCommand {
    Audio { seq: u64, data: Vec<u8> },
    Stop,
}

/// 音频帧的文本头
pub fn audio_header(seq: u64) -> String {
    format!("{} {}", AUDIO_HEADER_PREFIX, seq)
}

/// 解析客户端的 `ended <seq>`
pub fn parse_ended(text: &str) -> Option<u64> {
    let mut parts = text.split_whitespace();
    if parts.next()? != ENDED_MESSAGE {
        return None;
    }
    let seq = parts.next()?.parse().ok()?;
    parts.next().is_none().then_some(seq)
}

/// WebSocket 播放端
///
/// 连接处理任务负责把 SinkCommand 转为 WebSocket 帧，并回报 ended / 断开
pub struct WebSocketSink {
    outbound: mpsc::Sender<SinkCommand>,
    /// 最近分配的 seq
    last_seq: AtomicU64,
    /// 正在播放的 seq，IDLE_SEQ 表示空闲
    playing_seq: AtomicU64,
    connected: AtomicBool,
}

impl WebSocketSink {
    pub fn new() -> (Arc<Self>, mpsc::Receiver<SinkCommand>) {
        let (outbound, commands) = mpsc::channel(OUTBOUND_BUFFER);
        let sink = Arc::new(Self {
            outbound,
            last_seq: AtomicU64::new(IDLE_SEQ),
            playing_seq: AtomicU64::new(IDLE_SEQ),
            connected: AtomicBool::new(true),
        });
        (sink, commands)
    }

    /// 客户端报告 `seq` 播放结束，返回是否结束了当前播放
    pub fn mark_ended(&self, seq: u64) -> bool {
        if seq == IDLE_SEQ {
            return false;
        }
        let ended = self
            .playing_seq
            .compare_exchange(seq, IDLE_SEQ, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if !ended {
            tracing::debug!(seq = seq, "Stale ended ignored");
        }
        ended
    }

    /// 连接已关闭
    pub fn mark_disconnected(&self) {
        self.connected.store(false, Ordering::SeqCst);
        self.playing_seq.store(IDLE_SEQ, Ordering::SeqCst);
    }
}

#[async_trait]
impl PlaybackSink for WebSocketSink {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst) && !self.outbound.is_closed()
    }

    async fn play(&self, audio_data: Vec<u8>) -> Result<(), PlaybackError> {
        if !self.is_connected() {
            return Err(PlaybackError::Disconnected);
        }

        let seq = self.last_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.playing_seq.store(seq, Ordering::SeqCst);
        if self
            .outbound
            .send(SinkCommand::Audio {
                seq,
                data: audio_data,
            })
            .await
            .is_err()
        {
            self.mark_disconnected();
            return Err(PlaybackError::Disconnected);
        }
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.playing_seq.load(Ordering::SeqCst) != IDLE_SEQ
    }

    fn stop(&self) {
        self.playing_seq.store(IDLE_SEQ, Ordering::SeqCst);
        if let Err(e) = self.outbound.try_send(SinkCommand::Stop) {
            tracing::debug!(error = %e, "Stop command not delivered");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_play_until_client_reports_ended() {
        let (sink, mut commands) = WebSocketSink::new();

        sink.play(vec![1, 2, 3]).await.unwrap();
        assert!(sink.is_playing());
        assert_eq!(
            commands.recv().await,
            Some(SinkCommand::Audio {
                seq: 1,
                data: vec![1, 2, 3]
            })
        );

        assert!(sink.mark_ended(1));
        assert!(!sink.is_playing());
    }

    #[tokio::test]
    async fn test_stop_sends_command() {
        let (sink, mut commands) = WebSocketSink::new();

        sink.play(vec![9]).await.unwrap();
        sink.stop();

        assert!(!sink.is_playing());
        assert_eq!(
            commands.recv().await,
            Some(SinkCommand::Audio {
                seq: 1,
                data: vec![9]
            })
        );
        assert_eq!(commands.recv().await, Some(SinkCommand::Stop));
    }

    #[tokio::test]
    async fn test_late_ended_does_not_finish_next_audio() {
        let (sink, mut commands) = WebSocketSink::new();

        sink.play(vec![1]).await.unwrap();
        sink.stop();
        sink.play(vec![2]).await.unwrap();

        // 第一条音频迟到的 ended
        assert!(!sink.mark_ended(1));
        assert!(sink.is_playing());

        assert!(sink.mark_ended(2));
        assert!(!sink.is_playing());

        assert!(matches!(
            commands.recv().await,
            Some(SinkCommand::Audio { seq: 1, .. })
        ));
        assert_eq!(commands.recv().await, Some(SinkCommand::Stop));
        assert!(matches!(
            commands.recv().await,
            Some(SinkCommand::Audio { seq: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_ended_while_idle_is_ignored() {
        let (sink, _commands) = WebSocketSink::new();

        assert!(!sink.mark_ended(0));
        assert!(!sink.mark_ended(7));
        assert!(!sink.is_playing());
    }

    #[test]
    fn test_parse_ended() {
        assert_eq!(parse_ended("ended 3"), Some(3));
        assert_eq!(parse_ended("  ended   42 "), Some(42));
        assert_eq!(parse_ended("ended"), None);
        assert_eq!(parse_ended("ended x"), None);
        assert_eq!(parse_ended("ended 1 2"), None);
        assert_eq!(parse_ended("stop"), None);
        assert_eq!(audio_header(5), "audio 5");
    }

    #[tokio::test]
    async fn test_closed_connection_is_disconnected() {
        let (sink, commands) = WebSocketSink::new();
        drop(commands);

        assert!(!sink.is_connected());
        assert!(matches!(
            sink.play(vec![1]).await,
            Err(PlaybackError::Disconnected)
        ));
    }

    #[tokio::test]
    async fn test_mark_disconnected() {
        let (sink, _commands) = WebSocketSink::new();
        sink.play(vec![1]).await.unwrap();

        sink.mark_disconnected();
        assert!(!sink.is_connected());
        assert!(!sink.is_playing());
    }
}
