//! Recording Sink - 内存中的播放端
//!
//! 记录收到的音频，按配置的时长模拟播放状态

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::application::ports::{PlaybackError, PlaybackSink};

#[derive(Default)]
struct RecordingState {
    played: Vec<Vec<u8>>,
    playing_until: Option<Instant>,
    /// 不会自行结束的播放
    stuck_playing: bool,
    stop_calls: usize,
    /// 上一条仍在播放时收到新音频的次数
    overlaps: usize,
}

/// 记录型播放端
pub struct RecordingSink {
    state: Mutex<RecordingState>,
    connected: AtomicBool,
    play_duration: Duration,
    never_finishes: bool,
}

impl RecordingSink {
    /// 每条音频播放 `play_duration` 后自动结束
    pub fn new(play_duration: Duration) -> Self {
        Self {
            state: Mutex::new(RecordingState::default()),
            connected: AtomicBool::new(true),
            play_duration,
            never_finishes: false,
        }
    }

    /// 播放永远不会自行结束，只能被 stop
    pub fn stuck() -> Self {
        Self {
            never_finishes: true,
            ..Self::new(Duration::ZERO)
        }
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub fn played(&self) -> Vec<Vec<u8>> {
        self.state.lock().played.clone()
    }

    pub fn play_count(&self) -> usize {
        self.state.lock().played.len()
    }

    pub fn stop_calls(&self) -> usize {
        self.state.lock().stop_calls
    }

    pub fn overlaps(&self) -> usize {
        self.state.lock().overlaps
    }
}

#[async_trait]
impl PlaybackSink for RecordingSink {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn play(&self, audio_data: Vec<u8>) -> Result<(), PlaybackError> {
        if !self.is_connected() {
            return Err(PlaybackError::Disconnected);
        }

        let now = Instant::now();
        let mut state = self.state.lock();
        if state.stuck_playing || state.playing_until.is_some_and(|until| until > now) {
            state.overlaps += 1;
        }
        state.played.push(audio_data);
        if self.never_finishes {
            state.stuck_playing = true;
        } else {
            state.playing_until = Some(now + self.play_duration);
        }
        Ok(())
    }

    fn is_playing(&self) -> bool {
        let state = self.state.lock();
        state.stuck_playing || state.playing_until.is_some_and(|until| until > Instant::now())
    }

    fn stop(&self) {
        let mut state = self.state.lock();
        state.stuck_playing = false;
        state.playing_until = None;
        state.stop_calls += 1;
    }
}
