//! Channel Worker - 单频道朗读队列与播放循环
//!
//! 状态机: Idle -> Processing -> Idle
//! - 队列与 processing 标志共用一把锁，enqueue 与循环退出检查不会同时启动两个循环
//! - 单条失败只记录，不会终止循环

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use crate::application::error::PipelineError;
use crate::application::ports::{
    compute_cache_key, AudioCachePort, CacheError, CacheKey, CacheLookup, PlaybackSink,
    QueueSnapshot, QueuedPreview, SynthesisRequest, TtsEnginePort,
};
use crate::domain::{ChannelId, NormalizedText, QueueItem, VoiceSettings};
use crate::infrastructure::memory::ErrorStats;

/// 队列预览中每条文本的最大字符数
pub const PREVIEW_CHARS: usize = 30;

/// 频道 -> worker 映射
pub type WorkerMap = DashMap<ChannelId, Arc<ChannelWorker>>;

/// 播放时序配置
#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    /// 轮询 is_playing 的间隔
    pub poll_interval: Duration,
    /// 单条播放的最长等待时间
    pub timeout: Duration,
    /// 两条朗读之间的间隔
    pub gap: Duration,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            timeout: Duration::from_secs(30),
            gap: Duration::from_millis(500),
        }
    }
}

/// 所有 worker 共享的处理依赖
#[derive(Clone)]
pub struct PipelineContext {
    pub tts_engine: Arc<dyn TtsEnginePort>,
    pub audio_cache: Arc<dyn AudioCachePort>,
    pub voice_settings: Arc<VoiceSettings>,
    pub error_stats: Arc<ErrorStats>,
    pub playback: PlaybackConfig,
}

impl PipelineContext {
    /// 获取音频：先查缓存，未命中则合成并写入缓存
    ///
    /// 缓存读写失败只记录，不影响本条朗读
    pub async fn resolve_audio(&self, text: &NormalizedText) -> Result<Vec<u8>, PipelineError> {
        let settings = self.voice_settings.as_ref();
        let key = compute_cache_key(text.as_str(), settings);

        match self.audio_cache.lookup(&key).await {
            Ok(CacheLookup::Hit) => match self.audio_cache.get(&key).await {
                Ok(Some(audio)) => {
                    tracing::debug!(cache_key = %key, "Audio served from cache");
                    return Ok(audio);
                }
                Ok(None) => {}
                Err(e) => self.record_cache_error(&key, e),
            },
            Ok(CacheLookup::Miss) => {}
            Err(e) => self.record_cache_error(&key, e),
        }

        let audio = self
            .tts_engine
            .synthesize(SynthesisRequest::new(text.as_str(), settings.clone()))
            .await?;

        if let Err(e) = self
            .audio_cache
            .put(&key, text.as_str(), settings, &audio)
            .await
        {
            self.record_cache_error(&key, e);
        }

        Ok(audio)
    }

    fn record_cache_error(&self, key: &CacheKey, error: CacheError) {
        let error = PipelineError::CacheIo(error);
        tracing::warn!(cache_key = %key, error = %error, "Cache access failed");
        self.error_stats.record(&error);
    }
}

#[derive(Default)]
struct WorkerState {
    queue: VecDeque<QueueItem>,
    processing: bool,
}

/// 单频道 worker
pub struct ChannelWorker {
    channel_id: ChannelId,
    state: Mutex<WorkerState>,
    sink: RwLock<Option<Arc<dyn PlaybackSink>>>,
    context: PipelineContext,
    registry: Weak<WorkerMap>,
    loop_starts: AtomicU64,
}

impl ChannelWorker {
    pub fn new(channel_id: ChannelId, context: PipelineContext, registry: Weak<WorkerMap>) -> Self {
        Self {
            channel_id,
            state: Mutex::new(WorkerState::default()),
            sink: RwLock::new(None),
            context,
            registry,
            loop_starts: AtomicU64::new(0),
        }
    }

    pub fn channel_id(&self) -> &ChannelId {
        &self.channel_id
    }

    /// 绑定播放端
    pub fn attach_sink(&self, sink: Arc<dyn PlaybackSink>) {
        *self.sink.write() = Some(sink);
        tracing::info!(channel_id = %self.channel_id, "Playback sink attached");
    }

    /// 解绑播放端，返回是否确实解绑
    ///
    /// `expected` 为 Some 时仅在当前播放端正是它时解绑。
    /// 正在播放的音频会被停止，剩余队列由循环在下一次检查时清空
    pub fn detach_sink(&self, expected: Option<&Arc<dyn PlaybackSink>>) -> bool {
        let previous = {
            let mut slot = self.sink.write();
            let matches = match (slot.as_ref(), expected) {
                (Some(current), Some(expected)) => same_sink(current, expected),
                (Some(_), None) => true,
                (None, _) => false,
            };
            if matches {
                slot.take()
            } else {
                None
            }
        };

        match previous {
            Some(sink) => {
                if sink.is_playing() {
                    sink.stop();
                }
                tracing::info!(channel_id = %self.channel_id, "Playback sink detached");
                true
            }
            None => false,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.sink.read().is_some()
    }

    /// 已绑定且连接中
    pub fn has_connected_sink(&self) -> bool {
        self.connected_sink().is_some()
    }

    pub fn is_processing(&self) -> bool {
        self.state.lock().processing
    }

    pub fn queue_len(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// 循环启动次数
    pub fn loop_starts(&self) -> u64 {
        self.loop_starts.load(Ordering::SeqCst)
    }

    /// 追加一条朗读，返回追加后的队列长度
    ///
    /// Idle 时在同一临界区内切换为 Processing 并启动循环
    pub fn enqueue(self: &Arc<Self>, item: QueueItem) -> usize {
        let (len, start_loop) = {
            let mut state = self.state.lock();
            state.queue.push_back(item);
            let start_loop = !state.processing;
            state.processing = true;
            (state.queue.len(), start_loop)
        };

        tracing::debug!(channel_id = %self.channel_id, queue_len = len, "Item enqueued");

        if start_loop {
            self.loop_starts.fetch_add(1, Ordering::SeqCst);
            let worker = Arc::clone(self);
            tokio::spawn(async move {
                worker.run().await;
            });
        }

        len
    }

    /// 清空待处理队列，返回删除的条目数
    pub fn clear(&self) -> usize {
        let mut state = self.state.lock();
        let dropped = state.queue.len();
        state.queue.clear();
        if dropped > 0 {
            tracing::info!(channel_id = %self.channel_id, dropped = dropped, "Queue cleared");
        }
        dropped
    }

    /// 跳过当前播放，返回是否确实停止了播放
    pub fn skip(&self) -> bool {
        let sink = self.sink.read().clone();
        match sink {
            Some(sink) if sink.is_playing() => {
                sink.stop();
                tracing::info!(channel_id = %self.channel_id, "Current utterance skipped");
                true
            }
            _ => false,
        }
    }

    /// 队列快照，最多包含 `limit` 条预览
    pub fn snapshot(&self, limit: usize) -> QueueSnapshot {
        let (length, processing, items) = {
            let state = self.state.lock();
            let items = state
                .queue
                .iter()
                .take(limit)
                .map(|item| QueuedPreview {
                    author: item.author().to_string(),
                    text: preview(item.text().as_str()),
                })
                .collect::<Vec<_>>();
            (state.queue.len(), state.processing, items)
        };

        QueueSnapshot {
            channel_id: self.channel_id.clone(),
            attached: self.is_attached(),
            processing,
            length,
            items,
        }
    }

    /// 已绑定且连接中的播放端
    fn connected_sink(&self) -> Option<Arc<dyn PlaybackSink>> {
        self.sink
            .read()
            .as_ref()
            .filter(|sink| sink.is_connected())
            .cloned()
    }

    async fn run(self: Arc<Self>) {
        tracing::debug!(channel_id = %self.channel_id, "Channel loop started");
        let mut loop_guard = LoopGuard {
            worker: Arc::clone(&self),
            finished: false,
        };

        loop {
            let item = {
                let mut state = self.state.lock();
                match state.queue.pop_front() {
                    Some(item) => item,
                    None => {
                        state.processing = false;
                        break;
                    }
                }
            };

            let Some(sink) = self.connected_sink() else {
                let dropped = {
                    let mut state = self.state.lock();
                    let dropped = state.queue.len() + 1;
                    state.queue.clear();
                    state.processing = false;
                    dropped
                };
                tracing::info!(
                    channel_id = %self.channel_id,
                    dropped = dropped,
                    "Sink not connected, queue dropped"
                );
                break;
            };

            if let Err(e) = self.process_item(&item, sink).await {
                tracing::warn!(
                    channel_id = %self.channel_id,
                    author = %item.author(),
                    category = e.category().as_str(),
                    error = %e,
                    "Utterance failed"
                );
                self.context.error_stats.record(&e);
            }

            tokio::time::sleep(self.context.playback.gap).await;
        }

        loop_guard.finished = true;
        tracing::debug!(channel_id = %self.channel_id, "Channel loop idle");
        self.release_if_detached();
    }

    async fn process_item(
        &self,
        item: &QueueItem,
        sink: Arc<dyn PlaybackSink>,
    ) -> Result<(), PipelineError> {
        let audio = self.context.resolve_audio(item.text()).await?;

        // 合成期间播放端可能已断开，音频已缓存
        if self.connected_sink().is_none() {
            tracing::debug!(channel_id = %self.channel_id, "Sink gone after synthesis, skipping playback");
            return Ok(());
        }

        tracing::debug!(
            channel_id = %self.channel_id,
            author = %item.author(),
            text = %preview(item.text().as_str()),
            "Playing utterance"
        );

        sink.play(audio).await?;
        self.wait_for_playback(sink.as_ref()).await
    }

    /// 轮询等待播放结束，超时则强制停止
    async fn wait_for_playback(&self, sink: &dyn PlaybackSink) -> Result<(), PipelineError> {
        let playback = &self.context.playback;
        let deadline = Instant::now() + playback.timeout;

        while sink.is_playing() {
            if Instant::now() >= deadline {
                sink.stop();
                return Err(PipelineError::PlaybackTimeout(playback.timeout));
            }
            tokio::time::sleep(playback.poll_interval).await;
        }

        Ok(())
    }

    /// 已解绑且空闲时从注册表移除自身
    fn release_if_detached(self: &Arc<Self>) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };

        let removed = registry.remove_if(&self.channel_id, |_, worker| {
            Arc::ptr_eq(worker, self) && !worker.is_attached() && {
                let state = worker.state.lock();
                !state.processing && state.queue.is_empty()
            }
        });

        if removed.is_some() {
            tracing::info!(channel_id = %self.channel_id, "Channel worker released");
        }
    }
}

/// 循环未正常结束（panic 或任务被取消）时复位 processing，后续 enqueue 可以重新启动循环
///
/// 正常退出时 processing 已在队列检查的临界区内复位，这里不能再动它
struct LoopGuard {
    worker: Arc<ChannelWorker>,
    finished: bool,
}

impl Drop for LoopGuard {
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        let worker = &self.worker;
        let pending = {
            let mut state = worker.state.lock();
            state.processing = false;
            state.queue.len()
        };
        tracing::error!(
            channel_id = %worker.channel_id,
            pending = pending,
            "Channel loop terminated abnormally, worker reset to idle"
        );
        worker.release_if_detached();
    }
}

/// 比较数据指针，忽略 vtable
fn same_sink(a: &Arc<dyn PlaybackSink>, b: &Arc<dyn PlaybackSink>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

/// 截断为预览文本
fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
