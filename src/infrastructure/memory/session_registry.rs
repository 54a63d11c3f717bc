//! Session Registry - 频道 worker 注册表
//!
//! 实现 SessionManagerPort

use std::sync::Arc;

use crate::application::ports::{
    PlaybackSink, QueueSnapshot, SessionError, SessionManagerPort,
};
use crate::domain::{ChannelId, QueueItem};
use crate::infrastructure::worker::{ChannelWorker, PipelineContext, WorkerMap};

/// 内存中的频道注册表
pub struct SessionRegistry {
    workers: Arc<WorkerMap>,
    context: PipelineContext,
}

impl SessionRegistry {
    pub fn new(context: PipelineContext) -> Self {
        Self {
            workers: Arc::new(WorkerMap::new()),
            context,
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 获取或创建频道 worker
    fn worker(&self, channel_id: &ChannelId) -> Arc<ChannelWorker> {
        if let Some(worker) = self.workers.get(channel_id) {
            return Arc::clone(worker.value());
        }

        Arc::clone(
            self.workers
                .entry(channel_id.clone())
                .or_insert_with(|| self.new_worker(channel_id))
                .value(),
        )
    }

    fn new_worker(&self, channel_id: &ChannelId) -> Arc<ChannelWorker> {
        tracing::debug!(channel_id = %channel_id, "Channel worker created");
        Arc::new(ChannelWorker::new(
            channel_id.clone(),
            self.context.clone(),
            Arc::downgrade(&self.workers),
        ))
    }

    /// 解绑播放端，空闲的 worker 直接移除
    ///
    /// 处理中的 worker 由循环结束时自行移除
    fn release(&self, channel_id: &ChannelId, expected: Option<&Arc<dyn PlaybackSink>>) {
        let Some(worker) = self.workers.get(channel_id).map(|w| Arc::clone(w.value())) else {
            return;
        };

        if !worker.detach_sink(expected) {
            return;
        }

        self.workers.remove_if(channel_id, |_, w| {
            Arc::ptr_eq(w, &worker) && !w.is_attached() && !w.is_processing()
        });
    }

    /// 当前注册的 worker 数量
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// 指定频道的循环启动次数
    pub fn loop_starts(&self, channel_id: &ChannelId) -> u64 {
        self.workers
            .get(channel_id)
            .map_or(0, |worker| worker.loop_starts())
    }
}

impl SessionManagerPort for SessionRegistry {
    fn attach(&self, channel_id: ChannelId, sink: Arc<dyn PlaybackSink>) {
        // 在 entry 锁内绑定，与 worker 的自我移除互斥
        let worker = self
            .workers
            .entry(channel_id.clone())
            .or_insert_with(|| self.new_worker(&channel_id));
        worker.attach_sink(sink);
    }

    fn detach(&self, channel_id: &ChannelId) {
        self.release(channel_id, None);
    }

    fn detach_sink(&self, channel_id: &ChannelId, sink: &Arc<dyn PlaybackSink>) {
        self.release(channel_id, Some(sink));
    }

    fn is_attached(&self, channel_id: &ChannelId) -> bool {
        self.workers
            .get(channel_id)
            .is_some_and(|worker| worker.has_connected_sink())
    }

    fn enqueue(&self, channel_id: &ChannelId, item: QueueItem) -> Result<usize, SessionError> {
        Ok(self.worker(channel_id).enqueue(item))
    }

    fn clear(&self, channel_id: &ChannelId) -> usize {
        self.workers
            .get(channel_id)
            .map(|w| Arc::clone(w.value()))
            .map_or(0, |worker| worker.clear())
    }

    fn skip(&self, channel_id: &ChannelId) -> bool {
        self.workers
            .get(channel_id)
            .map(|w| Arc::clone(w.value()))
            .is_some_and(|worker| worker.skip())
    }

    fn snapshot(&self, channel_id: &ChannelId, limit: usize) -> Option<QueueSnapshot> {
        self.workers
            .get(channel_id)
            .map(|w| Arc::clone(w.value()))
            .map(|worker| worker.snapshot(limit))
    }

    fn list_all(&self) -> Vec<ChannelId> {
        self.workers.iter().map(|e| e.key().clone()).collect()
    }
}
