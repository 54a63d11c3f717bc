//! Per-key async lock registry
//!
//! 同一个 key 的读写互斥，不同 key 之间完全并行。
//! 锁对象在没有持有者和等待者时立即从注册表移除，注册表大小受限于并发中的 key 数量。

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::application::ports::CacheKey;

type LockMap = DashMap<CacheKey, Arc<Mutex<()>>>;

/// Key 锁注册表
#[derive(Default)]
pub struct KeyLocks {
    locks: Arc<LockMap>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取指定 key 的锁
    pub async fn lock(&self, key: &CacheKey) -> KeyGuard {
        // shard 锁必须在 await 之前释放
        let mutex = Arc::clone(
            self.locks
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        );

        let guard = mutex.lock_owned().await;

        KeyGuard {
            key: key.clone(),
            guard: Some(guard),
            locks: Arc::clone(&self.locks),
        }
    }

    /// 当前注册的锁数量
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// 持有期间独占对应 key
pub struct KeyGuard {
    key: CacheKey,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<LockMap>,
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // 只剩注册表自身的引用时才移除
        self.locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
