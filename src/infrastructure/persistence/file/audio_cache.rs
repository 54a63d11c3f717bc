//! File-based TTL + LRU Audio Cache Implementation
//!
//! 目录布局:
//! - `{cache_dir}/{key}.wav`  音频数据
//! - `{cache_dir}/{key}.meta` JSON 元数据
//!
//! 写入先落到 `.tmp` 再 rename，读者不会看到半写状态的文件。

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tokio::sync::Mutex;

use super::key_locks::KeyLocks;
use crate::application::ports::{
    AudioCachePort, CacheError, CacheKey, CacheLookup, CacheMetadata, CacheStats, CleanupResult,
};
use crate::domain::VoiceSettings;

const PAYLOAD_EXT: &str = "wav";
const METADATA_EXT: &str = "meta";
const TMP_EXT: &str = "tmp";

/// 淘汰后的目标占用（容量的 4/5）
const EVICTION_TARGET_NUMERATOR: u64 = 4;
const EVICTION_TARGET_DENOMINATOR: u64 = 5;

/// 文件缓存配置
#[derive(Debug, Clone)]
pub struct FileCacheConfig {
    /// 缓存目录
    pub cache_dir: PathBuf,
    /// 条目存活时间
    pub ttl: Duration,
    /// 最大缓存大小（字节）
    pub max_size_bytes: u64,
}

impl Default for FileCacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("cache"),
            ttl: Duration::from_secs(24 * 3600),
            max_size_bytes: 500 * 1024 * 1024,
        }
    }
}

/// 目录中同一 key 的文件情况
#[derive(Debug, Default, Clone, Copy)]
struct EntryFiles {
    payload_bytes: Option<u64>,
    metadata_bytes: Option<u64>,
}

impl EntryFiles {
    fn total_bytes(&self) -> u64 {
        self.payload_bytes.unwrap_or(0) + self.metadata_bytes.unwrap_or(0)
    }
}

/// 文件系统音频缓存
pub struct FileAudioCache {
    cache_dir: PathBuf,
    ttl: Duration,
    max_size_bytes: u64,
    key_locks: KeyLocks,
    /// 淘汰与清扫互斥
    maintenance_lock: Mutex<()>,
}

impl FileAudioCache {
    /// 创建缓存实例（目录不存在时自动创建）
    pub async fn new(config: FileCacheConfig) -> Result<Self, CacheError> {
        fs::create_dir_all(&config.cache_dir).await?;

        tracing::info!(
            cache_dir = %config.cache_dir.display(),
            ttl_secs = config.ttl.as_secs(),
            max_size_bytes = config.max_size_bytes,
            "FileAudioCache initialized"
        );

        Ok(Self {
            cache_dir: config.cache_dir,
            ttl: config.ttl,
            max_size_bytes: config.max_size_bytes,
            key_locks: KeyLocks::new(),
            maintenance_lock: Mutex::new(()),
        })
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// 当前持有的 key 锁数量
    pub fn active_key_locks(&self) -> usize {
        self.key_locks.len()
    }

    fn payload_path(&self, key: &CacheKey) -> PathBuf {
        self.cache_dir.join(format!("{}.{}", key, PAYLOAD_EXT))
    }

    fn metadata_path(&self, key: &CacheKey) -> PathBuf {
        self.cache_dir.join(format!("{}.{}", key, METADATA_EXT))
    }

    fn now_secs() -> f64 {
        Utc::now().timestamp_millis() as f64 / 1000.0
    }

    fn eviction_target(&self) -> u64 {
        self.max_size_bytes / EVICTION_TARGET_DENOMINATOR * EVICTION_TARGET_NUMERATOR
    }

    /// 原子写入：先写临时文件再 rename
    async fn write_atomic(path: &Path, data: &[u8]) -> Result<(), CacheError> {
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".");
        tmp.push(TMP_EXT);
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, data).await?;
        if let Err(e) = fs::rename(&tmp, path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    /// 读取元数据，缺失或损坏时返回 None
    async fn read_metadata(&self, key: &CacheKey) -> Result<Option<CacheMetadata>, CacheError> {
        let raw = match fs::read(self.metadata_path(key)).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice::<CacheMetadata>(&raw) {
            Ok(metadata) => Ok(Some(metadata)),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Corrupt cache metadata");
                Ok(None)
            }
        }
    }

    async fn write_metadata(
        &self,
        key: &CacheKey,
        metadata: &CacheMetadata,
    ) -> Result<(), CacheError> {
        let raw = serde_json::to_vec(metadata)?;
        Self::write_atomic(&self.metadata_path(key), &raw).await
    }

    async fn file_len(path: &Path) -> Result<Option<u64>, CacheError> {
        match fs::metadata(path).await {
            Ok(meta) => Ok(Some(meta.len())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 删除条目的音频与元数据文件，返回释放的字节数
    ///
    /// 调用方需持有该 key 的锁
    async fn delete_entry_files(&self, key: &CacheKey) -> Result<u64, CacheError> {
        let mut freed = 0u64;
        for path in [self.payload_path(key), self.metadata_path(key)] {
            let len = Self::file_len(&path).await?.unwrap_or(0);
            match fs::remove_file(&path).await {
                Ok(()) => freed += len,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(freed)
    }

    /// 读取有效条目的元数据
    ///
    /// 过期或缺少元数据的条目在此被删除。调用方需持有该 key 的锁
    async fn load_live_metadata(
        &self,
        key: &CacheKey,
    ) -> Result<Option<CacheMetadata>, CacheError> {
        if Self::file_len(&self.payload_path(key)).await?.is_none() {
            return Ok(None);
        }

        let Some(metadata) = self.read_metadata(key).await? else {
            tracing::debug!(key = %key, "Dropping cache payload without metadata");
            self.delete_entry_files(key).await?;
            return Ok(None);
        };

        if metadata.is_expired(self.ttl.as_secs_f64(), Self::now_secs()) {
            let freed = self.delete_entry_files(key).await?;
            tracing::debug!(key = %key, freed_bytes = freed, "Expired cache entry removed");
            return Ok(None);
        }

        Ok(Some(metadata))
    }

    /// 扫描缓存目录
    async fn scan_entries(&self) -> Result<BTreeMap<CacheKey, EntryFiles>, CacheError> {
        let mut entries: BTreeMap<CacheKey, EntryFiles> = BTreeMap::new();
        let mut dir = fs::read_dir(&self.cache_dir).await?;

        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            let (Some(stem), Some(ext)) = (
                path.file_stem().and_then(|s| s.to_str()),
                path.extension().and_then(|s| s.to_str()),
            ) else {
                continue;
            };

            let Some(key) = CacheKey::parse(stem) else {
                continue;
            };

            let len = match entry.metadata().await {
                Ok(meta) => meta.len(),
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };

            let files = entries.entry(key).or_default();
            match ext {
                PAYLOAD_EXT => files.payload_bytes = Some(len),
                METADATA_EXT => files.metadata_bytes = Some(len),
                _ => {}
            }
        }

        entries.retain(|_, files| files.payload_bytes.is_some() || files.metadata_bytes.is_some());
        Ok(entries)
    }
}

#[async_trait]
impl AudioCachePort for FileAudioCache {
    async fn lookup(&self, key: &CacheKey) -> Result<CacheLookup, CacheError> {
        let _guard = self.key_locks.lock(key).await;

        if self.load_live_metadata(key).await?.is_some() {
            Ok(CacheLookup::Hit)
        } else {
            Ok(CacheLookup::Miss)
        }
    }

    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError> {
        let _guard = self.key_locks.lock(key).await;

        let Some(mut metadata) = self.load_live_metadata(key).await? else {
            return Ok(None);
        };

        let audio = match fs::read(self.payload_path(key)).await {
            Ok(audio) => audio,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        metadata.touch(Self::now_secs());
        self.write_metadata(key, &metadata).await?;

        tracing::debug!(
            key = %key,
            size_bytes = audio.len(),
            access_count = metadata.access_count,
            "Cache hit"
        );

        Ok(Some(audio))
    }

    async fn put(
        &self,
        key: &CacheKey,
        text: &str,
        settings: &VoiceSettings,
        audio_data: &[u8],
    ) -> Result<(), CacheError> {
        if audio_data.is_empty() {
            tracing::warn!(key = %key, "Refusing to cache empty audio");
            return Ok(());
        }

        {
            let _guard = self.key_locks.lock(key).await;

            Self::write_atomic(&self.payload_path(key), audio_data).await?;
            let metadata = CacheMetadata::new(text, settings.clone(), Self::now_secs());
            self.write_metadata(key, &metadata).await?;

            tracing::debug!(key = %key, size_bytes = audio_data.len(), "Cache entry stored");
        }

        self.evict_if_over_capacity().await?;
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> Result<(), CacheError> {
        let _guard = self.key_locks.lock(key).await;
        self.delete_entry_files(key).await?;
        Ok(())
    }

    async fn evict_if_over_capacity(&self) -> Result<CleanupResult, CacheError> {
        let _maintenance = self.maintenance_lock.lock().await;

        let entries = self.scan_entries().await?;
        let mut current: u64 = entries.values().map(EntryFiles::total_bytes).sum();
        if current <= self.max_size_bytes {
            return Ok(CleanupResult::default());
        }

        // 没有元数据的条目排在最前
        let mut candidates = Vec::with_capacity(entries.len());
        for key in entries.keys() {
            let (last_accessed, access_count) = match self.read_metadata(key).await? {
                Some(meta) => (meta.last_accessed, meta.access_count),
                None => (0.0, 0),
            };
            candidates.push((last_accessed, access_count, key.clone()));
        }
        candidates.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let target = self.eviction_target();
        let mut result = CleanupResult::default();

        for (_, _, key) in candidates {
            if current <= target {
                break;
            }

            let _guard = self.key_locks.lock(&key).await;
            let freed = self.delete_entry_files(&key).await?;
            current = current.saturating_sub(freed);
            result.deleted_entries += 1;
            result.freed_bytes += freed;
        }

        tracing::info!(
            deleted_entries = result.deleted_entries,
            freed_bytes = result.freed_bytes,
            remaining_bytes = current,
            max_size_bytes = self.max_size_bytes,
            "Cache eviction completed"
        );

        Ok(result)
    }

    async fn sweep_expired(&self) -> Result<CleanupResult, CacheError> {
        let _maintenance = self.maintenance_lock.lock().await;

        let entries = self.scan_entries().await?;
        let ttl_secs = self.ttl.as_secs_f64();
        let now = Self::now_secs();
        let mut result = CleanupResult::default();

        for (key, files) in entries {
            let _guard = self.key_locks.lock(&key).await;

            let stale = if files.payload_bytes.is_none() {
                true
            } else {
                match self.read_metadata(&key).await? {
                    Some(meta) => meta.is_expired(ttl_secs, now),
                    None => true,
                }
            };

            if stale {
                result.freed_bytes += self.delete_entry_files(&key).await?;
                result.deleted_entries += 1;
            }
        }

        if result.deleted_entries > 0 {
            tracing::info!(
                deleted_entries = result.deleted_entries,
                freed_bytes = result.freed_bytes,
                "Expired cache entries swept"
            );
        }

        Ok(result)
    }

    async fn stats(&self) -> Result<CacheStats, CacheError> {
        let entries = self.scan_entries().await?;

        Ok(CacheStats {
            entry_count: entries
                .values()
                .filter(|files| files.payload_bytes.is_some())
                .count(),
            total_bytes: entries.values().map(EntryFiles::total_bytes).sum(),
            max_size_bytes: self.max_size_bytes,
            ttl_secs: self.ttl.as_secs(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::compute_cache_key;
    use tempfile::TempDir;

    async fn create_cache(dir: &TempDir, ttl: Duration, max_size_bytes: u64) -> FileAudioCache {
        FileAudioCache::new(FileCacheConfig {
            cache_dir: dir.path().to_path_buf(),
            ttl,
            max_size_bytes,
        })
        .await
        .unwrap()
    }

    fn key_for(text: &str) -> CacheKey {
        compute_cache_key(text, &VoiceSettings::default())
    }

    async fn put_text(cache: &FileAudioCache, text: &str, size: usize) -> CacheKey {
        let key = key_for(text);
        cache
            .put(&key, text, &VoiceSettings::default(), &vec![7u8; size])
            .await
            .unwrap();
        key
    }

    #[tokio::test]
    async fn test_put_then_get_counts_access() {
        let dir = TempDir::new().unwrap();
        let cache = create_cache(&dir, Duration::from_secs(3600), u64::MAX).await;

        let key = put_text(&cache, "こんにちは", 128).await;

        assert_eq!(cache.lookup(&key).await.unwrap(), CacheLookup::Hit);
        let audio = cache.get(&key).await.unwrap().unwrap();
        assert_eq!(audio, vec![7u8; 128]);

        let meta = cache.read_metadata(&key).await.unwrap().unwrap();
        assert_eq!(meta.access_count, 2);
        assert_eq!(meta.text, "こんにちは");
        assert!(meta.last_accessed >= meta.created_at);

        assert!(cache.payload_path(&key).exists());
        assert!(cache.metadata_path(&key).exists());
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let dir = TempDir::new().unwrap();
        let cache = create_cache(&dir, Duration::from_secs(3600), u64::MAX).await;

        let key = key_for("never stored");
        assert_eq!(cache.lookup(&key).await.unwrap(), CacheLookup::Miss);
        assert!(cache.get(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_is_removed_on_lookup() {
        let dir = TempDir::new().unwrap();
        let cache = create_cache(&dir, Duration::from_millis(100), u64::MAX).await;

        let key = put_text(&cache, "short lived", 64).await;
        assert!(cache.lookup(&key).await.unwrap().is_hit());

        tokio::time::sleep(Duration::from_millis(250)).await;

        assert_eq!(cache.lookup(&key).await.unwrap(), CacheLookup::Miss);
        assert!(!cache.payload_path(&key).exists());
        assert!(!cache.metadata_path(&key).exists());
    }

    #[tokio::test]
    async fn test_payload_without_metadata_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let cache = create_cache(&dir, Duration::from_secs(3600), u64::MAX).await;

        let key = put_text(&cache, "orphan", 64).await;
        fs::remove_file(cache.metadata_path(&key)).await.unwrap();

        assert!(cache.get(&key).await.unwrap().is_none());
        assert!(!cache.payload_path(&key).exists());
    }

    #[tokio::test]
    async fn test_corrupt_metadata_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let cache = create_cache(&dir, Duration::from_secs(3600), u64::MAX).await;

        let key = put_text(&cache, "corrupt", 64).await;
        fs::write(cache.metadata_path(&key), b"{not json").await.unwrap();

        assert_eq!(cache.lookup(&key).await.unwrap(), CacheLookup::Miss);
    }

    #[tokio::test]
    async fn test_empty_audio_is_not_stored() {
        let dir = TempDir::new().unwrap();
        let cache = create_cache(&dir, Duration::from_secs(3600), u64::MAX).await;

        let key = key_for("silent");
        cache
            .put(&key, "silent", &VoiceSettings::default(), &[])
            .await
            .unwrap();

        assert_eq!(cache.lookup(&key).await.unwrap(), CacheLookup::Miss);
        assert_eq!(cache.stats().await.unwrap().entry_count, 0);
    }

    #[tokio::test]
    async fn test_remove() {
        let dir = TempDir::new().unwrap();
        let cache = create_cache(&dir, Duration::from_secs(3600), u64::MAX).await;

        let key = put_text(&cache, "to remove", 64).await;
        cache.remove(&key).await.unwrap();
        assert_eq!(cache.lookup(&key).await.unwrap(), CacheLookup::Miss);

        // 再次删除不报错
        cache.remove(&key).await.unwrap();
    }

    #[tokio::test]
    async fn test_eviction_removes_least_recently_used_first() {
        let dir = TempDir::new().unwrap();
        let roomy = create_cache(&dir, Duration::from_secs(3600), u64::MAX).await;

        let mut keys = Vec::new();
        for i in 0..4 {
            keys.push(put_text(&roomy, &format!("text-{}", i), 1000).await);
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        // text-0 变为最近访问
        roomy.get(&keys[0]).await.unwrap().unwrap();

        let total = roomy.stats().await.unwrap().total_bytes;
        let tight = create_cache(&dir, Duration::from_secs(3600), total - 1).await;

        let result = tight.evict_if_over_capacity().await.unwrap();
        assert_eq!(result.deleted_entries, 1);

        assert!(!tight.payload_path(&keys[1]).exists());
        for key in [&keys[0], &keys[2], &keys[3]] {
            assert!(tight.payload_path(key).exists());
        }

        let stats = tight.stats().await.unwrap();
        assert!(stats.total_bytes <= tight.eviction_target());
    }

    #[tokio::test]
    async fn test_eviction_breaks_ties_by_access_count() {
        let dir = TempDir::new().unwrap();
        let roomy = create_cache(&dir, Duration::from_secs(3600), u64::MAX).await;

        let popular = put_text(&roomy, "popular", 1000).await;
        let rare = put_text(&roomy, "rare", 1000).await;

        for (key, count) in [(&popular, 5), (&rare, 1)] {
            let mut meta = roomy.read_metadata(key).await.unwrap().unwrap();
            meta.last_accessed = 1000.0;
            meta.access_count = count;
            roomy.write_metadata(key, &meta).await.unwrap();
        }

        let total = roomy.stats().await.unwrap().total_bytes;
        let tight = create_cache(&dir, Duration::from_secs(3600), total - 1).await;
        tight.evict_if_over_capacity().await.unwrap();

        assert!(tight.payload_path(&popular).exists());
        assert!(!tight.payload_path(&rare).exists());
    }

    #[tokio::test]
    async fn test_put_keeps_size_within_capacity() {
        let dir = TempDir::new().unwrap();
        let cache = create_cache(&dir, Duration::from_secs(3600), 6000).await;

        let mut keys = Vec::new();
        for i in 0..10 {
            keys.push(put_text(&cache, &format!("entry-{}", i), 1000).await);
            let stats = cache.stats().await.unwrap();
            assert!(stats.total_bytes <= 6000, "over capacity after put {}", i);
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        // 最早写入的条目最先被淘汰
        assert!(!cache.payload_path(&keys[0]).exists());
        assert!(cache.payload_path(&keys[9]).exists());
    }

    #[tokio::test]
    async fn test_under_capacity_does_nothing() {
        let dir = TempDir::new().unwrap();
        let cache = create_cache(&dir, Duration::from_secs(3600), u64::MAX).await;

        put_text(&cache, "small", 10).await;
        let result = cache.evict_if_over_capacity().await.unwrap();
        assert_eq!(result, CleanupResult::default());
    }

    #[tokio::test]
    async fn test_sweep_expired_and_orphans() {
        let dir = TempDir::new().unwrap();
        let cache = create_cache(&dir, Duration::from_millis(100), u64::MAX).await;

        let old = put_text(&cache, "old", 64).await;
        let orphan = put_text(&cache, "orphan meta", 64).await;
        fs::remove_file(cache.payload_path(&orphan)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(250)).await;
        let fresh = put_text(&cache, "fresh", 64).await;

        let result = cache.sweep_expired().await.unwrap();
        assert_eq!(result.deleted_entries, 2);
        assert!(result.freed_bytes > 0);

        assert!(!cache.payload_path(&old).exists());
        assert!(!cache.metadata_path(&orphan).exists());
        assert!(cache.payload_path(&fresh).exists());
    }

    #[tokio::test]
    async fn test_stats() {
        let dir = TempDir::new().unwrap();
        let cache = create_cache(&dir, Duration::from_secs(7200), 1_000_000).await;

        put_text(&cache, "a", 100).await;
        put_text(&cache, "b", 200).await;

        // 无关文件不计入
        fs::write(dir.path().join("notes.txt"), b"ignored").await.unwrap();

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.entry_count, 2);
        assert!(stats.total_bytes > 300);
        assert_eq!(stats.max_size_bytes, 1_000_000);
        assert_eq!(stats.ttl_secs, 7200);
    }

    #[tokio::test]
    async fn test_concurrent_reads_are_serialized_per_key() {
        let dir = TempDir::new().unwrap();
        let cache = Arc::new(create_cache(&dir, Duration::from_secs(3600), u64::MAX).await);

        let key = put_text(&cache, "shared", 256).await;

        let mut handles = Vec::new();
        for i in 0..10 {
            let cache = Arc::clone(&cache);
            let key = key.clone();
            handles.push(tokio::spawn(async move {
                assert!(cache.get(&key).await.unwrap().is_some());
                put_text(&cache, &format!("other-{}", i), 32).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let meta = cache.read_metadata(&key).await.unwrap().unwrap();
        assert_eq!(meta.access_count, 11);
        assert_eq!(cache.stats().await.unwrap().entry_count, 11);
        assert_eq!(cache.active_key_locks(), 0);
    }
}
