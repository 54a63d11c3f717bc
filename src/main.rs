//! Yomiage - 聊天频道朗读服务
//!
//! - Domain: channel/, voice/
//! - Application: commands, queries, ports
//! - Infrastructure: http, memory, worker, persistence, adapters

use std::sync::Arc;
use std::time::Duration;

use yomiage::application::{AudioCachePort, TextPolicy, TtsEnginePort};
use yomiage::config::{load_config, print_config, AppConfig};
use yomiage::infrastructure::adapters::{HttpTtsClient, HttpTtsClientConfig};
use yomiage::infrastructure::http::{AppState, HttpServer, ServerConfig};
use yomiage::infrastructure::memory::{ErrorStats, SessionRegistry};
use yomiage::infrastructure::persistence::{FileAudioCache, FileCacheConfig};
use yomiage::infrastructure::worker::{PipelineContext, PlaybackConfig};

fn init_tracing(config: &AppConfig) {
    let log_filter = format!(
        "{},yomiage={},tower_http=debug",
        config.log.level, config.log.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// 定期清扫过期缓存条目
fn spawn_cache_sweeper(cache: Arc<FileAudioCache>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // 第一次 tick 立即返回，启动时已清扫过
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match cache.sweep_expired().await {
                Ok(result) if result.deleted_entries > 0 => {
                    tracing::info!(
                        deleted = result.deleted_entries,
                        freed_bytes = result.freed_bytes,
                        "Periodic cache sweep finished"
                    );
                }
                Ok(_) => tracing::debug!("Periodic cache sweep: nothing expired"),
                Err(e) => tracing::warn!(error = %e, "Periodic cache sweep failed"),
            }
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);

    tracing::info!("Yomiage - 聊天频道朗读服务");
    print_config(&config);

    // 创建 HTTP TTS 引擎
    let tts_engine = Arc::new(HttpTtsClient::new(
        HttpTtsClientConfig::new(&config.tts.url).with_timeout(config.tts.timeout_secs),
    )?);

    // TTS 服务不可用时仍然启动，合成失败按条目记录
    if tts_engine.health_check().await {
        tracing::info!(url = %config.tts.url, "TTS service reachable");
    } else {
        tracing::warn!(url = %config.tts.url, "TTS service unreachable at startup");
    }

    // 创建文件系统音频缓存
    let audio_cache = Arc::new(
        FileAudioCache::new(FileCacheConfig {
            cache_dir: config.cache.dir.clone(),
            ttl: config.cache.ttl(),
            max_size_bytes: config.cache.max_size_bytes(),
        })
        .await?,
    );

    match audio_cache.sweep_expired().await {
        Ok(result) => tracing::info!(
            deleted = result.deleted_entries,
            freed_bytes = result.freed_bytes,
            "Startup cache sweep finished"
        ),
        Err(e) => tracing::warn!(error = %e, "Startup cache sweep failed"),
    }
    spawn_cache_sweeper(audio_cache.clone(), config.cache.sweep_interval());

    // 创建频道注册表
    let voice_settings = Arc::new(config.voice.clone());
    let error_stats = ErrorStats::new().arc();
    let context = PipelineContext {
        tts_engine,
        audio_cache: audio_cache.clone(),
        voice_settings: voice_settings.clone(),
        error_stats: error_stats.clone(),
        playback: PlaybackConfig {
            poll_interval: Duration::from_millis(config.playback.poll_interval_ms),
            timeout: Duration::from_secs(config.playback.timeout_secs),
            gap: Duration::from_millis(config.playback.gap_ms),
        },
    };
    let session_manager = SessionRegistry::new(context).arc();

    // 创建 HTTP 服务器
    let server_config = ServerConfig::new(&config.server.host, config.server.port);
    let state = AppState::new(
        session_manager,
        audio_cache,
        voice_settings,
        error_stats,
        TextPolicy {
            max_length: config.text.max_length,
            attachment_label: config.text.attachment_label.clone(),
        },
    );

    let server = HttpServer::new(server_config, state);

    tracing::info!("Starting HTTP server...");

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
