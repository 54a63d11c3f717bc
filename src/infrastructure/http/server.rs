//! HTTP Server
//!
//! Axum HTTP 服务器启动和配置

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::Router;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::middleware::error_logging_middleware;
use super::routes::create_routes;
use super::state::AppState;

/// 朗读请求只包含短文本
const MAX_BODY_BYTES: usize = 64 * 1024;

/// 服务器配置
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5060,
        }
    }
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 构建带全部中间件的 Router
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600));

    create_routes()
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(middleware::from_fn(error_logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// HTTP 服务器
pub struct HttpServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl HttpServer {
    /// 创建新的 HTTP 服务器
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self {
            config,
            state: Arc::new(state),
        }
    }

    /// 启动服务器（带优雅关闭）
    pub async fn run_with_shutdown<F>(self, shutdown_signal: F) -> Result<(), std::io::Error>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let router = build_router(self.state.clone());
        let addr = self.config.addr();

        info!("Starting HTTP server on {} (with graceful shutdown)", addr);

        let listener = TcpListener::bind(&addr).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{PlaybackSink, SessionManagerPort, TextPolicy};
    use crate::domain::{ChannelId, VoiceSettings};
    use crate::infrastructure::adapters::{FakeTtsClient, RecordingSink};
    use crate::infrastructure::memory::{ErrorStats, SessionRegistry};
    use crate::infrastructure::persistence::file::{FileAudioCache, FileCacheConfig};
    use crate::infrastructure::worker::{PipelineContext, PlaybackConfig};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::time::Duration;
    use tempfile::TempDir;
    use tower::util::ServiceExt;

    struct TestApp {
        _dir: TempDir,
        router: Router,
        registry: Arc<SessionRegistry>,
    }

    async fn test_app() -> TestApp {
        let dir = TempDir::new().unwrap();
        let cache = Arc::new(
            FileAudioCache::new(FileCacheConfig {
                cache_dir: dir.path().to_path_buf(),
                ttl: Duration::from_secs(3600),
                max_size_bytes: 10 * 1024 * 1024,
            })
            .await
            .unwrap(),
        );
        let voice_settings = Arc::new(VoiceSettings::default());
        let error_stats = Arc::new(ErrorStats::new());

        let registry = Arc::new(SessionRegistry::new(PipelineContext {
            tts_engine: Arc::new(FakeTtsClient::default()),
            audio_cache: cache.clone(),
            voice_settings: voice_settings.clone(),
            error_stats: error_stats.clone(),
            playback: PlaybackConfig {
                poll_interval: Duration::from_millis(2),
                timeout: Duration::from_secs(5),
                gap: Duration::ZERO,
            },
        }));

        let state = AppState::new(
            registry.clone(),
            cache,
            voice_settings,
            error_stats,
            TextPolicy::default(),
        );

        TestApp {
            _dir: dir,
            router: build_router(Arc::new(state)),
            registry,
        }
    }

    async fn call(router: &Router, method: &str, uri: &str, body: Option<Value>) -> Value {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_ping() {
        let app = test_app().await;
        let body = call(&app.router, "GET", "/api/ping", None).await;
        assert_eq!(body["errno"], 0);
        assert_eq!(body["data"]["status"], "ok");
    }

    #[tokio::test]
    async fn test_speak_requires_attached_channel() {
        let app = test_app().await;
        let body = call(
            &app.router,
            "POST",
            "/api/speak",
            Some(json!({"channel_id": "lobby", "author": "bob", "text": "hello"})),
        )
        .await;
        assert_eq!(body["errno"], 409);
    }

    #[tokio::test]
    async fn test_speak_plays_on_attached_channel() {
        let app = test_app().await;
        let sink = Arc::new(RecordingSink::new(Duration::from_millis(1)));
        let attached: Arc<dyn PlaybackSink> = sink.clone();
        app.registry.attach(ChannelId::from("lobby"), attached);

        let body = call(
            &app.router,
            "POST",
            "/api/speak",
            Some(json!({
                "channel_id": "lobby",
                "author": "bob",
                "text": "see https://example.com/page",
                "attachments": 1
            })),
        )
        .await;
        assert_eq!(body["errno"], 0);
        assert_eq!(body["data"]["text"], "see URL ファイル");

        for _ in 0..400 {
            if sink.play_count() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(sink.play_count(), 1);
    }

    #[tokio::test]
    async fn test_speak_rejects_empty_text() {
        let app = test_app().await;
        let attached: Arc<dyn PlaybackSink> =
            Arc::new(RecordingSink::new(Duration::from_millis(1)));
        app.registry.attach(ChannelId::from("lobby"), attached);

        let body = call(
            &app.router,
            "POST",
            "/api/speak",
            Some(json!({"channel_id": "lobby", "text": "   "})),
        )
        .await;
        assert_eq!(body["errno"], 400);

        let stats = call(&app.router, "GET", "/api/stats/errors", None).await;
        assert_eq!(stats["data"]["by_category"]["normalization"], 1);

        let reset = call(&app.router, "DELETE", "/api/stats/errors", None).await;
        assert_eq!(reset["errno"], 0);
        let stats = call(&app.router, "GET", "/api/stats/errors", None).await;
        assert_eq!(stats["data"]["total"], 0);
    }

    #[tokio::test]
    async fn test_channel_queue_endpoints() {
        let app = test_app().await;

        let missing = call(&app.router, "GET", "/api/channel/nowhere/queue", None).await;
        assert_eq!(missing["errno"], 404);

        let attached: Arc<dyn PlaybackSink> = Arc::new(RecordingSink::stuck());
        app.registry.attach(ChannelId::from("busy"), attached);
        for text in ["one", "two", "three"] {
            call(
                &app.router,
                "POST",
                "/api/speak",
                Some(json!({"channel_id": "busy", "author": "eve", "text": text})),
            )
            .await;
        }

        let queue = call(&app.router, "GET", "/api/channel/busy/queue?limit=1", None).await;
        assert_eq!(queue["errno"], 0);
        assert_eq!(queue["data"]["attached"], true);
        assert!(queue["data"]["items"].as_array().unwrap().len() <= 1);

        let cleared = call(&app.router, "POST", "/api/channel/busy/clear", None).await;
        assert_eq!(cleared["errno"], 0);

        let skipped = call(&app.router, "POST", "/api/channel/busy/skip", None).await;
        assert_eq!(skipped["errno"], 0);

        let unknown = call(&app.router, "POST", "/api/channel/nowhere/skip", None).await;
        assert_eq!(unknown["errno"], 404);
    }

    #[tokio::test]
    async fn test_cache_and_voice_views() {
        let app = test_app().await;

        let cache = call(&app.router, "GET", "/api/cache/stats", None).await;
        assert_eq!(cache["data"]["entry_count"], 0);
        assert_eq!(cache["data"]["max_size_mb"], 10.0);

        let voice = call(&app.router, "GET", "/api/voice", None).await;
        assert_eq!(voice["data"]["model_id"], 7);
        assert_eq!(voice["data"]["style"], "Neutral");
    }
}
