use crate::config::Config;
use crate::station::{Station, StreamManager};
use anyhow::{Context, Result};
use axum::{
    http::{header, Method},
    response::IntoResponse,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

pub mod routes_api;
pub mod routes_playlist;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub manager: Arc<StreamManager>,
    pub config: Arc<Config>,
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let contents_dir = ctx.config.station.contents_dir();
    if !contents_dir.exists() {
        tracing::warn!("Contents directory does not exist: {:?}", contents_dir);
    }

    Router::new()
        .route("/health", get(health_check))
        .merge(routes_playlist::playlist_routes(&ctx.config.server.playlist_name))
        .nest("/api", routes_api::api_routes())
        .nest_service("/contents", ServeDir::new(contents_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn health_check() -> impl IntoResponse {
    "OK"
}

/// Start the station and serve HTTP until SIGINT/SIGTERM
pub async fn start_server(config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let mut station = Station::from_config(&config)?;
    let handle = station.start();

    let manager = station.manager.clone();
    let ctx = AppContext {
        manager: manager.clone(),
        config: Arc::new(config),
    };
    let app = create_router(ctx);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            manager.kill();
        })
        .await;

    handle.shutdown().await;
    served?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PacingConfig;
    use crate::station::SegmentBuffer;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use radiocast_media::{PlaylistWindow, Segment};
    use tower::ServiceExt;

    fn router() -> (Router, Arc<StreamManager>) {
        let buffer = Arc::new(SegmentBuffer::default());
        let window = PlaylistWindow::new(3, 10.0).unwrap();
        let manager = Arc::new(StreamManager::new(
            Box::new(window),
            buffer,
            &PacingConfig::default(),
        ));
        let ctx = AppContext {
            manager: manager.clone(),
            config: Arc::new(Config::default()),
        };
        (create_router(ctx), manager)
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = router();
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "OK");
    }

    #[tokio::test]
    async fn test_playlist_headers() {
        let (app, manager) = router();
        manager.buffer().push(Segment::new(9.009, "/contents/music/1/1_000.ts", true));

        let response = app
            .oneshot(Request::get("/stream.m3u8").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            routes_playlist::PLAYLIST_CONTENT_TYPE
        );
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");
        assert!(body_text(response).await.starts_with("#EXTM3U\n#EXT-X-VERSION:3\n"));
    }

    #[tokio::test]
    async fn test_pause_returns_no_content() {
        let (app, manager) = router();
        let response = app
            .oneshot(
                Request::post("/api/stream/pause")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(manager.status(), radiocast_common::StreamStatus::Default);
    }
}
