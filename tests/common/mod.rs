//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`], which lays out a temporary station root with
//! content playlists and builds a [`StreamManager`] over it. The
//! [`TestHarness::with_server`] constructor starts Axum on a random port for
//! HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use radiocast::config::{Config, PacingConfig};
use radiocast::server::{create_router, AppContext};
use radiocast::station::{Content, FsContentResolver, SegmentBuffer, StreamManager};
use radiocast_media::PlaylistWindow;
use tempfile::TempDir;

/// Temporary station root plus a stream manager built over it.
pub struct TestHarness {
    pub root: TempDir,
    pub config: Config,
    pub buffer: Arc<SegmentBuffer>,
    pub manager: Arc<StreamManager>,
}

impl TestHarness {
    /// Create a harness with a direct-mode window of `max_segments`.
    pub fn new(max_segments: usize) -> Self {
        let root = tempfile::tempdir().expect("failed to create temp root");
        let mut config = Config::default();
        config.station.root = root.path().to_path_buf();
        config.scheduler.enabled = false;

        let buffer = Arc::new(SegmentBuffer::new(config.buffer.threshold_secs));
        let window = PlaylistWindow::new(max_segments, 10.0).expect("invalid window");
        let manager = Arc::new(StreamManager::new(
            Box::new(window),
            buffer.clone(),
            &PacingConfig::default(),
        ));

        Self {
            root,
            config,
            buffer,
            manager,
        }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        let harness = Self::new(3);
        let ctx = AppContext {
            manager: harness.manager.clone(),
            config: Arc::new(harness.config.clone()),
        };
        let app = create_router(ctx);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }

    /// Resolver reading from this harness's root.
    pub fn resolver(&self) -> FsContentResolver {
        FsContentResolver::new(self.root.path())
    }

    /// Spawn the pacing loop.
    pub fn spawn_manager(&self) -> tokio::task::JoinHandle<()> {
        let manager = self.manager.clone();
        tokio::spawn(async move { manager.run().await })
    }

    /// Write a content playlist with one segment per duration.
    pub fn write_content(&self, content: &Content, durations: &[f64]) {
        write_content(self.root.path(), content, durations);
    }
}

/// Write `<root>/contents/<kind>/<id>/<id>.m3u8` with relative segment URIs.
pub fn write_content(root: &Path, content: &Content, durations: &[f64]) {
    let mut text = String::from("#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:10\n#EXT-X-MEDIA-SEQUENCE:0\n");
    for (i, d) in durations.iter().enumerate() {
        text.push_str(&format!("#EXTINF:{d:.3},\n{}_{i:03}.ts\n", content.id));
    }
    text.push_str("#EXT-X-ENDLIST\n");

    let path = content.source_path(root);
    std::fs::create_dir_all(path.parent().expect("content path has a parent"))
        .expect("failed to create content dir");
    std::fs::write(path, text).expect("failed to write content playlist");
}
