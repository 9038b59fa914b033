//! Pacing loop: drains the segment buffer into the live window at playback
//! speed.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use radiocast_common::{Result, StreamStatus};
use radiocast_media::{
    build_updater, M3u8Formatter, PlaylistFormatter, PlaylistHeader, PlaylistUpdater,
};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::buffer::SegmentBuffer;
use super::storage::PlaylistStorage;
use crate::config::{PacingConfig, PlaylistConfig};

const CONTROL_CAPACITY: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Pause,
    Resume,
}

/// Point-in-time view of the stream for status endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct StreamSnapshot {
    pub status: StreamStatus,
    pub header: PlaylistHeader,
    pub segment_count: usize,
    pub buffered_secs: f64,
    pub buffered_segments: usize,
    pub last_update: Option<DateTime<Utc>>,
}

/// Owns the live window and the pacing loop that feeds it.
pub struct StreamManager {
    window: RwLock<Box<dyn PlaylistUpdater>>,
    formatter: Box<dyn PlaylistFormatter>,
    buffer: Arc<SegmentBuffer>,
    status: Mutex<StreamStatus>,
    kill: CancellationToken,
    control_tx: mpsc::Sender<Control>,
    control_rx: Mutex<Option<mpsc::Receiver<Control>>>,
    initial_delay: Duration,
    idle_interval: Duration,
    storage: Option<(Arc<dyn PlaylistStorage>, String)>,
    last_update: RwLock<Option<DateTime<Utc>>>,
}

impl StreamManager {
    pub fn new(
        updater: Box<dyn PlaylistUpdater>,
        buffer: Arc<SegmentBuffer>,
        pacing: &PacingConfig,
    ) -> Self {
        let (control_tx, control_rx) = mpsc::channel(CONTROL_CAPACITY);
        Self {
            window: RwLock::new(updater),
            formatter: Box::new(M3u8Formatter::default()),
            buffer,
            status: Mutex::new(StreamStatus::Default),
            kill: CancellationToken::new(),
            control_tx,
            control_rx: Mutex::new(Some(control_rx)),
            initial_delay: pacing.initial_delay(),
            idle_interval: pacing.idle_interval(),
            storage: None,
            last_update: RwLock::new(None),
        }
    }

    /// Build a manager with the window strategy selected in `playlist`.
    pub fn from_config(
        playlist: &PlaylistConfig,
        pacing: &PacingConfig,
        buffer: Arc<SegmentBuffer>,
    ) -> Result<Self> {
        let updater = build_updater(playlist.mode, playlist.capacity(), playlist.target_duration)?;
        Ok(Self::new(updater, buffer, pacing)
            .with_formatter(Box::new(M3u8Formatter::new(playlist.segment_extension.clone()))))
    }

    pub fn with_formatter(mut self, formatter: Box<dyn PlaylistFormatter>) -> Self {
        self.formatter = formatter;
        self
    }

    /// Persist the rendered playlist under `key` after every update.
    pub fn with_storage(mut self, storage: Box<dyn PlaylistStorage>, key: impl Into<String>) -> Self {
        self.storage = Some((Arc::from(storage), key.into()));
        self
    }

    pub fn buffer(&self) -> &Arc<SegmentBuffer> {
        &self.buffer
    }

    pub fn status(&self) -> StreamStatus {
        *self.status.lock()
    }

    /// Run the pacing loop until killed.
    ///
    /// Returns immediately unless the manager is in `Default`.
    pub async fn run(&self) {
        {
            let mut status = self.status.lock();
            if *status != StreamStatus::Default {
                tracing::debug!(status = %*status, "Stream manager already started");
                return;
            }
            *status = StreamStatus::Streaming;
        }

        let Some(mut control_rx) = self.control_rx.lock().take() else {
            return;
        };

        tracing::info!("Stream manager started");

        let timer = tokio::time::sleep(self.initial_delay);
        tokio::pin!(timer);

        loop {
            tokio::select! {
                biased;

                _ = self.kill.cancelled() => break,

                Some(control) = control_rx.recv() => self.apply_control(control),

                () = &mut timer => {
                    let next = self.tick().await;
                    timer.as_mut().reset(Instant::now() + next);
                }
            }
        }

        *self.status.lock() = StreamStatus::Killed;
        tracing::info!("Stream manager stopped");
    }

    fn apply_control(&self, control: Control) {
        let mut status = self.status.lock();
        let next = match (control, *status) {
            (Control::Pause, StreamStatus::Streaming) => StreamStatus::Paused,
            (Control::Resume, StreamStatus::Paused) => StreamStatus::Streaming,
            _ => return,
        };
        tracing::info!(from = %*status, to = %next, "Stream status changed");
        *status = next;
    }

    /// One pacing step. Returns the delay before the next step.
    async fn tick(&self) -> Duration {
        if self.status() != StreamStatus::Streaming {
            return self.idle_interval;
        }

        let segment = match self.buffer.pop() {
            Ok(segment) => segment,
            Err(_) => {
                tracing::trace!("Segment buffer empty");
                return self.idle_interval;
            }
        };

        let uri = segment.uri.clone();
        let result = self.window.write().update(segment);

        match result {
            Ok(wait) => {
                *self.last_update.write() = Some(Utc::now());
                tracing::debug!(uri = %uri, wait, "Applied segment");
                self.persist().await;
                self.pacing_delay(wait)
            }
            Err(e) => {
                tracing::warn!(uri = %uri, error = %e, "Dropped segment");
                self.idle_interval
            }
        }
    }

    /// Delay for a wait reported by the window. Waits that are not positive
    /// or do not fit a `Duration` fall back to the idle interval.
    fn pacing_delay(&self, wait: f64) -> Duration {
        if wait <= 0.0 {
            return self.idle_interval;
        }
        Duration::try_from_secs_f64(wait).unwrap_or_else(|e| {
            tracing::warn!(wait, error = %e, "Unusable wait, using idle interval");
            self.idle_interval
        })
    }

    /// Write the rendered playlist on the blocking pool. Awaited so that
    /// writes land in update order.
    async fn persist(&self) {
        let Some((storage, key)) = &self.storage else {
            return;
        };
        let text = self.playlist_text();
        let storage = storage.clone();
        let key = key.clone();

        let result = tokio::task::spawn_blocking(move || {
            let stored = storage.store(&key, &text);
            (key, stored)
        })
        .await;

        match result {
            Ok((_, Ok(()))) => {}
            Ok((key, Err(e))) => {
                tracing::error!(key = %key, error = %e, "Failed to persist playlist")
            }
            Err(e) => tracing::error!(error = %e, "Playlist persist task failed"),
        }
    }

    /// Request `Streaming → Paused`.
    ///
    /// Best effort: returns whether the request was queued for the loop.
    pub fn pause(&self) -> bool {
        self.signal(Control::Pause, StreamStatus::Streaming)
    }

    /// Request `Paused → Streaming`.
    pub fn resume(&self) -> bool {
        self.signal(Control::Resume, StreamStatus::Paused)
    }

    fn signal(&self, control: Control, required: StreamStatus) -> bool {
        if self.status() != required {
            return false;
        }
        match self.control_tx.try_send(control) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(?control, "Dropped control signal: {e}");
                false
            }
        }
    }

    /// Stop the pacing loop. Idempotent; `Killed` is terminal.
    pub fn kill(&self) {
        let mut status = self.status.lock();
        if *status != StreamStatus::Killed {
            *status = StreamStatus::Killed;
            self.kill.cancel();
            tracing::info!("Stream manager killed");
        }
    }

    /// Alias of [`StreamManager::kill`].
    pub fn stop(&self) {
        self.kill();
    }

    /// Serialized live playlist.
    pub fn playlist_text(&self) -> String {
        self.window.read().render(self.formatter.as_ref())
    }

    pub fn header(&self) -> PlaylistHeader {
        self.window.read().header()
    }

    pub fn snapshot(&self) -> StreamSnapshot {
        let (header, segment_count) = {
            let window = self.window.read();
            (window.header(), window.segment_count())
        };
        StreamSnapshot {
            status: self.status(),
            header,
            segment_count,
            buffered_secs: self.buffer.total_duration(),
            buffered_segments: self.buffer.len(),
            last_update: *self.last_update.read(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::station::FileStorage;
    use radiocast_media::{PlaylistWindow, Segment, UpdateMode};

    fn manager(max_segments: usize) -> Arc<StreamManager> {
        let window = PlaylistWindow::new(max_segments, 10.0).unwrap();
        Arc::new(StreamManager::new(
            Box::new(window),
            Arc::new(SegmentBuffer::default()),
            &PacingConfig::default(),
        ))
    }

    #[test]
    fn test_initial_state() {
        let m = manager(3);
        assert_eq!(m.status(), StreamStatus::Default);
        assert_eq!(
            m.playlist_text(),
            "#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:10.000\n#EXT-X-MEDIA-SEQUENCE:0\n"
        );
        let snapshot = m.snapshot();
        assert_eq!(snapshot.segment_count, 0);
        assert!(snapshot.last_update.is_none());
    }

    #[test]
    fn test_pause_ignored_before_run() {
        let m = manager(3);
        assert!(!m.pause());
        assert!(!m.resume());
        assert_eq!(m.status(), StreamStatus::Default);
    }

    #[test]
    fn test_kill_is_idempotent() {
        let m = manager(3);
        m.kill();
        m.kill();
        m.stop();
        assert_eq!(m.status(), StreamStatus::Killed);
        assert!(m.status().is_terminal());
    }

    #[tokio::test]
    async fn test_run_after_kill_is_noop() {
        let m = manager(3);
        m.kill();
        m.run().await;
        assert_eq!(m.status(), StreamStatus::Killed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_applies_segment_and_returns_wait() {
        let m = manager(1);
        m.buffer().push(Segment::new(7.5, "/a.ts", true));
        *m.status.lock() = StreamStatus::Streaming;

        assert_eq!(m.tick().await, Duration::from_secs_f64(7.5));
        assert_eq!(m.snapshot().segment_count, 1);
        assert!(m.snapshot().last_update.is_some());
        assert_eq!(m.tick().await, Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_skips_while_paused() {
        let m = manager(1);
        m.buffer().push(Segment::new(7.5, "/a.ts", true));
        *m.status.lock() = StreamStatus::Paused;

        assert_eq!(m.tick().await, Duration::from_secs(1));
        assert_eq!(m.buffer().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_drops_invalid_segment() {
        let m = manager(2);
        m.buffer().push(Segment::new(0.0, "/bad.ts", false));
        *m.status.lock() = StreamStatus::Streaming;

        assert_eq!(m.tick().await, Duration::from_secs(1));
        assert_eq!(m.snapshot().segment_count, 0);
        assert!(m.buffer().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_survives_huge_and_non_finite_durations() {
        let m = manager(1);
        *m.status.lock() = StreamStatus::Streaming;

        m.buffer().push(Segment::new(f64::INFINITY, "/inf.ts", true));
        assert_eq!(m.tick().await, Duration::from_secs(1));
        m.buffer().push(Segment::new(f64::NAN, "/nan.ts", false));
        assert_eq!(m.tick().await, Duration::from_secs(1));
        assert_eq!(m.snapshot().segment_count, 0);

        // Finite but beyond Duration's range: applied, paced at the idle interval.
        m.buffer().push(Segment::new(1e30, "/huge.ts", false));
        assert_eq!(m.tick().await, Duration::from_secs(1));
        assert_eq!(m.snapshot().segment_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_with_parsed_infinite_extinf() {
        let m = manager(1);
        *m.status.lock() = StreamStatus::Streaming;

        let parsed = M3u8Formatter::default().parse("#EXTM3U\n#EXTINF:inf,\na.ts\n");
        for segment in parsed.segments {
            m.buffer().push(segment);
        }
        assert_eq!(m.tick().await, Duration::from_secs(1));
        assert_eq!(m.snapshot().segment_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resync_mode_renders_configured_extension() {
        let playlist = PlaylistConfig {
            mode: UpdateMode::Resync,
            max_pairs: 2,
            segment_extension: ".aac".to_string(),
            ..PlaylistConfig::default()
        };
        let m = StreamManager::from_config(
            &playlist,
            &PacingConfig::default(),
            Arc::new(SegmentBuffer::default()),
        )
        .unwrap();
        *m.status.lock() = StreamStatus::Streaming;

        m.buffer().push(Segment::new(4.0, "/a.aac", true));
        m.buffer().push(Segment::new(5.0, "/b.aac", false));
        m.tick().await;
        m.tick().await;

        assert_eq!(
            m.playlist_text(),
            "#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:10.000\n#EXT-X-MEDIA-SEQUENCE:0\n\
#EXT-X-DISCONTINUITY\n#EXTINF:4.000,\n/a.aac\n#EXTINF:5.000,\n/b.aac\n"
        );
    }

    #[tokio::test]
    async fn test_tick_persists_rendered_playlist() {
        let dir = tempfile::tempdir().unwrap();
        let window = PlaylistWindow::new(2, 10.0).unwrap();
        let m = StreamManager::new(
            Box::new(window),
            Arc::new(SegmentBuffer::default()),
            &PacingConfig::default(),
        )
        .with_storage(Box::new(FileStorage::new(dir.path())), "stream.m3u8");
        *m.status.lock() = StreamStatus::Streaming;

        m.buffer().push(Segment::new(3.0, "/a.ts", true));
        m.tick().await;

        let stored = std::fs::read_to_string(dir.path().join("stream.m3u8")).unwrap();
        assert_eq!(stored, m.playlist_text());
        assert!(stored.ends_with("/a.ts\n"));
    }
}
