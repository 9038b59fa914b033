use radiocast_common::paths::DEFAULT_LOCAL_ROOT;
use radiocast_media::UpdateMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub station: StationConfig,

    #[serde(default)]
    pub playlist: PlaylistConfig,

    #[serde(default)]
    pub buffer: BufferConfig,

    #[serde(default)]
    pub pacing: PacingConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Path the live playlist is served under (without leading slash)
    #[serde(default = "default_playlist_name")]
    pub playlist_name: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_playlist_name() -> String {
    "stream.m3u8".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            playlist_name: default_playlist_name(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StationConfig {
    /// Local directory that maps to the public URL root. Content lives under
    /// `<root>/contents/<kind>/<id>/<id>.m3u8`.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Write the rendered playlist here after every update
    #[serde(default)]
    pub output_path: Option<PathBuf>,
}

fn default_root() -> PathBuf {
    PathBuf::from(DEFAULT_LOCAL_ROOT)
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            output_path: None,
        }
    }
}

impl StationConfig {
    /// Directory served under `/contents`.
    pub fn contents_dir(&self) -> PathBuf {
        self.root.join("contents")
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaylistConfig {
    #[serde(default)]
    pub mode: UpdateMode,

    /// Window capacity in segments (direct mode)
    #[serde(default = "default_max_segments")]
    pub max_segments: usize,

    /// Window capacity in EXTINF/URI pairs (resync mode)
    #[serde(default = "default_max_pairs")]
    pub max_pairs: usize,

    #[serde(default = "default_target_duration")]
    pub target_duration: f64,

    #[serde(default = "default_segment_extension")]
    pub segment_extension: String,
}

fn default_max_segments() -> usize {
    6
}
fn default_max_pairs() -> usize {
    radiocast_media::hls::DEFAULT_MAX_PAIRS
}
fn default_target_duration() -> f64 {
    10.0
}
fn default_segment_extension() -> String {
    radiocast_media::hls::DEFAULT_SEGMENT_EXTENSION.to_string()
}

impl Default for PlaylistConfig {
    fn default() -> Self {
        Self {
            mode: UpdateMode::default(),
            max_segments: default_max_segments(),
            max_pairs: default_max_pairs(),
            target_duration: default_target_duration(),
            segment_extension: default_segment_extension(),
        }
    }
}

impl PlaylistConfig {
    /// Capacity for the configured mode.
    pub fn capacity(&self) -> usize {
        match self.mode {
            UpdateMode::Direct => self.max_segments,
            UpdateMode::Resync => self.max_pairs,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BufferConfig {
    /// Buffered seconds above which new content is rejected
    #[serde(default = "default_buffer_threshold")]
    pub threshold_secs: f64,
}

fn default_buffer_threshold() -> f64 {
    100.0
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            threshold_secs: default_buffer_threshold(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PacingConfig {
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    /// Tick used while paused, on an empty buffer, or after a non-positive wait
    #[serde(default = "default_idle_interval")]
    pub idle_interval_ms: u64,
}

fn default_initial_delay() -> u64 {
    250
}
fn default_idle_interval() -> u64 {
    1000
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay(),
            idle_interval_ms: default_idle_interval(),
        }
    }
}

impl PacingConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn idle_interval(&self) -> Duration {
        Duration::from_millis(self.idle_interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_scheduler_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub selector: SelectorKind,

    #[serde(default)]
    pub admission: AdmissionKind,

    #[serde(default = "default_retry_interval")]
    pub retry_interval_secs: u64,

    /// Estimated buffered seconds the threshold policy keeps queued
    #[serde(default = "default_admission_threshold")]
    pub threshold_secs: f64,
}

fn default_scheduler_enabled() -> bool {
    true
}
fn default_retry_interval() -> u64 {
    10
}
fn default_admission_threshold() -> f64 {
    80.0
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_scheduler_enabled(),
            selector: SelectorKind::default(),
            admission: AdmissionKind::default(),
            retry_interval_secs: default_retry_interval(),
            threshold_secs: default_admission_threshold(),
        }
    }
}

impl SchedulerConfig {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SelectorKind {
    #[default]
    Random,
    Sequential,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AdmissionKind {
    #[default]
    Reactive,
    Threshold,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// JSON track index (`[{id, title, length, artist, m3u8}, ...]`)
    #[serde(default)]
    pub index: Option<PathBuf>,

    /// Inline catalog, used when no index is configured
    #[serde(default)]
    pub contents: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CatalogEntry {
    pub id: u32,

    #[serde(default)]
    pub kind: crate::station::ContentKind,

    /// Length in seconds
    pub length: u32,
}
