//! Common interface over the two live-window strategies.

use std::fmt;
use std::str::FromStr;

use radiocast_common::{Error, Result};

use super::playlist::{MediaPlaylist, PlaylistFormatter, PlaylistHeader, Segment};
use super::resync::ResyncWindow;
use super::window::PlaylistWindow;

/// A live window that accepts one segment per pacing tick.
pub trait PlaylistUpdater: Send + Sync {
    /// Apply one segment. Returns how long to wait before the next update.
    fn update(&mut self, segment: Segment) -> Result<f64>;

    /// Current header metadata.
    fn header(&self) -> PlaylistHeader;

    /// Number of segments currently advertised.
    fn segment_count(&self) -> usize;

    /// Owned copy of the current playlist.
    fn snapshot(&self) -> MediaPlaylist;

    /// Serialize the current playlist.
    fn render(&self, formatter: &dyn PlaylistFormatter) -> String {
        formatter.format(&self.snapshot())
    }
}

impl PlaylistUpdater for PlaylistWindow {
    fn update(&mut self, segment: Segment) -> Result<f64> {
        PlaylistWindow::update(self, segment)
    }

    fn header(&self) -> PlaylistHeader {
        *PlaylistWindow::header(self)
    }

    fn segment_count(&self) -> usize {
        self.len()
    }

    fn snapshot(&self) -> MediaPlaylist {
        self.playlist().clone()
    }

    fn render(&self, formatter: &dyn PlaylistFormatter) -> String {
        formatter.format(self.playlist())
    }
}

impl PlaylistUpdater for ResyncWindow {
    fn update(&mut self, segment: Segment) -> Result<f64> {
        self.update_segment(segment)
    }

    fn header(&self) -> PlaylistHeader {
        *ResyncWindow::header(self)
    }

    fn segment_count(&self) -> usize {
        self.pair_count()
    }

    fn snapshot(&self) -> MediaPlaylist {
        self.to_playlist()
    }
}

/// Which window strategy backs the live playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serialize",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum UpdateMode {
    /// Segment-level append/evict ([`PlaylistWindow`]).
    #[default]
    Direct,
    /// Line-level pair copying ([`ResyncWindow`]).
    Resync,
}

impl fmt::Display for UpdateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateMode::Direct => write!(f, "direct"),
            UpdateMode::Resync => write!(f, "resync"),
        }
    }
}

impl FromStr for UpdateMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "direct" => Ok(UpdateMode::Direct),
            "resync" => Ok(UpdateMode::Resync),
            other => Err(Error::invalid_config(format!(
                "unknown playlist mode '{other}' (expected 'direct' or 'resync')"
            ))),
        }
    }
}

/// Build the updater for `mode`.
pub fn build_updater(
    mode: UpdateMode,
    max_segments: usize,
    target_duration: f64,
) -> Result<Box<dyn PlaylistUpdater>> {
    Ok(match mode {
        UpdateMode::Direct => Box::new(PlaylistWindow::new(max_segments, target_duration)?),
        UpdateMode::Resync => Box::new(ResyncWindow::new(max_segments, target_duration)?),
    })
}
