//! Direct append/evict sliding window.
//!
//! The window owns the playlist header and at most `max_segments` segments.
//! Every eviction advances `EXT-X-MEDIA-SEQUENCE`, and evicting a segment that
//! opened a new content item also advances `EXT-X-DISCONTINUITY-SEQUENCE`.

use radiocast_common::{Error, Result};

use super::playlist::{MediaPlaylist, PlaylistHeader, Segment};

/// Bounded live playlist updated one segment at a time.
#[derive(Debug, Clone)]
pub struct PlaylistWindow {
    playlist: MediaPlaylist,
    max_segments: usize,
}

impl PlaylistWindow {
    /// Create an empty window.
    pub fn new(max_segments: usize, target_duration: f64) -> Result<Self> {
        Self::from_playlist(MediaPlaylist::new(target_duration), max_segments)
    }

    /// Wrap an existing playlist, evicting from the front until it fits.
    pub fn from_playlist(playlist: MediaPlaylist, max_segments: usize) -> Result<Self> {
        if max_segments == 0 {
            return Err(Error::invalid_config("max_segments must be greater than 0"));
        }
        let mut window = Self {
            playlist,
            max_segments,
        };
        while window.len() > max_segments {
            window.remove_oldest_segment()?;
        }
        Ok(window)
    }

    /// Header metadata.
    pub fn header(&self) -> &PlaylistHeader {
        &self.playlist.header
    }

    /// The whole playlist, for serialization.
    pub fn playlist(&self) -> &MediaPlaylist {
        &self.playlist
    }

    /// Number of segments currently advertised.
    pub fn len(&self) -> usize {
        self.playlist.segments.len()
    }

    /// Whether the window holds no segments.
    pub fn is_empty(&self) -> bool {
        self.playlist.segments.is_empty()
    }

    /// Capacity of the window.
    pub fn max_segments(&self) -> usize {
        self.max_segments
    }

    /// Whether the window holds `max_segments` segments.
    pub fn is_full(&self) -> bool {
        self.len() >= self.max_segments
    }

    /// Append one segment without evicting.
    pub fn append_segment(&mut self, segment: Segment) -> Result<()> {
        if self.is_full() {
            return Err(Error::PlaylistFull(self.max_segments));
        }
        if !segment.has_playable_duration() {
            return Err(Error::InvalidDuration(segment.duration));
        }
        self.playlist.segments.push_back(segment);
        Ok(())
    }

    /// Evict the oldest segment and advance the sequence counters.
    pub fn remove_oldest_segment(&mut self) -> Result<Segment> {
        let segment = self
            .playlist
            .segments
            .pop_front()
            .ok_or(Error::EmptyPlaylist)?;
        self.playlist.header.record_eviction(segment.discontinuity);
        Ok(segment)
    }

    /// Apply one segment: evict just enough to make room, then append.
    ///
    /// Returns the duration of the oldest segment once the window is at
    /// capacity, which is how long the caller should wait before the next
    /// update. Returns `0.0` while the window is still filling.
    pub fn update(&mut self, segment: Segment) -> Result<f64> {
        if !segment.has_playable_duration() {
            return Err(Error::InvalidDuration(segment.duration));
        }

        while self.is_full() {
            let evicted = self.remove_oldest_segment()?;
            tracing::trace!(
                uri = %evicted.uri,
                media_sequence = self.playlist.header.media_sequence,
                discontinuity_sequence = self.playlist.header.discontinuity_sequence,
                "Evicted segment"
            );
        }

        self.append_segment(segment)?;

        match self.playlist.segments.front() {
            Some(oldest) if self.is_full() => Ok(oldest.duration),
            _ => Ok(0.0),
        }
    }
}
