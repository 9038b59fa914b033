//! Windowed resync against an upstream m3u8.
//!
//! Instead of receiving discrete segments, this window copies `EXTINF` + URI
//! line pairs out of a periodically re-read source playlist. It keeps at most
//! `max_pairs` pairs and inserts `#EXT-X-DISCONTINUITY` whenever a copy starts
//! from the top of a source (a new content item).

use std::collections::VecDeque;
use std::path::Path;

use radiocast_common::paths::rewrite_segment_uri;
use radiocast_common::{Error, Result};

use super::playlist::{
    extinf_line, is_discontinuity_tag, is_segment_marker, split_lines, tag_float, MediaPlaylist,
    PlaylistHeader, Segment, TAG_DISCONTINUITY, TAG_EXTINF,
};

/// Pair capacity of a resync window unless configured otherwise.
pub const DEFAULT_MAX_PAIRS: usize = 6;

/// Line-level view of a source playlist.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinePlaylist {
    /// Lines before the first segment marker.
    pub header: Vec<String>,
    /// Lines from the first segment marker on.
    pub segments: Vec<String>,
    /// Number of segment URI lines.
    pub segment_count: usize,
}

impl LinePlaylist {
    /// Split `text` into header and segment-region lines.
    pub fn parse(text: &str, extension: &str) -> Self {
        Self::parse_with(text, extension, |uri| uri.to_string())
    }

    /// Like [`LinePlaylist::parse`], rewriting every segment URI from its
    /// location next to `source_path` to a public URL below `local_root`.
    pub fn parse_from_source(
        text: &str,
        extension: &str,
        source_path: &Path,
        local_root: &Path,
    ) -> Self {
        Self::parse_with(text, extension, |uri| {
            rewrite_segment_uri(uri, source_path, local_root)
        })
    }

    /// Read and parse a source playlist from disk.
    pub fn load(path: &Path, extension: &str, local_root: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::source_read(path.display().to_string(), e))?;
        Ok(Self::parse_from_source(&text, extension, path, local_root))
    }

    fn parse_with(text: &str, extension: &str, rewrite: impl Fn(&str) -> String) -> Self {
        let mut playlist = Self::default();
        let mut in_header = true;

        for line in split_lines(text) {
            if in_header && is_segment_marker(line, extension) {
                in_header = false;
            }
            if in_header {
                playlist.header.push(line.to_string());
            } else if !line.starts_with('#') && line.ends_with(extension) {
                playlist.segment_count += 1;
                playlist.segments.push(rewrite(line));
            } else {
                playlist.segments.push(line.to_string());
            }
        }
        playlist
    }

    /// Starting indexes of every `EXTINF` + URI pair in the segment region.
    pub fn pair_indexes(&self) -> Vec<usize> {
        (0..self.segments.len().saturating_sub(1))
            .filter(|&i| self.segments[i].starts_with(TAG_EXTINF))
            .collect()
    }
}

/// Bounded, line-oriented live window.
#[derive(Debug, Clone)]
pub struct ResyncWindow {
    header: PlaylistHeader,
    lines: VecDeque<String>,
    pair_count: usize,
    max_pairs: usize,
}

impl ResyncWindow {
    /// Create an empty window holding at most `max_pairs` pairs.
    pub fn new(max_pairs: usize, target_duration: f64) -> Result<Self> {
        if max_pairs == 0 {
            return Err(Error::invalid_config("max_pairs must be greater than 0"));
        }
        Ok(Self {
            header: PlaylistHeader::new(target_duration),
            lines: VecDeque::new(),
            pair_count: 0,
            max_pairs,
        })
    }

    /// Header metadata.
    pub fn header(&self) -> &PlaylistHeader {
        &self.header
    }

    /// Segment-region lines, oldest first.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// Number of `EXTINF` + URI pairs in the window.
    pub fn pair_count(&self) -> usize {
        self.pair_count
    }

    /// Pair capacity.
    pub fn max_pairs(&self) -> usize {
        self.max_pairs
    }

    /// Copy the pair starting at `source.segments[index]` into the window.
    ///
    /// `index == 0` marks the start of new content and inserts a
    /// discontinuity. Returns the `EXTINF` duration of the new first segment
    /// when a pair was evicted, else `0.0`.
    pub fn update(&mut self, source: &LinePlaylist, index: usize) -> Result<f64> {
        let pair = index
            .checked_add(2)
            .and_then(|end| source.segments.get(index..end))
            .ok_or_else(|| {
                Error::invalid_input(format!(
                    "no segment pair at index {index} (source has {} lines)",
                    source.segments.len()
                ))
            })?;
        let (extinf, uri) = (&pair[0], &pair[1]);
        if !extinf.starts_with(TAG_EXTINF) || uri.starts_with('#') {
            return Err(Error::invalid_input(format!(
                "lines at index {index} are not an EXTINF/URI pair"
            )));
        }

        self.push_pair(extinf.clone(), uri.clone(), index == 0)
    }

    /// Copy one discrete segment into the window as a pair.
    pub fn update_segment(&mut self, segment: Segment) -> Result<f64> {
        if !segment.has_playable_duration() {
            return Err(Error::InvalidDuration(segment.duration));
        }
        if segment.uri.is_empty() {
            return Err(Error::invalid_input("segment has no URI"));
        }
        self.push_pair(
            extinf_line(segment.duration),
            segment.uri,
            segment.discontinuity,
        )
    }

    fn push_pair(&mut self, extinf: String, uri: String, discontinuity: bool) -> Result<f64> {
        let evicted = if self.pair_count >= self.max_pairs {
            self.evict_pair()?;
            true
        } else {
            false
        };

        if discontinuity {
            self.lines.push_back(TAG_DISCONTINUITY.to_string());
        }
        self.lines.push_back(extinf);
        self.lines.push_back(uri);
        self.pair_count += 1;

        if !evicted {
            return Ok(0.0);
        }
        Ok(self
            .lines
            .iter()
            .find_map(|l| tag_float(l, TAG_EXTINF))
            .unwrap_or(0.0))
    }

    /// Drop the oldest pair together with a discontinuity line leading it.
    fn evict_pair(&mut self) -> Result<()> {
        let mut discontinuity = false;
        if self.lines.front().is_some_and(|l| is_discontinuity_tag(l)) {
            self.lines.pop_front();
            discontinuity = true;
        }

        loop {
            let line = self.lines.pop_front().ok_or(Error::EmptyPlaylist)?;
            if !line.starts_with('#') {
                break;
            }
        }

        self.pair_count -= 1;
        self.header.record_eviction(discontinuity);
        Ok(())
    }

    /// Structured view of the window for serialization.
    ///
    /// Every pair ends in its URI line, so segments are cut there whatever
    /// the URI looks like.
    pub fn to_playlist(&self) -> MediaPlaylist {
        let mut segments = VecDeque::with_capacity(self.pair_count);
        let mut pending = Segment::default();

        for line in self.lines() {
            if is_discontinuity_tag(line) {
                pending.discontinuity = true;
            } else if let Some(duration) = tag_float(line, TAG_EXTINF) {
                pending.duration = duration;
            } else if !line.starts_with('#') {
                pending.uri = line.to_string();
                segments.push_back(std::mem::take(&mut pending));
            }
        }

        MediaPlaylist {
            header: self.header,
            segments,
        }
    }
}
