//! HLS live playlist structures and the m3u8 codec.

use std::collections::VecDeque;
use std::fmt;

use radiocast_common::paths::is_segment_uri;

/// `#EXTM3U`
pub const TAG_EXTM3U: &str = "#EXTM3U";
/// `#EXT-X-VERSION:`
pub const TAG_VERSION: &str = "#EXT-X-VERSION:";
/// `#EXT-X-TARGETDURATION:`
pub const TAG_TARGET_DURATION: &str = "#EXT-X-TARGETDURATION:";
/// `#EXT-X-MEDIA-SEQUENCE:`
pub const TAG_MEDIA_SEQUENCE: &str = "#EXT-X-MEDIA-SEQUENCE:";
/// `#EXT-X-DISCONTINUITY-SEQUENCE:`
pub const TAG_DISCONTINUITY_SEQUENCE: &str = "#EXT-X-DISCONTINUITY-SEQUENCE:";
/// `#EXTINF:`
pub const TAG_EXTINF: &str = "#EXTINF:";
/// `#EXT-X-DISCONTINUITY`
pub const TAG_DISCONTINUITY: &str = "#EXT-X-DISCONTINUITY";

/// Playlist version written when none is given.
pub const DEFAULT_VERSION: u32 = 3;

/// Segment file extension recognized by the default formatter.
pub const DEFAULT_SEGMENT_EXTENSION: &str = ".ts";

/// One playable unit of a playlist.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Segment {
    /// Duration in seconds.
    pub duration: f64,
    /// Segment URI.
    pub uri: String,
    /// Discontinuity before this segment (first segment of a new content item).
    pub discontinuity: bool,
}

impl Segment {
    /// Create a new segment.
    pub fn new(duration: f64, uri: impl Into<String>, discontinuity: bool) -> Self {
        Self {
            duration,
            uri: uri.into(),
            discontinuity,
        }
    }

    /// Return a copy with the discontinuity flag set to `discontinuity`.
    pub fn with_discontinuity(mut self, discontinuity: bool) -> Self {
        self.discontinuity = discontinuity;
        self
    }

    /// Whether the duration is finite and positive.
    pub fn has_playable_duration(&self) -> bool {
        self.duration.is_finite() && self.duration > 0.0
    }

    fn is_empty(&self) -> bool {
        self.duration == 0.0 && self.uri.is_empty() && !self.discontinuity
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "duration: {:.3}, uri: {}, discontinuity: {}",
            self.duration, self.uri, self.discontinuity
        )
    }
}

/// Header metadata of a live playlist.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct PlaylistHeader {
    /// `EXT-X-VERSION`.
    pub version: u32,
    /// `EXT-X-TARGETDURATION` in seconds.
    pub target_duration: f64,
    /// Number of segments ever evicted from the window.
    pub media_sequence: u64,
    /// Number of evicted segments that carried a discontinuity.
    pub discontinuity_sequence: u64,
}

impl PlaylistHeader {
    /// Create a header for a fresh playlist.
    pub fn new(target_duration: f64) -> Self {
        Self {
            target_duration,
            ..Self::default()
        }
    }

    /// Account for one evicted segment.
    pub fn record_eviction(&mut self, discontinuity: bool) {
        self.media_sequence += 1;
        if discontinuity {
            self.discontinuity_sequence += 1;
        }
    }
}

impl Default for PlaylistHeader {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION,
            target_duration: 0.0,
            media_sequence: 0,
            discontinuity_sequence: 0,
        }
    }
}

/// Header plus ordered segments.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct MediaPlaylist {
    /// Header metadata.
    pub header: PlaylistHeader,
    /// Segments, oldest first.
    pub segments: VecDeque<Segment>,
}

impl MediaPlaylist {
    /// Create an empty playlist with the given target duration.
    pub fn new(target_duration: f64) -> Self {
        Self {
            header: PlaylistHeader::new(target_duration),
            segments: VecDeque::new(),
        }
    }

    /// Total duration of all segments in seconds.
    pub fn total_duration(&self) -> f64 {
        self.segments.iter().map(|s| s.duration).sum()
    }
}

/// Serialization strategy for live playlists.
pub trait PlaylistFormatter: Send + Sync {
    /// Render a playlist to m3u8 text.
    fn format(&self, playlist: &MediaPlaylist) -> String;

    /// Parse m3u8 text. Never fails; malformed values become zero.
    fn parse(&self, text: &str) -> MediaPlaylist;
}

/// The default m3u8 formatter.
#[derive(Debug, Clone)]
pub struct M3u8Formatter {
    segment_extension: String,
}

impl M3u8Formatter {
    /// Create a formatter recognizing URIs ending in `segment_extension`.
    pub fn new(segment_extension: impl Into<String>) -> Self {
        Self {
            segment_extension: segment_extension.into(),
        }
    }

    /// Extension used to recognize segment URI lines.
    pub fn segment_extension(&self) -> &str {
        &self.segment_extension
    }
}

impl Default for M3u8Formatter {
    fn default() -> Self {
        Self::new(DEFAULT_SEGMENT_EXTENSION)
    }
}

impl PlaylistFormatter for M3u8Formatter {
    fn format(&self, playlist: &MediaPlaylist) -> String {
        let header = &playlist.header;
        let mut lines = vec![
            TAG_EXTM3U.to_string(),
            format!("{TAG_VERSION}{}", header.version),
            format!("{TAG_TARGET_DURATION}{:.3}", header.target_duration),
            format!("{TAG_MEDIA_SEQUENCE}{}", header.media_sequence),
        ];
        if header.discontinuity_sequence > 0 {
            lines.push(format!(
                "{TAG_DISCONTINUITY_SEQUENCE}{}",
                header.discontinuity_sequence
            ));
        }

        for segment in &playlist.segments {
            push_segment_lines(&mut lines, segment);
        }

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }

    fn parse(&self, text: &str) -> MediaPlaylist {
        let mut playlist = MediaPlaylist::default();
        let mut lines = split_lines(text).peekable();

        while let Some(line) = lines.peek() {
            if is_segment_marker(line, &self.segment_extension) {
                break;
            }
            apply_header_line(&mut playlist.header, line);
            lines.next();
        }

        playlist.segments = collect_segments(lines, &self.segment_extension);
        playlist
    }
}

/// Append the m3u8 lines describing one segment.
pub(crate) fn push_segment_lines(lines: &mut Vec<String>, segment: &Segment) {
    if segment.discontinuity {
        lines.push(TAG_DISCONTINUITY.to_string());
    }
    if segment.duration > 0.0 {
        lines.push(extinf_line(segment.duration));
    }
    if !segment.uri.is_empty() {
        lines.push(segment.uri.clone());
    }
}

/// `#EXTINF:<duration>,`
pub(crate) fn extinf_line(duration: f64) -> String {
    format!("{TAG_EXTINF}{duration:.3},")
}

/// Split raw text into trimmed, non-blank lines.
pub fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty())
}

/// Whether `line` starts the segment region of a playlist.
pub fn is_segment_marker(line: &str, extension: &str) -> bool {
    line.starts_with(TAG_EXTINF)
        || is_discontinuity_tag(line)
        || is_segment_uri(line, extension)
}

/// Whether `line` is exactly the discontinuity tag (and not the
/// discontinuity-sequence header).
pub fn is_discontinuity_tag(line: &str) -> bool {
    line == TAG_DISCONTINUITY
}

/// Read the numeric value of `tag` on `line`.
///
/// Returns `None` if the line does not carry the tag. A malformed or
/// non-finite value is logged and read as `0`.
pub fn tag_float(line: &str, tag: &str) -> Option<f64> {
    let raw = line.strip_prefix(tag)?;
    let value = raw.trim().trim_end_matches(',');
    // EXTINF may carry a title after the comma.
    let value = value.split(',').next().unwrap_or_default().trim();
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        Ok(v) => {
            tracing::warn!(tag = tag, line = line, value = v, "Non-finite tag value, using 0");
            Some(0.0)
        }
        Err(e) => {
            tracing::warn!(tag = tag, line = line, error = %e, "Malformed tag value, using 0");
            Some(0.0)
        }
    }
}

fn apply_header_line(header: &mut PlaylistHeader, line: &str) {
    if let Some(v) = tag_float(line, TAG_VERSION) {
        header.version = v as u32;
    } else if let Some(v) = tag_float(line, TAG_MEDIA_SEQUENCE) {
        header.media_sequence = v as u64;
    } else if let Some(v) = tag_float(line, TAG_DISCONTINUITY_SEQUENCE) {
        header.discontinuity_sequence = v as u64;
    } else if let Some(v) = tag_float(line, TAG_TARGET_DURATION) {
        header.target_duration = v;
    }
}

/// Build segments from segment-region lines.
///
/// A URI completes the pending segment. A pending segment left at the end of
/// input is kept.
pub(crate) fn collect_segments<'a>(
    lines: impl Iterator<Item = &'a str>,
    extension: &str,
) -> VecDeque<Segment> {
    let mut segments = VecDeque::new();
    let mut pending = Segment::default();

    for line in lines {
        if is_discontinuity_tag(line) {
            pending.discontinuity = true;
        } else if let Some(duration) = tag_float(line, TAG_EXTINF) {
            pending.duration = duration;
        } else if is_segment_uri(line, extension) {
            pending.uri = line.to_string();
            segments.push_back(std::mem::take(&mut pending));
        }
    }

    if !pending.is_empty() {
        segments.push_back(pending);
    }
    segments
}
