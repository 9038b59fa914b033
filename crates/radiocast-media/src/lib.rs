//! Radiocast-Media: HLS live playlist model and m3u8 codec
//!
//! This crate owns everything a radio station needs to advertise a live HLS
//! stream, independent of how segments are produced or served.
//!
//! # Modules
//!
//! - `hls::playlist` - segment/header model, m3u8 formatting and parsing
//! - `hls::window` - direct append/evict window (one segment per update)
//! - `hls::resync` - line-level window copied out of a source m3u8
//! - `hls::updater` - the `PlaylistUpdater` trait both windows implement
//!
//! # Example
//!
//! ```
//! use radiocast_media::{M3u8Formatter, PlaylistFormatter, PlaylistWindow, Segment};
//!
//! let mut window = PlaylistWindow::new(2, 10.0).unwrap();
//! window.update(Segment::new(10.0, "/a.ts", true)).unwrap();
//! let text = M3u8Formatter::default().format(window.playlist());
//! assert!(text.starts_with("#EXTM3U\n"));
//! ```

pub mod hls;

pub use hls::{
    build_updater, LinePlaylist, M3u8Formatter, MediaPlaylist, PlaylistFormatter, PlaylistHeader,
    PlaylistUpdater, PlaylistWindow, ResyncWindow, Segment, UpdateMode,
};
pub use radiocast_common::{Error, Result};
