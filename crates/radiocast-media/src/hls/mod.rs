//! HLS live playlist: the m3u8 codec and the two live-window strategies.

pub mod playlist;
pub mod resync;
pub mod updater;
pub mod window;

pub use playlist::{
    M3u8Formatter, MediaPlaylist, PlaylistFormatter, PlaylistHeader, Segment,
    DEFAULT_SEGMENT_EXTENSION,
};
pub use resync::{LinePlaylist, ResyncWindow, DEFAULT_MAX_PAIRS};
pub use updater::{build_updater, PlaylistUpdater, UpdateMode};
pub use window::PlaylistWindow;
