//! Common error types used throughout radiocast.
//!
//! One enum covers the playlist window, the segment buffer, the scheduler and
//! the content resolver. Only [`Error::BufferFull`] is expected during normal
//! operation; everything else is either a configuration problem or a
//! degraded upstream source.

/// Common error type for radiocast.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A segment with a non-positive duration was offered to the window.
    #[error("invalid segment duration: {0}")]
    InvalidDuration(f64),

    /// The window is at capacity and the append was rejected.
    #[error("playlist is full: max segments limit ({0}) reached")]
    PlaylistFull(usize),

    /// Eviction was attempted on an empty window.
    #[error("operation failed: playlist is empty")]
    EmptyPlaylist,

    /// Pop was attempted on an empty segment buffer.
    #[error("operation failed: segment buffer is empty")]
    EmptyBuffer,

    /// The segment buffer already holds more than its threshold.
    #[error("segment buffer is full (current: {current:.2}, max: {max:.2})")]
    BufferFull {
        /// Seconds currently buffered.
        current: f64,
        /// Configured admission threshold in seconds.
        max: f64,
    },

    /// The selector could not produce any content.
    #[error("content selection failed: {0}")]
    ContentSelectionFailed(String),

    /// Reading an upstream playlist failed.
    #[error("failed to read source {path}: {source}")]
    SourceReadFailed {
        /// Path that could not be read.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An upstream playlist or catalog could not be parsed.
    #[error("failed to parse {0}")]
    ParseFailed(String),

    /// A configuration value makes the component unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new ParseFailed error.
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        Self::ParseFailed(msg.into())
    }

    /// Create a new InvalidConfig error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new InvalidInput error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new ContentSelectionFailed error.
    pub fn selection<S: Into<String>>(msg: S) -> Self {
        Self::ContentSelectionFailed(msg.into())
    }

    /// Create a new SourceReadFailed error.
    pub fn source_read<S: Into<String>>(path: S, source: std::io::Error) -> Self {
        Self::SourceReadFailed {
            path: path.into(),
            source,
        }
    }

    /// Whether the caller may retry the same operation later.
    ///
    /// Backpressure is a scheduling signal, not a fault.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::BufferFull { .. })
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
