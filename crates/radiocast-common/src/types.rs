//! Core type definitions shared by the stream manager and the HTTP layer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a stream manager.
///
/// `Default → Streaming ⇄ Paused → Killed`. `Killed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamStatus {
    /// Created, not yet running.
    #[default]
    Default,
    /// Pacing loop is releasing segments.
    Streaming,
    /// Pacing loop is alive but holds segments back.
    Paused,
    /// Terminal.
    Killed,
}

impl StreamStatus {
    /// Alias used by callers that speak of stopping rather than killing.
    pub const STOPPED: StreamStatus = StreamStatus::Killed;

    /// Whether no further transitions are possible.
    pub fn is_terminal(self) -> bool {
        self == Self::Killed
    }
}

impl fmt::Display for StreamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::Streaming => write!(f, "streaming"),
            Self::Paused => write!(f, "paused"),
            Self::Killed => write!(f, "killed"),
        }
    }
}
