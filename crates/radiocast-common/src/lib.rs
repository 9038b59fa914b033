//! Radiocast-Common: Shared types, constants, and utilities.
//!
//! This crate provides common functionality used across radiocast:
//!
//! - **Error Handling**: The unified error type and result alias
//! - **Stream Status**: The lifecycle enum of the pacing loop
//! - **Path Utilities**: Local segment path to public URL mapping
//!
//! # Examples
//!
//! ```
//! use radiocast_common::{Error, Result, StreamStatus};
//! use radiocast_common::paths::local_to_url;
//!
//! let url = local_to_url("/srv/radio/contents/music/1/a.ts", "/srv/radio");
//! assert_eq!(url, "/contents/music/1/a.ts");
//!
//! assert_eq!(StreamStatus::default(), StreamStatus::Default);
//!
//! fn example() -> Result<()> {
//!     Err(Error::EmptyBuffer)
//! }
//! assert!(example().is_err());
//! ```

pub mod error;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
