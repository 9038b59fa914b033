//! Radiocast - live HLS radio playlist engine
//!
//! This library crate exposes the station, configuration and HTTP layers
//! for the binary and for integration testing.

pub mod config;
pub mod server;
pub mod station;
