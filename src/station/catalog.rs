//! Content catalog loading.

use std::path::Path;

use radiocast_common::{Error, Result};
use serde::Deserialize;

use super::content::{Content, ContentKind};
use crate::config::CatalogConfig;

/// One entry of the JSON track index.
#[derive(Debug, Clone, Deserialize)]
pub struct Track {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub length: u32,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub m3u8: String,
}

/// Load music content from a JSON track index.
///
/// Tracks whose id is not an integer are skipped.
pub fn load_catalog(path: &Path) -> Result<Vec<Content>> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| Error::source_read(path.display().to_string(), e))?;
    parse_catalog(&data)
}

/// Parse a JSON track index.
pub fn parse_catalog(json: &str) -> Result<Vec<Content>> {
    let tracks: Vec<Track> = serde_json::from_str(json)
        .map_err(|e| Error::parse(format!("invalid track index: {e}")))?;

    let contents = tracks
        .into_iter()
        .filter_map(|track| match track.id.trim().parse::<u32>() {
            Ok(id) => Some(Content::new(id, ContentKind::Music, track.length)),
            Err(e) => {
                tracing::warn!(id = %track.id, title = %track.title, "Skipping track with non-integer id: {e}");
                None
            }
        })
        .collect();

    Ok(contents)
}

/// Build the catalog declared in configuration.
///
/// The JSON index takes precedence over inline entries.
pub fn catalog_from_config(config: &CatalogConfig) -> Result<Vec<Content>> {
    if let Some(index) = &config.index {
        let contents = load_catalog(index)?;
        tracing::info!(path = ?index, count = contents.len(), "Loaded catalog index");
        return Ok(contents);
    }

    Ok(config
        .contents
        .iter()
        .map(|entry| Content::new(entry.id, entry.kind, entry.length))
        .collect())
}
