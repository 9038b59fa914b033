//! Schedulable content and resolution to segments.

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use radiocast_common::paths::{local_to_url, rewrite_segment_uri};
use radiocast_common::{Error, Result};
use radiocast_media::{M3u8Formatter, PlaylistFormatter, Segment};
use serde::{Deserialize, Serialize};

/// Directory a content item lives under below `<root>/contents`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    #[default]
    Music,
    Voice,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Music => "music",
            ContentKind::Voice => "voice",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One schedulable item: a track or a voice spot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Content {
    pub id: u32,
    pub kind: ContentKind,
    /// Length in seconds
    pub length: u32,
}

impl Content {
    pub fn new(id: u32, kind: ContentKind, length: u32) -> Self {
        Self { id, kind, length }
    }

    pub fn music(id: u32, length: u32) -> Self {
        Self::new(id, ContentKind::Music, length)
    }

    /// Local path of the content's own m3u8 below `root`.
    pub fn source_path(&self, root: &Path) -> PathBuf {
        root.join("contents")
            .join(self.kind.as_str())
            .join(self.id.to_string())
            .join(format!("{}.m3u8", self.id))
    }

    /// Public URL of the content's own m3u8.
    pub fn url_path(&self) -> String {
        format!("/contents/{}/{}/{}.m3u8", self.kind, self.id, self.id)
    }
}

impl fmt::Display for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({}s)", self.kind, self.id, self.length)
    }
}

/// Produces the ordered segment list of a content item.
#[async_trait]
pub trait ContentResolver: Send + Sync {
    /// Resolve `content` to public segments. An unreadable or unparsable
    /// source yields an empty list rather than an error.
    async fn resolve(&self, content: &Content) -> Result<Vec<Segment>>;
}

/// Resolves content from m3u8 files on the local filesystem.
pub struct FsContentResolver {
    root: PathBuf,
    formatter: Box<dyn PlaylistFormatter>,
}

impl FsContentResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_formatter(root, Box::new(M3u8Formatter::default()))
    }

    pub fn with_formatter(root: impl Into<PathBuf>, formatter: Box<dyn PlaylistFormatter>) -> Self {
        Self {
            root: root.into(),
            formatter,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read and parse the source playlist, surfacing failures.
    pub async fn load_segments(&self, content: &Content) -> Result<Vec<Segment>> {
        let path = content.source_path(&self.root);
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| Error::source_read(path.display().to_string(), e))?;

        let playlist = self.formatter.parse(&text);
        let segments: Vec<Segment> = playlist
            .segments
            .into_iter()
            .filter(|seg| {
                if seg.uri.is_empty() {
                    tracing::warn!(
                        source = %path.display(),
                        duration = seg.duration,
                        "Dropping segment without URI"
                    );
                }
                !seg.uri.is_empty()
            })
            .map(|mut seg| {
                seg.uri = rewrite_segment_uri(&seg.uri, &path, &self.root);
                seg
            })
            .collect();

        if segments.is_empty() {
            return Err(Error::parse(format!(
                "no segments in {}",
                local_to_url(&path, &self.root)
            )));
        }
        Ok(segments)
    }
}

#[async_trait]
impl ContentResolver for FsContentResolver {
    async fn resolve(&self, content: &Content) -> Result<Vec<Segment>> {
        match self.load_segments(content).await {
            Ok(segments) => {
                tracing::debug!(
                    content = %content,
                    segments = segments.len(),
                    "Resolved content"
                );
                Ok(segments)
            }
            Err(e) => {
                tracing::error!(content = %content, error = %e, "Failed to resolve content");
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:10\n\
#EXTINF:9.009,\n1_000.ts\n#EXTINF:4.500,\n1_001.ts\n";

    fn write_content(root: &Path, content: &Content, text: &str) {
        let path = content.source_path(root);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, text).unwrap();
    }

    #[test]
    fn test_paths() {
        let content = Content::new(7, ContentKind::Voice, 30);
        assert_eq!(
            content.source_path(Path::new("/srv/radio")),
            PathBuf::from("/srv/radio/contents/voice/7/7.m3u8")
        );
        assert_eq!(content.url_path(), "/contents/voice/7/7.m3u8");
        assert_eq!(content.to_string(), "voice/7 (30s)");
    }

    #[tokio::test]
    async fn test_resolve_rewrites_uris() {
        let dir = tempfile::tempdir().unwrap();
        let content = Content::music(1, 14);
        write_content(dir.path(), &content, SOURCE);

        let resolver = FsContentResolver::new(dir.path());
        let segments = resolver.resolve(&content).await.unwrap();

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].uri, "/contents/music/1/1_000.ts");
        assert_eq!(segments[0].duration, 9.009);
        assert_eq!(segments[1].uri, "/contents/music/1/1_001.ts");
        assert!(!segments[0].discontinuity);
    }

    #[tokio::test]
    async fn test_resolve_missing_source_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = FsContentResolver::new(dir.path());
        let content = Content::music(99, 10);

        assert!(resolver.resolve(&content).await.unwrap().is_empty());
        assert!(matches!(
            resolver.load_segments(&content).await,
            Err(Error::SourceReadFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_resolve_source_without_segments_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let content = Content::music(2, 10);
        write_content(dir.path(), &content, "#EXTM3U\n#EXT-X-VERSION:3\n");

        let resolver = FsContentResolver::new(dir.path());
        assert!(resolver.resolve(&content).await.unwrap().is_empty());
        assert!(matches!(
            resolver.load_segments(&content).await,
            Err(Error::ParseFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_resolve_drops_segment_without_uri() {
        let dir = tempfile::tempdir().unwrap();
        let content = Content::music(1, 13);
        write_content(
            dir.path(),
            &content,
            "#EXTM3U\n#EXTINF:9.0,\n1_000.ts\n#EXTINF:4.0,\n",
        );

        let segments = FsContentResolver::new(dir.path()).resolve(&content).await.unwrap();
        assert_eq!(segments, [Segment::new(9.0, "/contents/music/1/1_000.ts", false)]);
    }

    #[tokio::test]
    async fn test_resolve_only_dangling_extinf_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let content = Content::music(3, 4);
        write_content(dir.path(), &content, "#EXTM3U\n#EXTINF:4.0,\n");

        let resolver = FsContentResolver::new(dir.path());
        assert!(resolver.resolve(&content).await.unwrap().is_empty());
        assert!(matches!(
            resolver.load_segments(&content).await,
            Err(Error::ParseFailed(_))
        ));
    }
}
