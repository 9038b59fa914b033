//! Path utilities for mapping local segment files to public URL paths.
//!
//! Source playlists live under a local root (for example `/srv/radio`) and
//! reference their segments relative to their own directory. Clients only
//! ever see the part of the path below that root.

use std::path::{Component, Path, PathBuf};

/// Default local root that is stripped from segment paths.
pub const DEFAULT_LOCAL_ROOT: &str = "/srv/radio";

/// Lexically normalize a path: drop `.` and resolve `..` without touching the
/// file system.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use radiocast_common::paths::normalize;
///
/// assert_eq!(normalize(Path::new("/a/b/../c/./d.ts")), Path::new("/a/c/d.ts"));
/// ```
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Convert a local path to its public URL path by stripping `local_root`.
///
/// Paths outside the root are returned normalized but otherwise unchanged.
///
/// # Examples
///
/// ```
/// use radiocast_common::paths::local_to_url;
///
/// assert_eq!(
///     local_to_url("/srv/radio/contents/music/1/seg0.ts", "/srv/radio"),
///     "/contents/music/1/seg0.ts"
/// );
/// assert_eq!(local_to_url("/other/seg0.ts", "/srv/radio"), "/other/seg0.ts");
/// ```
pub fn local_to_url(local_path: impl AsRef<Path>, local_root: impl AsRef<Path>) -> String {
    let clean = normalize(local_path.as_ref());
    let root = normalize(local_root.as_ref());

    match clean.strip_prefix(&root) {
        Ok(rest) => format!("/{}", to_slash(rest)),
        Err(_) => to_slash(&clean),
    }
}

/// Resolve a segment URI found in `source_path` to a public URL path.
///
/// Absolute URLs (`http://`, `https://`) and empty URIs pass through
/// untouched.
pub fn rewrite_segment_uri(uri: &str, source_path: &Path, local_root: &Path) -> String {
    if uri.is_empty() || uri.starts_with("http://") || uri.starts_with("https://") {
        return uri.to_string();
    }
    let source_dir = source_path.parent().unwrap_or_else(|| Path::new("/"));
    local_to_url(source_dir.join(uri), local_root)
}

/// Check whether a playlist line names a segment file with `extension`.
///
/// # Examples
///
/// ```
/// use radiocast_common::paths::is_segment_uri;
///
/// assert!(is_segment_uri("segment1.ts", ".ts"));
/// assert!(!is_segment_uri("#EXTINF:9.009,", ".ts"));
/// ```
pub fn is_segment_uri(line: &str, extension: &str) -> bool {
    !line.starts_with('#') && line.ends_with(extension)
}

fn to_slash(path: &Path) -> String {
    let joined = path
        .components()
        .filter(|c| !matches!(c, Component::RootDir))
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/");

    if path.has_root() {
        format!("/{joined}")
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/./b/../c")), Path::new("/a/c"));
        assert_eq!(normalize(Path::new("a/../../b")), Path::new("../b"));
    }

    #[test]
    fn test_local_to_url_strips_root() {
        assert_eq!(
            local_to_url("/srv/radio/contents/music/12/seg3.ts", DEFAULT_LOCAL_ROOT),
            "/contents/music/12/seg3.ts"
        );
    }

    #[test]
    fn test_local_to_url_with_trailing_slash_root() {
        assert_eq!(
            local_to_url("/srv/radio/stations/a/stream.m3u8", "/srv/radio/"),
            "/stations/a/stream.m3u8"
        );
    }

    #[test]
    fn test_local_to_url_outside_root() {
        assert_eq!(local_to_url("/tmp/x/../y.ts", DEFAULT_LOCAL_ROOT), "/tmp/y.ts");
    }

    #[test]
    fn test_local_to_url_does_not_match_partial_component() {
        assert_eq!(
            local_to_url("/srv/radiox/seg.ts", DEFAULT_LOCAL_ROOT),
            "/srv/radiox/seg.ts"
        );
    }

    #[test]
    fn test_rewrite_segment_uri_relative() {
        let source = Path::new("/srv/radio/contents/music/1/1.m3u8");
        assert_eq!(
            rewrite_segment_uri("1_000.ts", source, Path::new(DEFAULT_LOCAL_ROOT)),
            "/contents/music/1/1_000.ts"
        );
        assert_eq!(
            rewrite_segment_uri("../shared/jingle.ts", source, Path::new(DEFAULT_LOCAL_ROOT)),
            "/contents/music/shared/jingle.ts"
        );
    }

    #[test]
    fn test_rewrite_segment_uri_absolute_url() {
        let source = Path::new("/srv/radio/contents/music/1/1.m3u8");
        assert_eq!(
            rewrite_segment_uri("https://cdn/x.ts", source, Path::new(DEFAULT_LOCAL_ROOT)),
            "https://cdn/x.ts"
        );
    }

    #[test]
    fn test_rewrite_segment_uri_empty() {
        let source = Path::new("/srv/radio/contents/music/1/1.m3u8");
        assert_eq!(rewrite_segment_uri("", source, Path::new(DEFAULT_LOCAL_ROOT)), "");
    }

    #[test]
    fn test_is_segment_uri() {
        assert!(is_segment_uri("seg 01 (remix).ts", ".ts"));
        assert!(!is_segment_uri("#EXT-X-DISCONTINUITY", ".ts"));
        assert!(!is_segment_uri("seg.aac", ".ts"));
    }
}
