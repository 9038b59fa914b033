//! Persistence of the rendered live playlist.

use std::io::Write;
use std::path::{Path, PathBuf};

use radiocast_common::{Error, Result};

/// Key/value store for rendered playlists.
pub trait PlaylistStorage: Send + Sync {
    fn store(&self, key: &str, content: &str) -> Result<()>;
    fn load(&self, key: &str) -> Result<String>;
}

/// Stores playlists as files below a directory.
///
/// Writes go through a temporary file in the same directory and are renamed
/// into place, so readers never observe a partial playlist.
#[derive(Debug, Clone)]
pub struct FileStorage {
    directory: PathBuf,
}

impl FileStorage {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Storage for a single output file, returning it with its key.
    pub fn for_output(path: &Path) -> Result<(Self, String)> {
        let key = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                Error::invalid_config(format!("output path has no file name: {}", path.display()))
            })?;
        let directory = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        Ok((Self::new(directory), key))
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.directory.join(key)
    }
}

impl PlaylistStorage for FileStorage {
    fn store(&self, key: &str, content: &str) -> Result<()> {
        std::fs::create_dir_all(&self.directory)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.directory)?;
        tmp.write_all(content.as_bytes())?;
        tmp.persist(self.path_for(key)).map_err(|e| e.error)?;
        Ok(())
    }

    fn load(&self, key: &str) -> Result<String> {
        let path = self.path_for(key);
        std::fs::read_to_string(&path).map_err(|e| Error::source_read(path.display().to_string(), e))
    }
}
