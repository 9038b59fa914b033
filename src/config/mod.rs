mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    expand_paths(&mut config);
    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./config.toml",
        "./radiocast.toml",
        "~/.config/radiocast/config.toml",
        "/etc/radiocast/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

fn expand_paths(config: &mut Config) {
    let expand = |p: PathBuf| -> PathBuf {
        PathBuf::from(shellexpand::tilde(&p.to_string_lossy()).into_owned())
    };

    config.station.root = expand(std::mem::take(&mut config.station.root));
    config.station.output_path = config.station.output_path.take().map(expand);
    config.catalog.index = config.catalog.index.take().map(expand);
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.server.playlist_name.trim_matches('/').is_empty() {
        anyhow::bail!("Playlist name cannot be empty");
    }

    if config.playlist.max_segments == 0 {
        anyhow::bail!("playlist.max_segments must be greater than 0");
    }

    if config.playlist.max_pairs == 0 {
        anyhow::bail!("playlist.max_pairs must be greater than 0");
    }

    if config.playlist.target_duration <= 0.0 {
        anyhow::bail!("playlist.target_duration must be positive");
    }

    if config.buffer.threshold_secs <= 0.0 {
        anyhow::bail!("buffer.threshold_secs must be positive");
    }

    if config.pacing.idle_interval_ms == 0 {
        anyhow::bail!("pacing.idle_interval_ms must be greater than 0");
    }

    if config.scheduler.retry_interval_secs == 0 {
        anyhow::bail!("scheduler.retry_interval_secs must be greater than 0");
    }

    if config.scheduler.threshold_secs <= 0.0 {
        anyhow::bail!("scheduler.threshold_secs must be positive");
    }

    if !config.station.root.exists() {
        tracing::warn!("Station root does not exist: {:?}", config.station.root);
    }

    if config.scheduler.enabled
        && config.catalog.index.is_none()
        && config.catalog.contents.is_empty()
    {
        tracing::warn!("Scheduler is enabled but the catalog is empty");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(text: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.playlist_name, "stream.m3u8");
        assert_eq!(config.playlist.max_pairs, 6);
        assert_eq!(config.playlist.target_duration, 10.0);
        assert_eq!(config.buffer.threshold_secs, 100.0);
        assert_eq!(config.pacing.initial_delay_ms, 250);
        assert_eq!(config.pacing.idle_interval_ms, 1000);
        assert_eq!(config.scheduler.retry_interval_secs, 10);
        assert_eq!(config.scheduler.threshold_secs, 80.0);
        assert_eq!(config.scheduler.selector, SelectorKind::Random);
        assert_eq!(config.scheduler.admission, AdmissionKind::Reactive);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_load_partial_config() {
        let file = write_config(
            r#"
[server]
port = 9000

[playlist]
mode = "resync"
max_pairs = 4

[scheduler]
selector = "sequential"
admission = "threshold"

[[catalog.contents]]
id = 1
length = 85

[[catalog.contents]]
id = 2
kind = "voice"
length = 12
"#,
        );

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.playlist.mode, radiocast_media::UpdateMode::Resync);
        assert_eq!(config.playlist.capacity(), 4);
        assert_eq!(config.scheduler.selector, SelectorKind::Sequential);
        assert_eq!(config.scheduler.admission, AdmissionKind::Threshold);
        assert_eq!(config.catalog.contents.len(), 2);
        assert_eq!(
            config.catalog.contents[1].kind,
            crate::station::ContentKind::Voice
        );
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let file = write_config("[playlist]\nmax_segments = 0\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("max_segments"));
    }

    #[test]
    fn test_rejects_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_rejects_non_positive_threshold() {
        let mut config = Config::default();
        config.buffer.threshold_secs = 0.0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_malformed_toml() {
        let file = write_config("[server\nport = ");
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/radiocast.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
