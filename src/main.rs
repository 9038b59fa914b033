mod cli;

use radiocast::{config, server, station};
use radiocast_media::{M3u8Formatter, PlaylistFormatter};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&std::path::Path>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    // Override host/port from CLI if specified
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config::validate_config(&config)?;

    tracing::info!("Starting radiocast");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );
    tracing::info!(
        mode = %config.playlist.mode,
        capacity = config.playlist.capacity(),
        root = ?config.station.root,
        "Live playlist configured"
    );

    server::start_server(config).await
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "radiocast=trace,radiocast_media=trace,radiocast_common=debug,tower_http=debug"
                .to_string()
        } else {
            "radiocast=info,radiocast_media=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Inspect { file, extension } => inspect_playlist(&file, &extension),
        Commands::Version => {
            println!("radiocast {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn validate_config(path: Option<&std::path::Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Playlist: /{}", config.server.playlist_name);
            println!(
                "  Window: {} mode, capacity {}",
                config.playlist.mode,
                config.playlist.capacity()
            );
            println!("  Buffer threshold: {}s", config.buffer.threshold_secs);
            println!(
                "  Scheduler: {} ({:?}, {:?})",
                if config.scheduler.enabled { "enabled" } else { "disabled" },
                config.scheduler.selector,
                config.scheduler.admission
            );
            let catalog = station::catalog_from_config(&config.catalog)
                .context("Failed to load catalog")?;
            println!("  Catalog: {} items", catalog.len());
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
        }
    }

    Ok(())
}

fn inspect_playlist(file: &std::path::Path, extension: &str) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read playlist: {:?}", file))?;

    let formatter = M3u8Formatter::new(extension);
    let playlist = formatter.parse(&text);

    println!("Segments: {}", playlist.segments.len());
    println!("Duration: {:.3}s", playlist.total_duration());
    println!(
        "Discontinuities: {}",
        playlist.segments.iter().filter(|s| s.discontinuity).count()
    );
    println!();
    print!("{}", formatter.format(&playlist));

    Ok(())
}
