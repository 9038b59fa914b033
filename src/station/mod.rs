//! The radio station: content, buffering, pacing and scheduling.

pub mod buffer;
pub mod catalog;
pub mod content;
pub mod dj;
pub mod manager;
pub mod storage;

pub use buffer::SegmentBuffer;
pub use catalog::{catalog_from_config, load_catalog};
pub use content::{Content, ContentKind, ContentResolver, FsContentResolver};
pub use dj::{AdmissionPolicy, ContentSelector, RandomSelector, Scheduler, SequentialSelector};
pub use manager::{StreamManager, StreamSnapshot};
pub use storage::{FileStorage, PlaylistStorage};

use std::sync::Arc;

use anyhow::{Context, Result};
use radiocast_media::M3u8Formatter;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::Config;

/// Stream manager and scheduler wired together from configuration.
pub struct Station {
    pub manager: Arc<StreamManager>,
    scheduler: Option<Scheduler>,
    cancel: CancellationToken,
}

impl Station {
    pub fn from_config(config: &Config) -> Result<Self> {
        let buffer = Arc::new(SegmentBuffer::new(config.buffer.threshold_secs));

        let mut manager =
            StreamManager::from_config(&config.playlist, &config.pacing, buffer.clone())
                .context("Failed to build playlist window")?;
        if let Some(output) = &config.station.output_path {
            let (storage, key) = FileStorage::for_output(output)?;
            manager = manager.with_storage(Box::new(storage), key);
        }

        let cancel = CancellationToken::new();
        let scheduler = if config.scheduler.enabled {
            let catalog = catalog_from_config(&config.catalog).context("Failed to load catalog")?;
            let resolver = FsContentResolver::with_formatter(
                &config.station.root,
                Box::new(M3u8Formatter::new(config.playlist.segment_extension.clone())),
            );
            Some(Scheduler::from_config(
                &config.scheduler,
                catalog,
                buffer,
                Arc::new(resolver),
                cancel.clone(),
            ))
        } else {
            None
        };

        Ok(Self {
            manager: Arc::new(manager),
            scheduler,
            cancel,
        })
    }

    /// Spawn the pacing loop and, if configured, the scheduler.
    pub fn start(&mut self) -> StationHandle {
        let manager = self.manager.clone();
        let pacing = tokio::spawn(async move { manager.run().await });

        let scheduler = self.scheduler.take().map(|scheduler| {
            tokio::spawn(async move {
                if let Err(e) = scheduler.run().await {
                    tracing::error!("Scheduler exited: {e}");
                }
            })
        });

        StationHandle {
            manager: self.manager.clone(),
            cancel: self.cancel.clone(),
            pacing,
            scheduler,
        }
    }
}

/// Running station tasks.
pub struct StationHandle {
    manager: Arc<StreamManager>,
    cancel: CancellationToken,
    pacing: JoinHandle<()>,
    scheduler: Option<JoinHandle<()>>,
}

impl StationHandle {
    /// Kill the stream manager, cancel the scheduler and wait for both.
    pub async fn shutdown(self) {
        self.manager.kill();
        self.cancel.cancel();

        let _ = self.pacing.await;
        if let Some(handle) = self.scheduler {
            let _ = handle.await;
        }
        tracing::info!("Station stopped");
    }
}
