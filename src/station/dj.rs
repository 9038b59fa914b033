//! Content scheduler: picks content and admits it into the segment buffer.

use std::sync::Arc;
use std::time::Duration;

use radiocast_common::{Error, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tokio_util::sync::CancellationToken;

use super::buffer::SegmentBuffer;
use super::content::{Content, ContentResolver};
use crate::config::{AdmissionKind, SchedulerConfig, SelectorKind};

/// Picks the next content item to schedule.
pub trait ContentSelector: Send + Sync {
    fn select(&mut self) -> Result<Content>;
}

/// Uniform random choice over a fixed catalog.
pub struct RandomSelector {
    contents: Vec<Content>,
    rng: StdRng,
}

impl RandomSelector {
    pub fn new(contents: Vec<Content>) -> Self {
        Self {
            contents,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(contents: Vec<Content>, seed: u64) -> Self {
        Self {
            contents,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl ContentSelector for RandomSelector {
    fn select(&mut self) -> Result<Content> {
        self.contents
            .choose(&mut self.rng)
            .copied()
            .ok_or_else(|| Error::selection("catalog is empty"))
    }
}

/// Round robin over a fixed catalog.
pub struct SequentialSelector {
    contents: Vec<Content>,
    next: usize,
}

impl SequentialSelector {
    pub fn new(contents: Vec<Content>) -> Self {
        Self { contents, next: 0 }
    }
}

impl ContentSelector for SequentialSelector {
    fn select(&mut self) -> Result<Content> {
        if self.contents.is_empty() {
            return Err(Error::selection("catalog is empty"));
        }
        let content = self.contents[self.next % self.contents.len()];
        self.next = (self.next + 1) % self.contents.len();
        Ok(content)
    }
}

/// How the scheduler decides when to add more content.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AdmissionPolicy {
    /// Add until the buffer pushes back, then retry the same content after
    /// `retry_interval`.
    ReactiveRetry { retry_interval: Duration },
    /// Keep an estimate of queued seconds below `threshold`, sleeping
    /// `interval` and draining the estimate once it is reached.
    Threshold { threshold: f64, interval: Duration },
}

impl AdmissionPolicy {
    fn interval(&self) -> Duration {
        match self {
            AdmissionPolicy::ReactiveRetry { retry_interval } => *retry_interval,
            AdmissionPolicy::Threshold { interval, .. } => *interval,
        }
    }
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        AdmissionPolicy::ReactiveRetry {
            retry_interval: Duration::from_secs(10),
        }
    }
}

/// Producer side of the station: selects content and feeds the buffer.
pub struct Scheduler {
    buffer: Arc<SegmentBuffer>,
    resolver: Arc<dyn ContentResolver>,
    selector: Box<dyn ContentSelector>,
    policy: AdmissionPolicy,
    cancel: CancellationToken,
}

impl Scheduler {
    pub fn new(
        buffer: Arc<SegmentBuffer>,
        resolver: Arc<dyn ContentResolver>,
        selector: Box<dyn ContentSelector>,
        policy: AdmissionPolicy,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            buffer,
            resolver,
            selector,
            policy,
            cancel,
        }
    }

    pub fn from_config(
        config: &SchedulerConfig,
        catalog: Vec<Content>,
        buffer: Arc<SegmentBuffer>,
        resolver: Arc<dyn ContentResolver>,
        cancel: CancellationToken,
    ) -> Self {
        let selector: Box<dyn ContentSelector> = match config.selector {
            SelectorKind::Random => Box::new(RandomSelector::new(catalog)),
            SelectorKind::Sequential => Box::new(SequentialSelector::new(catalog)),
        };
        let policy = match config.admission {
            AdmissionKind::Reactive => AdmissionPolicy::ReactiveRetry {
                retry_interval: config.retry_interval(),
            },
            AdmissionKind::Threshold => AdmissionPolicy::Threshold {
                threshold: config.threshold_secs,
                interval: config.retry_interval(),
            },
        };
        Self::new(buffer, resolver, selector, policy, cancel)
    }

    /// Run until cancelled (`Ok`) or until selection or admission fails
    /// with a non-retryable error.
    pub async fn run(mut self) -> Result<()> {
        tracing::info!(policy = ?self.policy, "Scheduler started");

        let result = match self.policy {
            AdmissionPolicy::ReactiveRetry { .. } => self.run_reactive().await,
            AdmissionPolicy::Threshold { threshold, .. } => self.run_threshold(threshold).await,
        };

        match &result {
            Ok(()) => tracing::info!("Scheduler stopped"),
            Err(e) => tracing::error!(error = %e, "Scheduler terminated"),
        }
        result
    }

    async fn run_reactive(&mut self) -> Result<()> {
        while !self.cancel.is_cancelled() {
            let content = self.selector.select()?;

            loop {
                match self.buffer.add(&content, self.resolver.as_ref()).await {
                    Ok(0) => {
                        if !self.pause().await {
                            return Ok(());
                        }
                        break;
                    }
                    Ok(count) => {
                        tracing::info!(content = %content, segments = count, "Added content");
                        break;
                    }
                    Err(e) if e.is_retryable() => {
                        tracing::debug!(content = %content, "Buffer full, retrying");
                        if !self.pause().await {
                            return Ok(());
                        }
                    }
                    Err(e) => return Err(e),
                }
            }
        }
        Ok(())
    }

    async fn run_threshold(&mut self, threshold: f64) -> Result<()> {
        let mut remaining = 0.0_f64;

        while !self.cancel.is_cancelled() {
            if remaining < threshold && !self.buffer.is_full() {
                let content = self.selector.select()?;
                match self.buffer.add(&content, self.resolver.as_ref()).await {
                    Ok(0) => {}
                    Ok(count) => {
                        remaining += f64::from(content.length);
                        tracing::info!(
                            content = %content,
                            segments = count,
                            remaining,
                            "Added content"
                        );
                        continue;
                    }
                    Err(e) if e.is_retryable() => {}
                    Err(e) => return Err(e),
                }
            }

            if !self.pause().await {
                return Ok(());
            }
            remaining = (remaining - self.policy.interval().as_secs_f64()).max(0.0);
        }
        Ok(())
    }

    /// Sleep one interval. Returns `false` when cancelled meanwhile.
    async fn pause(&self) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(self.policy.interval()) => true,
            _ = self.cancel.cancelled() => false,
        }
    }
}
