//! FIFO of segments waiting to be released into the live window.

use std::collections::VecDeque;

use parking_lot::Mutex;
use radiocast_common::{Error, Result};
use radiocast_media::Segment;

use super::content::{Content, ContentResolver};

/// Buffered seconds above which new content is rejected.
pub const DEFAULT_THRESHOLD_SECS: f64 = 100.0;

#[derive(Debug, Default)]
struct Queue {
    segments: VecDeque<Segment>,
    total_duration: f64,
}

impl Queue {
    fn push(&mut self, segment: Segment) {
        self.total_duration += segment.duration;
        self.segments.push_back(segment);
    }

    fn pop(&mut self) -> Option<Segment> {
        let segment = self.segments.pop_front()?;
        self.total_duration -= segment.duration;
        if self.segments.is_empty() {
            // Drop accumulated float drift.
            self.total_duration = 0.0;
        }
        Some(segment)
    }
}

/// Segment buffer shared by the scheduler (producer) and the pacing loop
/// (consumer). One lock covers the FIFO and its running duration.
#[derive(Debug)]
pub struct SegmentBuffer {
    queue: Mutex<Queue>,
    threshold: f64,
}

impl Default for SegmentBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD_SECS)
    }
}

impl SegmentBuffer {
    pub fn new(threshold: f64) -> Self {
        Self {
            queue: Mutex::new(Queue::default()),
            threshold,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn push(&self, segment: Segment) {
        self.queue.lock().push(segment);
    }

    pub fn pop(&self) -> Result<Segment> {
        self.queue.lock().pop().ok_or(Error::EmptyBuffer)
    }

    pub fn total_duration(&self) -> f64 {
        self.queue.lock().total_duration
    }

    pub fn len(&self) -> usize {
        self.queue.lock().segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().segments.is_empty()
    }

    /// Whether buffered duration exceeds the threshold.
    pub fn is_full(&self) -> bool {
        self.total_duration() > self.threshold
    }

    fn check_capacity(&self, total: f64) -> Result<()> {
        if total > self.threshold {
            return Err(Error::BufferFull {
                current: total,
                max: self.threshold,
            });
        }
        Ok(())
    }

    /// Push one content item's segments as a batch.
    ///
    /// The first segment is marked as a discontinuity. The whole batch is
    /// rejected with `BufferFull` when the buffer is already over threshold.
    pub fn add_segments(&self, mut segments: Vec<Segment>) -> Result<usize> {
        let mut queue = self.queue.lock();
        self.check_capacity(queue.total_duration)?;

        if let Some(first) = segments.first_mut() {
            first.discontinuity = true;
        }
        let count = segments.len();
        for segment in segments {
            queue.push(segment);
        }
        Ok(count)
    }

    /// Resolve `content` and push its segments.
    ///
    /// Returns the number of segments pushed; content that resolves to
    /// nothing pushes nothing and returns `Ok(0)`.
    pub async fn add(&self, content: &Content, resolver: &dyn ContentResolver) -> Result<usize> {
        self.check_capacity(self.total_duration())?;

        let segments = resolver.resolve(content).await?;
        if segments.is_empty() {
            tracing::warn!(content = %content, "Content resolved to no segments");
            return Ok(0);
        }

        let count = self.add_segments(segments)?;
        tracing::debug!(
            content = %content,
            segments = count,
            buffered = self.total_duration(),
            "Buffered content"
        );
        Ok(count)
    }
}
