//! Progress reporting for frame extraction.
//!
//! Attach a [`ProgressCallback`] through
//! [`ExtractOptions::with_progress`](crate::ExtractOptions::with_progress) to
//! observe a run. Callbacks only observe: extraction has no cancellation
//! and stops at the frame limit or at end of stream.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use utahframe::{ExtractOptions, ProgressCallback, ProgressInfo};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("{}/{} frames written", info.frames_persisted, info.frame_limit);
//!     }
//! }
//!
//! let options = ExtractOptions::new()
//!     .with_progress(Arc::new(PrintProgress))
//!     .with_batch_size(25);
//! ```

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

/// A snapshot of an extraction run.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Frames written to the sink so far.
    pub frames_persisted: u64,
    /// Frames the decoder has produced so far, including those past the
    /// limit.
    pub frames_decoded: u64,
    /// Maximum number of frames the run will persist.
    pub frame_limit: u64,
    /// `frames_persisted / frame_limit` as a percentage; `None` for a
    /// limit of zero.
    pub percentage: Option<f32>,
    /// Wall-clock time since the run started.
    pub elapsed: Duration,
    /// Number of the most recently persisted frame (1-based).
    pub last_frame: Option<u64>,
    /// `true` for the final report of a run.
    pub finished: bool,
}

/// Receives progress snapshots. Must be `Send + Sync` so one callback can
/// be shared between runs on different threads.
pub trait ProgressCallback: Send + Sync {
    fn on_progress(&self, info: &ProgressInfo);
}

/// Default callback; discards every report.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Counts frames and fires the callback every `batch_size` persisted frames.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    frame_limit: u64,
    batch_size: u64,
    start_time: Instant,
    persisted: u64,
    decoded: u64,
    since_last_report: u64,
}

impl ProgressTracker {
    pub(crate) fn new(callback: Arc<dyn ProgressCallback>, frame_limit: u64, batch_size: u64) -> Self {
        Self {
            callback,
            frame_limit,
            batch_size: batch_size.max(1),
            start_time: Instant::now(),
            persisted: 0,
            decoded: 0,
            since_last_report: 0,
        }
    }

    pub(crate) fn decoded(&self) -> u64 {
        self.decoded
    }

    pub(crate) fn persisted(&self) -> u64 {
        self.persisted
    }

    pub(crate) fn record_decoded(&mut self) {
        self.decoded += 1;
    }

    /// Record a persisted frame and report if the batch is full.
    pub(crate) fn record_persisted(&mut self) {
        self.persisted += 1;
        self.since_last_report += 1;
        if self.since_last_report >= self.batch_size {
            self.report(false);
            self.since_last_report = 0;
        }
    }

    /// Emit the final report unconditionally.
    pub(crate) fn finish(&mut self) {
        self.report(true);
    }

    fn report(&self, finished: bool) {
        let percentage = (self.frame_limit > 0)
            .then(|| self.persisted as f32 / self.frame_limit as f32 * 100.0);

        self.callback.on_progress(&ProgressInfo {
            frames_persisted: self.persisted,
            frames_decoded: self.decoded,
            frame_limit: self.frame_limit,
            percentage,
            elapsed: self.start_time.elapsed(),
            last_frame: (self.persisted > 0).then_some(self.persisted),
            finished,
        });
    }
}
