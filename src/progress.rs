//! Progress reporting.
//!
//! Long-running exports report through a [`ProgressCallback`]. The library
//! never renders progress itself; the `frameseq` binary plugs in a terminal
//! progress bar, and tests plug in recorders.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use frameseq::{FolderExportOptions, FrameSequence, ProgressCallback, ProgressInfo};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(pct) = info.percentage {
//!             println!("[{:?}] {pct:.1}% complete", info.operation);
//!         }
//!     }
//! }
//!
//! let sequence = FrameSequence::from_folder("input")?;
//! let options = FolderExportOptions::new().with_progress(Arc::new(PrintProgress));
//! sequence.to_folder("output", &options)?;
//! # Ok::<(), frameseq::SequenceError>(())
//! ```

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

/// The kind of operation currently in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OperationType {
    /// Writing frames to a folder of image files.
    FolderExport,
    /// Encoding frames into a video file.
    VideoExport,
}

/// A snapshot of progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// What kind of work is being performed.
    pub operation: OperationType,
    /// How many frames have been processed so far.
    pub current: u64,
    /// Total frames expected, if known ahead of time.
    pub total: Option<u64>,
    /// Completion percentage (0.0 – 100.0), if `total` is known.
    pub percentage: Option<f32>,
    /// Wall-clock time elapsed since the operation started.
    pub elapsed: Duration,
}

/// Receives progress updates.
///
/// Implementations must be [`Send`] and [`Sync`]: folder export calls them
/// from worker threads, in completion order rather than frame order.
pub trait ProgressCallback: Send + Sync {
    /// Called after every batch of completed frames.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all progress notifications.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Completion counter shared by concurrent workers.
///
/// The count is a single [`AtomicU64`]; workers never take a lock to
/// advance it.
pub(crate) struct ProgressCounter {
    callback: Arc<dyn ProgressCallback>,
    operation: OperationType,
    total: Option<u64>,
    batch_size: u64,
    completed: AtomicU64,
    start_time: Instant,
}

impl ProgressCounter {
    pub(crate) fn new(
        callback: Arc<dyn ProgressCallback>,
        operation: OperationType,
        total: Option<u64>,
        batch_size: u64,
    ) -> Self {
        Self {
            callback,
            operation,
            total,
            batch_size: batch_size.max(1),
            completed: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record one completed item, reporting on batch boundaries and on the
    /// final item.
    pub(crate) fn advance(&self) {
        let current = self.completed.fetch_add(1, Ordering::AcqRel) + 1;
        let is_last = self.total == Some(current);
        if current % self.batch_size == 0 || is_last {
            self.report(current);
        }
    }

    pub(crate) fn completed(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }

    fn report(&self, current: u64) {
        let percentage = self
            .total
            .filter(|&total| total > 0)
            .map(|total| (current as f32 / total as f32) * 100.0);

        self.callback.on_progress(&ProgressInfo {
            operation: self.operation,
            current,
            total: self.total,
            percentage,
            elapsed: self.start_time.elapsed(),
        });
    }
}
