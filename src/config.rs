//! Folder layout and export configuration.
//!
//! [`FolderLayout`] describes how an input folder names its images and
//! timestamp log. [`FolderExportOptions`] controls how a sequence is written
//! back out: file names, worker count, and progress reporting.
//!
//! # Example
//!
//! ```no_run
//! use frameseq::{FolderExportOptions, FolderLayout, FrameSequence};
//!
//! let layout = FolderLayout::new()
//!     .with_image_template("img_{:05d}.jpg")
//!     .with_timestamps_file("times.txt");
//! let sequence = FrameSequence::from_folder_with_layout("capture", &layout)?;
//!
//! let options = FolderExportOptions::new().with_max_workers(4);
//! sequence.to_folder("out", &options)?;
//! # Ok::<(), frameseq::SequenceError>(())
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    sync::Arc,
};

use crate::progress::{NoOpProgress, ProgressCallback};

/// Default image name template for folders being read.
pub const DEFAULT_INPUT_IMAGE_TEMPLATE: &str = "frame_{:010d}.png";
/// Default timestamp log name for folders being read.
pub const DEFAULT_INPUT_TIMESTAMPS_FILE: &str = "timestamps.txt";
/// Default image name template for folder export.
pub const DEFAULT_EXPORT_FILE_TEMPLATE: &str = "{:06d}.png";
/// Default timestamp log name for folder export.
pub const DEFAULT_EXPORT_TIMESTAMPS_FILE: &str = "timestamp.txt";
/// Default number of concurrent writers for folder export.
pub const DEFAULT_MAX_WORKERS: usize = 8;

/// Naming of an input frame folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderLayout {
    /// Image name template with one integer field.
    pub image_template: String,
    /// Name of the timestamp log inside the folder.
    pub timestamps_file: String,
}

impl Default for FolderLayout {
    fn default() -> Self {
        Self {
            image_template: DEFAULT_INPUT_IMAGE_TEMPLATE.to_string(),
            timestamps_file: DEFAULT_INPUT_TIMESTAMPS_FILE.to_string(),
        }
    }
}

impl FolderLayout {
    /// Layout with `frame_{:010d}.png` images and a `timestamps.txt` log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the image name template.
    #[must_use]
    pub fn with_image_template(mut self, template: impl Into<String>) -> Self {
        self.image_template = template.into();
        self
    }

    /// Set the timestamp log name.
    #[must_use]
    pub fn with_timestamps_file(mut self, name: impl Into<String>) -> Self {
        self.timestamps_file = name.into();
        self
    }
}

/// Settings for [`FrameSequence::to_folder`](crate::FrameSequence::to_folder).
#[derive(Clone)]
pub struct FolderExportOptions {
    /// Output image name template. The extension picks the image format.
    pub(crate) file_template: String,
    /// Name of the timestamp log written after all images.
    pub(crate) timestamps_file: String,
    /// Size of the writer pool.
    pub(crate) max_workers: usize,
    /// Progress callback. Defaults to a no-op.
    pub(crate) progress: Arc<dyn ProgressCallback>,
    /// Fire the callback every N completed writes.
    pub(crate) batch_size: u64,
}

impl Debug for FolderExportOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("FolderExportOptions")
            .field("file_template", &self.file_template)
            .field("timestamps_file", &self.timestamps_file)
            .field("max_workers", &self.max_workers)
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

impl Default for FolderExportOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl FolderExportOptions {
    /// Defaults: `{:06d}.png`, `timestamp.txt`, 8 workers, no progress,
    /// batch size 1.
    pub fn new() -> Self {
        Self {
            file_template: DEFAULT_EXPORT_FILE_TEMPLATE.to_string(),
            timestamps_file: DEFAULT_EXPORT_TIMESTAMPS_FILE.to_string(),
            max_workers: DEFAULT_MAX_WORKERS,
            progress: Arc::new(NoOpProgress),
            batch_size: 1,
        }
    }

    /// Set the output image name template.
    #[must_use]
    pub fn with_file_template(mut self, template: impl Into<String>) -> Self {
        self.file_template = template.into();
        self
    }

    /// Set the timestamp log name.
    #[must_use]
    pub fn with_timestamps_file(mut self, name: impl Into<String>) -> Self {
        self.timestamps_file = name.into();
        self
    }

    /// Set the number of concurrent writers. Clamped to a minimum of 1.
    #[must_use]
    pub fn with_max_workers(mut self, workers: usize) -> Self {
        self.max_workers = workers.max(1);
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Set how often the progress callback fires. Clamped to a minimum of 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Output image name template.
    pub fn file_template(&self) -> &str {
        &self.file_template
    }

    /// Timestamp log name.
    pub fn timestamps_file(&self) -> &str {
        &self.timestamps_file
    }

    /// Number of concurrent writers.
    pub fn max_workers(&self) -> usize {
        self.max_workers
    }
}
