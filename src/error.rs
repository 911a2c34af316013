//! Error types for the `frameseq` crate.
//!
//! [`SequenceError`] is the single error type returned by every fallible
//! operation. Variants carry the path, index, or count that caused the
//! failure so callers rarely need extra logging.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use rayon::ThreadPoolBuildError;
use thiserror::Error;

/// The unified error type for all `frameseq` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SequenceError {
    /// An I/O error occurred while reading or writing files.
    ///
    /// A missing input directory surfaces here with
    /// [`std::io::ErrorKind::NotFound`].
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An image could not be decoded or encoded.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// The video file could not be opened.
    #[error("Failed to open video file at {path}: {reason}")]
    VideoOpen {
        /// Path passed to [`FrameSequence::from_video`](crate::FrameSequence::from_video).
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// A decoded video frame could not be converted to an image.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// The encoder could not be found, configured, or fed.
    #[error("Video encoding error: {0}")]
    VideoEncodeError(String),

    /// The output container could not be written.
    #[error("Video write error: {0}")]
    VideoWriteError(String),

    /// The folder export worker pool could not be started.
    #[error("Failed to start writer pool: {0}")]
    WorkerPool(#[from] ThreadPoolBuildError),

    /// A file name template did not contain exactly one integer field.
    #[error("Invalid file template {template:?}: {reason}")]
    InvalidTemplate {
        /// The offending template.
        template: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A line of a timestamp file is not a decimal number.
    #[error("Invalid timestamp {value:?} at {path}:{line}")]
    TimestampParse {
        /// Timestamp file being read.
        path: PathBuf,
        /// One-based line number.
        line: usize,
        /// The text that failed to parse.
        value: String,
    },

    /// The frame and timestamp counts of a sequence differ.
    #[error("Sequence has {frames} frames but {timestamps} timestamps")]
    LengthMismatch {
        /// Number of frames.
        frames: usize,
        /// Number of timestamps.
        timestamps: usize,
    },

    /// A frame index past the end of the sequence was requested.
    #[error("Frame {index} is out of range (sequence has {len} frames)")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// The sequence length.
        len: usize,
    },

    /// Skip-and-repeat was asked for groups of zero frames.
    #[error("Number of skips must be at least 1")]
    InvalidSkip,

    /// Skip-and-repeat would produce more elements than `usize` can count.
    #[error(
        "Resampling {len} frames with {number_of_skips} skips and {number_of_frames_to_insert} inserts overflows"
    )]
    ResampleOverflow {
        /// Input length.
        len: usize,
        /// Group size.
        number_of_skips: usize,
        /// Extra copies per kept element.
        number_of_frames_to_insert: usize,
    },

    /// A frame rate that is zero, negative, or not finite.
    #[error("Invalid frame rate: {0}")]
    InvalidFrameRate(f64),

    /// The operation needs at least one frame.
    #[error("Sequence is empty")]
    EmptySequence,

    /// One or more frames failed to write during a folder export.
    ///
    /// `source` is the error of the lowest failing index. All other
    /// writes had finished by the time this was returned.
    #[error("Failed to write {failed} of {total} frames (first failure at frame {index}): {source}")]
    ExportFailed {
        /// Lowest frame index whose write failed.
        index: usize,
        /// Number of failed writes.
        failed: usize,
        /// Number of attempted writes.
        total: usize,
        /// The error for `index`.
        source: Box<SequenceError>,
    },
}

impl From<FfmpegError> for SequenceError {
    fn from(error: FfmpegError) -> Self {
        SequenceError::FfmpegError(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use rayon::ThreadPoolBuilder;

    use super::*;

    #[test]
    fn pool_build_failures_keep_their_own_variant() {
        // The second global initialisation always fails.
        let _ = ThreadPoolBuilder::new().num_threads(1).build_global();
        let error = ThreadPoolBuilder::new()
            .num_threads(1)
            .build_global()
            .unwrap_err();

        let error = SequenceError::from(error);
        assert!(matches!(error, SequenceError::WorkerPool(_)));
        assert!(error.to_string().starts_with("Failed to start writer pool"));
    }
}
