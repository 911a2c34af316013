//! Core [`FrameSequence`] implementation.
//!
//! A `FrameSequence` pairs an ordered [`FrameSource`] with one timestamp
//! per frame. It is built once (from a folder, a video, in-memory images,
//! or by resampling another sequence) and is read-only afterwards.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    sync::Arc,
};

use image::DynamicImage;

use crate::{
    config::{FolderExportOptions, FolderLayout},
    encode::{VideoEncoder, VideoEncoderOptions},
    error::SequenceError,
    export::export_to_folder,
    resample::skip_and_repeat_indices,
    source::{FrameSource, LazyFrameSource, RemappedSource},
    template::FileTemplate,
    timestamps::read_timestamps,
    video::decode_video,
};

/// An ordered sequence of frames, each paired with a timestamp in seconds.
///
/// The dimensions of frame 0 are cached at construction and treated as the
/// size of every frame. Cloning is cheap: clones share the frame storage.
///
/// # Example
///
/// ```no_run
/// use frameseq::{FolderExportOptions, FrameSequence, SequenceError};
///
/// let sequence = FrameSequence::from_video("input.mp4", 30.0)?;
/// println!("{} frames, {:?}", sequence.len(), sequence.dimensions());
///
/// let resampled = sequence.skip_and_repeat(2, 1)?;
/// resampled.to_folder("resampled", &FolderExportOptions::default())?;
/// # Ok::<(), SequenceError>(())
/// ```
#[derive(Clone)]
pub struct FrameSequence {
    frames: Arc<dyn FrameSource>,
    timestamps: Vec<f64>,
    dimensions: Option<(u32, u32)>,
}

impl Debug for FrameSequence {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("FrameSequence")
            .field("len", &self.timestamps.len())
            .field("dimensions", &self.dimensions)
            .field("first_timestamp", &self.timestamps.first())
            .field("last_timestamp", &self.timestamps.last())
            .finish_non_exhaustive()
    }
}

impl FrameSequence {
    /// Pair `frames` with `timestamps`.
    ///
    /// Frame 0 is fetched once to learn the sequence dimensions.
    ///
    /// # Errors
    ///
    /// - [`SequenceError::LengthMismatch`] if the counts differ.
    /// - Any error the source returns for frame 0.
    pub fn new<S>(frames: S, timestamps: Vec<f64>) -> Result<Self, SequenceError>
    where
        S: FrameSource + 'static,
    {
        Self::from_shared(Arc::new(frames), timestamps)
    }

    /// Build a sequence from decoded images.
    pub fn from_images(
        images: Vec<DynamicImage>,
        timestamps: Vec<f64>,
    ) -> Result<Self, SequenceError> {
        Self::new(images, timestamps)
    }

    fn from_shared(
        frames: Arc<dyn FrameSource>,
        timestamps: Vec<f64>,
    ) -> Result<Self, SequenceError> {
        if frames.len() != timestamps.len() {
            return Err(SequenceError::LengthMismatch {
                frames: frames.len(),
                timestamps: timestamps.len(),
            });
        }

        let dimensions = if frames.is_empty() {
            None
        } else {
            let first = frames.get(0)?;
            Some((first.width(), first.height()))
        };

        Ok(Self {
            frames,
            timestamps,
            dimensions,
        })
    }

    /// Open a frame folder with the default [`FolderLayout`]:
    /// `frame_{:010d}.png` images and a `timestamps.txt` log.
    pub fn from_folder<P: AsRef<Path>>(directory: P) -> Result<Self, SequenceError> {
        Self::from_folder_with_layout(directory, &FolderLayout::default())
    }

    /// Open a frame folder with a custom layout.
    ///
    /// Images are enumerated by template in ascending index order (gaps are
    /// fine) and decoded lazily on access. The timestamp log must have one
    /// line per image.
    ///
    /// # Errors
    ///
    /// - [`SequenceError::IoError`] if the folder or log cannot be read.
    /// - [`SequenceError::InvalidTemplate`] for a bad image template.
    /// - [`SequenceError::TimestampParse`] for a malformed log.
    /// - [`SequenceError::LengthMismatch`] if image and timestamp counts differ.
    /// - Any decode error for the first image.
    pub fn from_folder_with_layout<P: AsRef<Path>>(
        directory: P,
        layout: &FolderLayout,
    ) -> Result<Self, SequenceError> {
        let directory = directory.as_ref();
        let template = FileTemplate::parse(&layout.image_template)?;
        let paths = template.enumerate(directory)?;
        let timestamps = read_timestamps(directory.join(&layout.timestamps_file))?;

        log::debug!(
            "Opened folder {} with {} images and {} timestamps",
            directory.display(),
            paths.len(),
            timestamps.len()
        );
        Self::new(LazyFrameSource::new(paths), timestamps)
    }

    /// Decode a video into memory.
    ///
    /// Frame `i` is stamped `i / fps` seconds; the container's own timing is
    /// ignored.
    ///
    /// # Errors
    ///
    /// - [`SequenceError::InvalidFrameRate`] if `fps` is not a positive
    ///   finite number.
    /// - [`SequenceError::VideoOpen`] if the file cannot be opened.
    /// - [`SequenceError::NoVideoStream`] if it has no video stream.
    pub fn from_video<P: AsRef<Path>>(path: P, fps: f64) -> Result<Self, SequenceError> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(SequenceError::InvalidFrameRate(fps));
        }

        let images = decode_video(path)?;
        let timestamps = (0..images.len())
            .map(|index| index as f64 / fps)
            .collect();
        Self::from_images(images, timestamps)
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Returns `true` if the sequence has no frames.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// The frame at `index`.
    ///
    /// For folder-backed sequences this decodes the file on every call.
    pub fn get(&self, index: usize) -> Result<DynamicImage, SequenceError> {
        self.frames.get(index)
    }

    /// The timestamp of frame `index`, in seconds.
    pub fn timestamp(&self, index: usize) -> Option<f64> {
        self.timestamps.get(index).copied()
    }

    /// All timestamps, in frame order.
    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    /// The underlying frame storage.
    pub fn frames(&self) -> &dyn FrameSource {
        self.frames.as_ref()
    }

    /// `(width, height)` of frame 0, or `None` for an empty sequence.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.dimensions
    }

    /// Width of frame 0, or 0 for an empty sequence.
    pub fn width(&self) -> u32 {
        self.dimensions.map_or(0, |(width, _)| width)
    }

    /// Height of frame 0, or 0 for an empty sequence.
    pub fn height(&self) -> u32 {
        self.dimensions.map_or(0, |(_, height)| height)
    }

    /// Iterate over `(frame, timestamp)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = Result<(DynamicImage, f64), SequenceError>> + '_ {
        self.timestamps
            .iter()
            .enumerate()
            .map(|(index, &timestamp)| {
                self.frames.get(index).map(|frame| (frame, timestamp))
            })
    }

    /// Drop and duplicate frames with the skip-and-repeat rule.
    ///
    /// The first of every `number_of_skips` frames is kept and emitted
    /// `1 + number_of_frames_to_insert` times; timestamps follow the same
    /// positions. No frame is decoded here: the new sequence reads through
    /// this one's storage, and this sequence is left untouched.
    ///
    /// See [`crate::resample`] for the full rule.
    ///
    /// # Errors
    ///
    /// - [`SequenceError::InvalidSkip`] if `number_of_skips` is zero.
    /// - [`SequenceError::ResampleOverflow`] if the result would be longer
    ///   than `usize` can count.
    pub fn skip_and_repeat(
        &self,
        number_of_skips: usize,
        number_of_frames_to_insert: usize,
    ) -> Result<Self, SequenceError> {
        let indices =
            skip_and_repeat_indices(self.len(), number_of_skips, number_of_frames_to_insert)?;
        let timestamps = indices.iter().map(|&index| self.timestamps[index]).collect();

        log::debug!(
            "Resampled {} frames to {} (skips={number_of_skips}, inserts={number_of_frames_to_insert})",
            self.len(),
            indices.len()
        );

        // The retained frame 0 is source frame 0, so the cached size carries over.
        Ok(Self {
            frames: Arc::new(RemappedSource::new(self.frames.clone(), indices)),
            timestamps,
            dimensions: self.dimensions,
        })
    }

    /// Write every frame as a numbered image, then the timestamp log.
    ///
    /// Writes run concurrently on a bounded worker pool. If any write fails,
    /// the remaining writes still run to completion, files already written
    /// stay on disk, no timestamp log is written, and
    /// [`SequenceError::ExportFailed`] reports the lowest failing index.
    ///
    /// Returns the image paths in frame order.
    pub fn to_folder<P: AsRef<Path>>(
        &self,
        directory: P,
        options: &FolderExportOptions,
    ) -> Result<Vec<PathBuf>, SequenceError> {
        export_to_folder(
            self.frames.as_ref(),
            &self.timestamps,
            directory.as_ref(),
            options,
        )
    }

    /// Encode the sequence into a video file.
    ///
    /// The output uses the cached sequence dimensions and the fixed frame
    /// rate from `options` (30 fps by default), regardless of how the
    /// timestamps are spaced.
    ///
    /// # Errors
    ///
    /// [`SequenceError::EmptySequence`] for an empty sequence, plus any
    /// error from [`VideoEncoder::write`].
    pub fn to_video<P: AsRef<Path>>(
        &self,
        path: P,
        options: &VideoEncoderOptions,
    ) -> Result<(), SequenceError> {
        self.to_video_with_encoder(path, VideoEncoder::new(options.clone()))
    }

    /// Encode with a preconfigured [`VideoEncoder`], e.g. one carrying a
    /// progress callback. The encoder's output size is overridden by the
    /// sequence dimensions.
    pub fn to_video_with_encoder<P: AsRef<Path>>(
        &self,
        path: P,
        encoder: VideoEncoder,
    ) -> Result<(), SequenceError> {
        let (width, height) = self.dimensions.ok_or(SequenceError::EmptySequence)?;
        encoder
            .with_dimensions(width, height)
            .write(path, self.frames.as_ref())
    }
}
