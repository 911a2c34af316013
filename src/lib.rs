//! # frameseq
//!
//! Timestamped image sequences: read them from numbered frame folders or
//! video files, resample them, and write them back out.
//!
//! A [`FrameSequence`] pairs every frame with a timestamp in seconds. It can
//! be built three ways and exported two ways:
//!
//! | From | To |
//! |------|----|
//! | folder of numbered images + timestamp log ([`FrameSequence::from_folder`]) | folder, written concurrently ([`FrameSequence::to_folder`]) |
//! | video file at an assumed frame rate ([`FrameSequence::from_video`]) | video file at a fixed frame rate ([`FrameSequence::to_video`]) |
//! | in-memory images ([`FrameSequence::from_images`]) | |
//!
//! Video decoding and encoding go through FFmpeg via
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next); image files go
//! through the [`image`](https://crates.io/crates/image) crate.
//!
//! ## Quick Start
//!
//! ### Folder to video
//!
//! ```no_run
//! use frameseq::{FrameSequence, VideoEncoderOptions};
//!
//! let sequence = FrameSequence::from_folder("capture").unwrap();
//! sequence.to_video("capture.avi", &VideoEncoderOptions::default()).unwrap();
//! ```
//!
//! ### Video to folder, every other frame doubled
//!
//! ```no_run
//! use frameseq::{FolderExportOptions, FrameSequence};
//!
//! let sequence = FrameSequence::from_video("input.mp4", 25.0).unwrap();
//! let resampled = sequence.skip_and_repeat(2, 1).unwrap();
//! resampled
//!     .to_folder("frames", &FolderExportOptions::new().with_max_workers(4))
//!     .unwrap();
//! ```
//!
//! ## Frame storage
//!
//! Frames sit behind the [`FrameSource`] trait. Folder-backed sequences use
//! [`LazyFrameSource`], which decodes the file on every access and caches
//! nothing; wrap a source in [`CachedFrameSource`] to memoize.
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod config;
pub mod encode;
pub mod error;
mod export;
pub mod progress;
pub mod resample;
pub mod sequence;
pub mod source;
pub mod template;
pub mod timestamps;
mod utilities;
pub mod video;

pub use config::{
    DEFAULT_EXPORT_FILE_TEMPLATE, DEFAULT_EXPORT_TIMESTAMPS_FILE, DEFAULT_INPUT_IMAGE_TEMPLATE,
    DEFAULT_INPUT_TIMESTAMPS_FILE, DEFAULT_MAX_WORKERS, FolderExportOptions, FolderLayout,
};
pub use encode::{DEFAULT_FOURCC, DEFAULT_VIDEO_FPS, VideoCodec, VideoEncoder, VideoEncoderOptions};
pub use error::SequenceError;
pub use progress::{OperationType, ProgressCallback, ProgressInfo};
pub use resample::{SkipAndRepeat, SkipAndRepeatExt, skip_and_repeat_indices};
pub use sequence::FrameSequence;
pub use source::{CachedFrameSource, FrameSource, LazyFrameSource};
pub use template::FileTemplate;
pub use timestamps::{read_timestamps, write_lines, write_timestamps};
pub use video::decode_video;
