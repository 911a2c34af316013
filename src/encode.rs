//! Video encoding: write a sequence of frames into a video file.
//!
//! [`VideoEncoder`] pulls frames one at a time from any
//! [`FrameSource`], converts them from RGB to the codec's pixel layout and
//! muxes them at a fixed frame rate. The frame rate comes from the options,
//! never from the sequence's timestamps.
//!
//! # Example
//!
//! ```no_run
//! use frameseq::{FrameSequence, SequenceError, VideoEncoderOptions};
//!
//! let sequence = FrameSequence::from_folder("frames")?;
//! sequence.to_video("output.avi", &VideoEncoderOptions::default())?;
//! # Ok::<(), SequenceError>(())
//! ```

use std::{path::Path, sync::Arc};

use ffmpeg_next::{
    Packet, Rational,
    codec::{Id, context::Context as CodecContext},
    encoder::Video as OpenedVideoEncoder,
    format::{Flags as FormatFlags, Pixel, context::Output},
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use ffmpeg_sys_next::{AVCodecID, AVOutputFormat};
use image::imageops::FilterType;

use crate::{
    error::SequenceError,
    progress::{NoOpProgress, OperationType, ProgressCallback, ProgressCounter},
    source::FrameSource,
    utilities::image_to_rgb_frame,
};

/// Default container frame rate for exported video.
pub const DEFAULT_VIDEO_FPS: u32 = 30;
/// Default four-character codec tag for exported video.
pub const DEFAULT_FOURCC: [u8; 4] = *b"XVID";

/// Options for the video encoder.
#[derive(Debug, Clone)]
pub struct VideoEncoderOptions {
    /// Container frame rate (default: 30).
    pub fps: u32,
    /// Codec to use. Default is MPEG-4 Part 2.
    pub codec: VideoCodec,
    /// Four-character codec tag stored in the container (default: `XVID`).
    /// `None` lets the muxer choose, as does a container that cannot store
    /// this tag for the codec.
    pub fourcc: Option<[u8; 4]>,
    /// Output size. If `None`, taken from the first frame.
    pub dimensions: Option<(u32, u32)>,
    /// Bitrate in bits per second. If `None`, the codec default is used.
    pub bitrate: Option<usize>,
}

impl Default for VideoEncoderOptions {
    fn default() -> Self {
        Self {
            fps: DEFAULT_VIDEO_FPS,
            codec: VideoCodec::Mpeg4,
            fourcc: Some(DEFAULT_FOURCC),
            dimensions: None,
            bitrate: None,
        }
    }
}

impl VideoEncoderOptions {
    /// Set the container frame rate. Clamped to a minimum of 1.
    pub fn fps(mut self, fps: u32) -> Self {
        self.fps = fps.max(1);
        self
    }

    /// Set the codec. Clears the fourcc tag unless the codec is MPEG-4,
    /// since `XVID` only describes MPEG-4 Part 2 streams.
    pub fn codec(mut self, codec: VideoCodec) -> Self {
        self.codec = codec;
        if codec != VideoCodec::Mpeg4 {
            self.fourcc = None;
        }
        self
    }

    /// Set or clear the four-character codec tag.
    pub fn fourcc(mut self, fourcc: Option<[u8; 4]>) -> Self {
        self.fourcc = fourcc;
        self
    }

    /// Fix the output size.
    pub fn dimensions(mut self, width: u32, height: u32) -> Self {
        self.dimensions = Some((width, height));
        self
    }

    /// Set the target bitrate in bits per second.
    pub fn bitrate(mut self, bitrate: usize) -> Self {
        self.bitrate = Some(bitrate);
        self
    }
}

/// Supported output video codecs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoCodec {
    /// MPEG-4 Part 2 (Xvid/DivX compatible).
    Mpeg4,
    /// H.264 / AVC.
    H264,
    /// Motion JPEG.
    Mjpeg,
}

impl VideoCodec {
    fn to_codec_id(self) -> Id {
        match self {
            VideoCodec::Mpeg4 => Id::MPEG4,
            VideoCodec::H264 => Id::H264,
            VideoCodec::Mjpeg => Id::MJPEG,
        }
    }

    fn input_pixel_format(self) -> Pixel {
        match self {
            VideoCodec::Mjpeg => Pixel::YUVJ420P,
            VideoCodec::Mpeg4 | VideoCodec::H264 => Pixel::YUV420P,
        }
    }
}

/// Encodes frames into a video file.
pub struct VideoEncoder {
    options: VideoEncoderOptions,
    progress: Arc<dyn ProgressCallback>,
}

impl VideoEncoder {
    /// Create a new video encoder with the given options.
    pub fn new(options: VideoEncoderOptions) -> Self {
        Self {
            options,
            progress: Arc::new(NoOpProgress),
        }
    }

    /// Report every encoded frame to `callback`.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Fix the output size, overriding the options.
    #[must_use]
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.options.dimensions = Some((width, height));
        self
    }

    /// The options this encoder writes with.
    pub fn options(&self) -> &VideoEncoderOptions {
        &self.options
    }

    /// Write every frame of `frames` to `path`, in index order.
    ///
    /// The container format is inferred from the file extension. Frames
    /// whose size differs from the output size are resized to it.
    ///
    /// # Errors
    ///
    /// - [`SequenceError::EmptySequence`] if `frames` is empty.
    /// - [`SequenceError::VideoEncodeError`] if the codec cannot be opened.
    /// - [`SequenceError::VideoWriteError`] on muxing or I/O failure.
    /// - Any error the source returns while producing a frame.
    pub fn write<P: AsRef<Path>>(
        &self,
        path: P,
        frames: &dyn FrameSource,
    ) -> Result<(), SequenceError> {
        let path = path.as_ref();
        if frames.is_empty() {
            return Err(SequenceError::EmptySequence);
        }

        let (width, height) = match self.options.dimensions {
            Some(dimensions) => dimensions,
            None => {
                let first = frames.get(0)?;
                (first.width(), first.height())
            }
        };
        let fps = self.options.fps.max(1) as i32;
        let time_base = Rational::new(1, fps);

        log::info!(
            "Writing {} frames to {} ({:?}, {}x{}, {} fps)",
            frames.len(),
            path.display(),
            self.options.codec,
            width,
            height,
            fps,
        );

        ffmpeg_next::init()?;

        let mut output = ffmpeg_next::format::output(&path)
            .map_err(|e| SequenceError::VideoWriteError(format!("cannot open output: {e}")))?;
        let needs_global_header = output.format().flags().contains(FormatFlags::GLOBAL_HEADER);

        let codec_id = self.options.codec.to_codec_id();
        let target_pixel = self.options.codec.input_pixel_format();
        let encoder_codec = ffmpeg_next::encoder::find(codec_id).ok_or_else(|| {
            SequenceError::VideoEncodeError(format!("codec {codec_id:?} not available"))
        })?;

        let fourcc = self.options.fourcc.filter(|&fourcc| {
            let accepted = muxer_accepts_tag(output.format().as_ptr(), codec_id, fourcc);
            if !accepted {
                log::warn!(
                    "{} does not store {:?} as {}, letting the muxer pick the tag",
                    output.format().name(),
                    codec_id,
                    String::from_utf8_lossy(&fourcc)
                );
            }
            accepted
        });

        let mut stream = output
            .add_stream(encoder_codec)
            .map_err(|e| SequenceError::VideoWriteError(format!("cannot add stream: {e}")))?;
        let stream_index = stream.index();

        let mut encoder = CodecContext::from_parameters(stream.parameters())
            .map_err(|e| {
                SequenceError::VideoEncodeError(format!("cannot create codec context: {e}"))
            })?
            .encoder()
            .video()
            .map_err(|e| {
                SequenceError::VideoEncodeError(format!("cannot open video encoder: {e}"))
            })?;

        encoder.set_width(width);
        encoder.set_height(height);
        encoder.set_format(target_pixel);
        encoder.set_time_base(time_base);
        encoder.set_frame_rate(Some(Rational::new(fps, 1)));
        if let Some(bitrate) = self.options.bitrate {
            encoder.set_bit_rate(bitrate);
        }

        // SAFETY: the context is exclusively owned and not yet opened.
        unsafe {
            let context = encoder.as_mut_ptr();
            if needs_global_header {
                (*context).flags |= ffmpeg_sys_next::AV_CODEC_FLAG_GLOBAL_HEADER as i32;
            }
            if let Some(fourcc) = fourcc {
                (*context).codec_tag = u32::from_le_bytes(fourcc);
            }
        }

        let mut encoder = encoder
            .open_as(encoder_codec)
            .map_err(|e| SequenceError::VideoEncodeError(format!("cannot open encoder: {e}")))?;
        stream.set_parameters(&encoder);

        output
            .write_header()
            .map_err(|e| SequenceError::VideoWriteError(format!("cannot write header: {e}")))?;
        let stream_time_base = output
            .stream(stream_index)
            .map(|stream| stream.time_base())
            .ok_or_else(|| SequenceError::VideoWriteError("output stream vanished".to_string()))?;

        let mut scaler = ScalingContext::get(
            Pixel::RGB24,
            width,
            height,
            target_pixel,
            width,
            height,
            ScalingFlags::BILINEAR,
        )
        .map_err(|e| SequenceError::VideoWriteError(format!("cannot create scaler: {e}")))?;

        let counter = ProgressCounter::new(
            self.progress.clone(),
            OperationType::VideoExport,
            Some(frames.len() as u64),
            1,
        );
        let mut packets = PacketWriter {
            stream_index,
            encoder_time_base: time_base,
            stream_time_base,
        };

        for index in 0..frames.len() {
            let image = frames.get(index)?;
            let rgb = if image.width() != width || image.height() != height {
                log::warn!(
                    "Frame {index} is {}x{}, resizing to {width}x{height}",
                    image.width(),
                    image.height()
                );
                image
                    .resize_exact(width, height, FilterType::Lanczos3)
                    .into_rgb8()
            } else {
                image.into_rgb8()
            };

            let source_frame = image_to_rgb_frame(&rgb);
            let mut converted = ffmpeg_next::frame::Video::empty();
            scaler
                .run(&source_frame, &mut converted)
                .map_err(|e| SequenceError::VideoWriteError(format!("scaling failed: {e}")))?;
            converted.set_pts(Some(index as i64));

            encoder.send_frame(&converted).map_err(|e| {
                SequenceError::VideoEncodeError(format!("send_frame failed: {e}"))
            })?;
            packets.drain(&mut encoder, &mut output)?;
            counter.advance();
        }

        encoder
            .send_eof()
            .map_err(|e| SequenceError::VideoEncodeError(format!("send_eof failed: {e}")))?;
        packets.drain(&mut encoder, &mut output)?;

        output
            .write_trailer()
            .map_err(|e| SequenceError::VideoWriteError(format!("cannot write trailer: {e}")))?;
        Ok(())
    }
}

/// Whether a muxer can store `codec` under the tag `fourcc`.
///
/// Muxers without a tag table take any tag. Otherwise the tag must map
/// back to `codec`; `mp4`, for one, only knows MPEG-4 as `mp4v`.
fn muxer_accepts_tag(format: *const AVOutputFormat, codec: Id, fourcc: [u8; 4]) -> bool {
    let wanted: AVCodecID = codec.into();
    // SAFETY: `format` points to one of FFmpeg's static muxer descriptions,
    // whose tag tables are null-terminated.
    unsafe {
        let tags = (*format).codec_tag;
        if tags.is_null() {
            return true;
        }
        ffmpeg_sys_next::av_codec_get_id(tags, u32::from_le_bytes(fourcc)) == wanted
    }
}

/// Moves encoded packets from the encoder into the container.
struct PacketWriter {
    stream_index: usize,
    encoder_time_base: Rational,
    stream_time_base: Rational,
}

impl PacketWriter {
    fn drain(
        &mut self,
        encoder: &mut OpenedVideoEncoder,
        output: &mut Output,
    ) -> Result<(), SequenceError> {
        let mut packet = Packet::empty();
        while encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(self.stream_index);
            packet.rescale_ts(self.encoder_time_base, self.stream_time_base);
            packet
                .write_interleaved(output)
                .map_err(|e| SequenceError::VideoWriteError(format!("write packet failed: {e}")))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{ffi::CString, ptr};

    use super::*;

    fn muxer_for(file_name: &str) -> *const AVOutputFormat {
        let file_name = CString::new(file_name).unwrap();
        let format: *const AVOutputFormat = unsafe {
            ffmpeg_sys_next::av_guess_format(ptr::null(), file_name.as_ptr(), ptr::null())
        };
        assert!(!format.is_null(), "no muxer for {file_name:?}");
        format
    }

    #[test]
    fn xvid_tag_only_goes_where_it_fits() {
        assert!(muxer_accepts_tag(muxer_for("out.avi"), Id::MPEG4, DEFAULT_FOURCC));
        assert!(!muxer_accepts_tag(muxer_for("out.mp4"), Id::MPEG4, DEFAULT_FOURCC));
        assert!(muxer_accepts_tag(muxer_for("out.mp4"), Id::MPEG4, *b"mp4v"));
    }
}
