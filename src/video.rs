//! Video decoding.
//!
//! [`decode_video`] reads every frame of the best video stream in a file and
//! returns them as RGB images in presentation order. It is the engine behind
//! [`FrameSequence::from_video`](crate::FrameSequence::from_video).

use std::{fmt::Display, path::Path};

use ffmpeg_next::{
    Error as FfmpegError, Packet,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::Pixel,
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::DynamicImage;

use crate::{error::SequenceError, utilities::rgb_frame_to_image};

/// Decode every frame of the video at `path` into RGB images.
///
/// Decoding ends at the end of the stream or at the first packet or frame
/// that cannot be read or converted; frames decoded before that point are
/// kept. A change of frame size or pixel format mid-stream is followed.
///
/// # Errors
///
/// - [`SequenceError::VideoOpen`] if the file cannot be opened.
/// - [`SequenceError::NoVideoStream`] if it has no video stream.
/// - [`SequenceError::FfmpegError`] if the decoder cannot be set up.
pub fn decode_video<P: AsRef<Path>>(path: P) -> Result<Vec<DynamicImage>, SequenceError> {
    let path = path.as_ref();
    log::debug!("Opening video file: {}", path.display());

    ffmpeg_next::init().map_err(|error| SequenceError::VideoOpen {
        path: path.to_path_buf(),
        reason: format!("FFmpeg initialisation failed: {error}"),
    })?;

    let mut input = ffmpeg_next::format::input(&path).map_err(|error| SequenceError::VideoOpen {
        path: path.to_path_buf(),
        reason: error.to_string(),
    })?;

    let (stream_index, parameters) = {
        let stream = input
            .streams()
            .best(Type::Video)
            .ok_or(SequenceError::NoVideoStream)?;
        (stream.index(), stream.parameters())
    };

    let decoder_context = CodecContext::from_parameters(parameters)?;
    let mut decoder = decoder_context.decoder().video()?;
    let mut converter = RgbConverter::default();
    let mut frames = Vec::new();

    loop {
        let mut packet = Packet::empty();
        match packet.read(&mut input) {
            Ok(()) => {
                if packet.stream() != stream_index {
                    continue;
                }
                if let Err(error) = decoder.send_packet(&packet) {
                    warn_early_stop(path, frames.len(), &error);
                    break;
                }
                if let Err(error) = converter.drain(&mut decoder, &mut frames) {
                    warn_early_stop(path, frames.len(), &error);
                    return Ok(frames);
                }
            }
            Err(FfmpegError::Eof) => break,
            Err(error) => {
                warn_early_stop(path, frames.len(), &error);
                break;
            }
        }
    }

    // Flush frames still buffered inside the decoder.
    if decoder.send_eof().is_ok() {
        if let Err(error) = converter.drain(&mut decoder, &mut frames) {
            warn_early_stop(path, frames.len(), &error);
        }
    }

    log::debug!("Decoded {} frames from {}", frames.len(), path.display());
    Ok(frames)
}

fn warn_early_stop(path: &Path, decoded: usize, error: &dyn Display) {
    log::warn!("Stopping at frame {decoded} of {}: {error}", path.display());
}

/// Converts decoded frames to packed RGB.
///
/// The scaler is built for the first frame and rebuilt whenever a frame
/// arrives with a different size or pixel format.
#[derive(Default)]
struct RgbConverter {
    scaler: Option<ScalingContext>,
    decoded: Option<VideoFrame>,
}

impl RgbConverter {
    /// Pull every frame the decoder has ready into `frames`.
    fn drain(
        &mut self,
        decoder: &mut VideoDecoder,
        frames: &mut Vec<DynamicImage>,
    ) -> Result<(), SequenceError> {
        let decoded = self.decoded.get_or_insert_with(VideoFrame::empty);
        while decoder.receive_frame(decoded).is_ok() {
            let stale = self.scaler.as_ref().is_some_and(|scaler| {
                let input = scaler.input();
                input.format != decoded.format()
                    || input.width != decoded.width()
                    || input.height != decoded.height()
            });
            if stale {
                log::debug!(
                    "Input changed to {}x{} {:?} at frame {}",
                    decoded.width(),
                    decoded.height(),
                    decoded.format(),
                    frames.len()
                );
                self.scaler = None;
            }

            let scaler = match &mut self.scaler {
                Some(scaler) => scaler,
                slot => slot.insert(ScalingContext::get(
                    decoded.format(),
                    decoded.width(),
                    decoded.height(),
                    Pixel::RGB24,
                    decoded.width(),
                    decoded.height(),
                    ScalingFlags::BILINEAR,
                )?),
            };

            let mut rgb = VideoFrame::empty();
            scaler.run(decoded, &mut rgb)?;
            frames.push(DynamicImage::ImageRgb8(rgb_frame_to_image(&rgb)?));
        }
        Ok(())
    }
}
