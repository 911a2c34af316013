//! Pixel buffer helpers shared by the decoder and encoder.
//!
//! FFmpeg frames carry per-row padding (stride ≥ width × bytes per pixel);
//! `image` buffers are tightly packed. These helpers copy between the two.

use ffmpeg_next::{format::Pixel, frame::Video as VideoFrame};
use image::RgbImage;

use crate::error::SequenceError;

/// Copy a packed RGB24 FFmpeg frame into an [`RgbImage`], dropping row
/// padding.
pub(crate) fn rgb_frame_to_image(video_frame: &VideoFrame) -> Result<RgbImage, SequenceError> {
    let width = video_frame.width();
    let height = video_frame.height();
    let stride = video_frame.stride(0);
    let row_len = (width as usize) * 3;
    let data = video_frame.data(0);

    let buffer = if stride == row_len {
        data[..row_len * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(row_len * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + row_len]);
        }
        buffer
    };

    RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
        SequenceError::VideoDecodeError(format!(
            "decoded frame buffer does not fit {width}x{height} RGB"
        ))
    })
}

/// Copy an [`RgbImage`] into a newly allocated RGB24 FFmpeg frame.
pub(crate) fn image_to_rgb_frame(image: &RgbImage) -> VideoFrame {
    let width = image.width();
    let height = image.height();
    let mut video_frame = VideoFrame::new(Pixel::RGB24, width, height);
    let stride = video_frame.stride(0);
    let row_len = (width as usize) * 3;
    let source = image.as_raw();
    let destination = video_frame.data_mut(0);

    for row in 0..(height as usize) {
        let source_start = row * row_len;
        let destination_start = row * stride;
        destination[destination_start..destination_start + row_len]
            .copy_from_slice(&source[source_start..source_start + row_len]);
    }
    video_frame
}
