//! Folder-backed sequence integration tests.
//!
//! Every test builds its own frame folder in a temporary directory.

use std::{fs, io::ErrorKind, path::Path};

use frameseq::{
    FolderExportOptions, FolderLayout, FrameSequence, SequenceError, write_timestamps,
};
use image::{DynamicImage, Rgb, RgbImage};

const WIDTH: u32 = 8;
const HEIGHT: u32 = 6;

fn solid(shade: u8) -> RgbImage {
    RgbImage::from_pixel(WIDTH, HEIGHT, Rgb([shade, 255 - shade, shade / 2]))
}

fn shade_of(image: &DynamicImage) -> u8 {
    image.to_rgb8().get_pixel(0, 0)[0]
}

/// Write `frame_{:010d}.png` for each index with a shade derived from it,
/// plus a `timestamps.txt` with one line per index.
fn write_default_folder(directory: &Path, indices: &[u64], timestamps: &[f64]) {
    for &index in indices {
        let path = directory.join(format!("frame_{index:010}.png"));
        solid(index as u8 * 10).save(path).expect("save frame");
    }
    write_timestamps(directory.join("timestamps.txt"), timestamps).expect("write timestamps");
}

// ── Reading ────────────────────────────────────────────────────────

#[test]
fn frames_are_ordered_by_index_with_gaps() {
    let tmp = tempfile::tempdir().expect("tempdir");
    // Written out of order on purpose.
    write_default_folder(tmp.path(), &[10, 0, 3, 1], &[0.0, 0.5, 1.5, 2.25]);

    let sequence = FrameSequence::from_folder(tmp.path()).expect("open folder");

    assert_eq!(sequence.len(), 4);
    assert_eq!(sequence.timestamps(), &[0.0, 0.5, 1.5, 2.25]);
    let shades: Vec<u8> = (0..sequence.len())
        .map(|index| shade_of(&sequence.get(index).expect("frame")))
        .collect();
    assert_eq!(shades, vec![0, 10, 30, 100]);
}

#[test]
fn unrelated_files_are_ignored() {
    let tmp = tempfile::tempdir().expect("tempdir");
    write_default_folder(tmp.path(), &[0, 1], &[0.0, 0.1]);
    fs::write(tmp.path().join("notes.txt"), "not a frame").expect("write");
    solid(200).save(tmp.path().join("frame_12.png")).expect("save");
    solid(200).save(tmp.path().join("frame_0000000002.jpg")).expect("save");
    fs::create_dir(tmp.path().join("frame_0000000003.png")).expect("mkdir");

    let sequence = FrameSequence::from_folder(tmp.path()).expect("open folder");
    assert_eq!(sequence.len(), 2);
}

#[test]
fn length_matches_timestamp_count() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let indices: Vec<u64> = (0..7).collect();
    let timestamps: Vec<f64> = indices.iter().map(|&i| i as f64 * 0.04).collect();
    write_default_folder(tmp.path(), &indices, &timestamps);

    let sequence = FrameSequence::from_folder(tmp.path()).expect("open folder");
    assert_eq!(sequence.len(), 7);
    assert_eq!(sequence.timestamps().len(), 7);
    assert_eq!(sequence.dimensions(), Some((WIDTH, HEIGHT)));
    assert_eq!(sequence.width(), WIDTH);
    assert_eq!(sequence.height(), HEIGHT);
}

#[test]
fn custom_layout_is_honored() {
    let tmp = tempfile::tempdir().expect("tempdir");
    for index in [4u64, 2] {
        solid(index as u8).save(tmp.path().join(format!("img_{index:05}.png"))).expect("save");
    }
    fs::write(tmp.path().join("times.log"), "# capture times\n1.0\n\n2.0\n").expect("write");

    let layout = FolderLayout::new()
        .with_image_template("img_{:05d}.png")
        .with_timestamps_file("times.log");
    let sequence = FrameSequence::from_folder_with_layout(tmp.path(), &layout).expect("open");

    assert_eq!(sequence.timestamps(), &[1.0, 2.0]);
    assert_eq!(shade_of(&sequence.get(0).expect("frame")), 2);
    assert_eq!(shade_of(&sequence.get(1).expect("frame")), 4);
}

#[test]
fn frames_are_decoded_on_every_access() {
    let tmp = tempfile::tempdir().expect("tempdir");
    write_default_folder(tmp.path(), &[0, 1], &[0.0, 1.0]);
    let sequence = FrameSequence::from_folder(tmp.path()).expect("open folder");
    assert_eq!(shade_of(&sequence.get(1).expect("frame")), 10);

    solid(77)
        .save(tmp.path().join("frame_0000000001.png"))
        .expect("overwrite frame");

    assert_eq!(shade_of(&sequence.get(1).expect("frame")), 77);
}

#[test]
fn iter_pairs_frames_with_timestamps() {
    let tmp = tempfile::tempdir().expect("tempdir");
    write_default_folder(tmp.path(), &[0, 1, 2], &[0.0, 0.25, 0.5]);
    let sequence = FrameSequence::from_folder(tmp.path()).expect("open folder");

    let pairs: Vec<(u8, f64)> = sequence
        .iter()
        .map(|item| item.map(|(frame, timestamp)| (shade_of(&frame), timestamp)))
        .collect::<Result<_, _>>()
        .expect("iterate");
    assert_eq!(pairs, vec![(0, 0.0), (10, 0.25), (20, 0.5)]);
}

// ── Errors ─────────────────────────────────────────────────────────

#[test]
fn missing_directory_is_not_found() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let result = FrameSequence::from_folder(tmp.path().join("does-not-exist"));

    match result {
        Err(SequenceError::IoError(error)) => assert_eq!(error.kind(), ErrorKind::NotFound),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[test]
fn missing_timestamp_file_is_an_io_error() {
    let tmp = tempfile::tempdir().expect("tempdir");
    solid(0).save(tmp.path().join("frame_0000000000.png")).expect("save");

    let result = FrameSequence::from_folder(tmp.path());
    assert!(matches!(result, Err(SequenceError::IoError(_))));
}

#[test]
fn count_mismatch_is_rejected() {
    let tmp = tempfile::tempdir().expect("tempdir");
    write_default_folder(tmp.path(), &[0, 1, 2], &[0.0, 1.0]);

    let result = FrameSequence::from_folder(tmp.path());
    assert!(matches!(
        result,
        Err(SequenceError::LengthMismatch {
            frames: 3,
            timestamps: 2
        })
    ));
}

#[test]
fn malformed_timestamp_reports_line() {
    let tmp = tempfile::tempdir().expect("tempdir");
    solid(0).save(tmp.path().join("frame_0000000000.png")).expect("save");
    solid(0).save(tmp.path().join("frame_0000000001.png")).expect("save");
    fs::write(tmp.path().join("timestamps.txt"), "0.0\nsoon\n").expect("write");

    match FrameSequence::from_folder(tmp.path()) {
        Err(SequenceError::TimestampParse { line, value, .. }) => {
            assert_eq!(line, 2);
            assert_eq!(value, "soon");
        }
        other => panic!("expected TimestampParse, got {other:?}"),
    }
}

#[test]
fn corrupt_frame_fails_only_when_read() {
    let tmp = tempfile::tempdir().expect("tempdir");
    write_default_folder(tmp.path(), &[0, 1], &[0.0, 1.0]);
    fs::write(tmp.path().join("frame_0000000001.png"), b"garbage").expect("corrupt");

    let sequence = FrameSequence::from_folder(tmp.path()).expect("frame 0 is intact");
    assert!(sequence.get(0).is_ok());
    assert!(matches!(sequence.get(1), Err(SequenceError::ImageError(_))));
}

#[test]
fn empty_folder_gives_empty_sequence() {
    let tmp = tempfile::tempdir().expect("tempdir");
    fs::write(tmp.path().join("timestamps.txt"), "").expect("write");

    let sequence = FrameSequence::from_folder(tmp.path()).expect("open");
    assert!(sequence.is_empty());
    assert_eq!(sequence.dimensions(), None);
    assert!(matches!(
        sequence.get(0),
        Err(SequenceError::IndexOutOfRange { index: 0, len: 0 })
    ));
}

// ── Round trip ─────────────────────────────────────────────────────

#[test]
fn export_then_reimport_preserves_frames_and_timestamps() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let images: Vec<DynamicImage> = (0..5u8)
        .map(|shade| DynamicImage::ImageRgb8(solid(shade * 40)))
        .collect();
    let timestamps = vec![0.0, 0.1, 0.2, 1.0 / 3.0, 1234.5678];
    let sequence = FrameSequence::from_images(images, timestamps.clone()).expect("sequence");

    let out = tmp.path().join("exported");
    sequence
        .to_folder(&out, &FolderExportOptions::default())
        .expect("export");

    let layout = FolderLayout::new()
        .with_image_template("{:06d}.png")
        .with_timestamps_file("timestamp.txt");
    let reloaded = FrameSequence::from_folder_with_layout(&out, &layout).expect("reimport");

    assert_eq!(reloaded.len(), sequence.len());
    assert_eq!(reloaded.timestamps(), timestamps.as_slice());
    for index in 0..sequence.len() {
        let original = sequence.get(index).expect("original").to_rgb8();
        let copy = reloaded.get(index).expect("copy").to_rgb8();
        assert_eq!(original, copy, "frame {index} differs");
    }
}
