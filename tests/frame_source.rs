//! Frame storage integration tests.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use frameseq::{CachedFrameSource, FrameSequence, FrameSource, LazyFrameSource, SequenceError};
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};

struct CountingSource {
    len: usize,
    fail_at: Option<usize>,
    requests: Arc<AtomicUsize>,
}

impl CountingSource {
    fn new(len: usize) -> (Self, Arc<AtomicUsize>) {
        let requests = Arc::new(AtomicUsize::new(0));
        let source = Self {
            len,
            fail_at: None,
            requests: requests.clone(),
        };
        (source, requests)
    }
}

impl FrameSource for CountingSource {
    fn len(&self) -> usize {
        self.len
    }

    fn get(&self, index: usize) -> Result<DynamicImage, SequenceError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.fail_at == Some(index) {
            return Err(SequenceError::VideoDecodeError(format!("frame {index}")));
        }
        Ok(DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([index as u8, 1, 2]))))
    }
}

// ── In-memory ──────────────────────────────────────────────────────

#[test]
fn vec_source_rejects_out_of_range() {
    let frames = vec![DynamicImage::new_rgb8(2, 2); 3];
    assert_eq!(FrameSource::len(&frames), 3);
    assert!(matches!(
        FrameSource::get(&frames, 3),
        Err(SequenceError::IndexOutOfRange { index: 3, len: 3 })
    ));
}

#[test]
fn sequence_rejects_out_of_range() {
    let sequence =
        FrameSequence::from_images(vec![DynamicImage::new_rgb8(2, 2)], vec![0.0]).expect("seq");
    assert!(matches!(
        sequence.get(1),
        Err(SequenceError::IndexOutOfRange { index: 1, len: 1 })
    ));
    assert_eq!(sequence.timestamp(1), None);
}

#[test]
fn construction_fetches_only_the_first_frame() {
    let (source, requests) = CountingSource::new(6);
    let sequence = FrameSequence::new(source, vec![0.0; 6]).expect("sequence");

    assert_eq!(requests.load(Ordering::SeqCst), 1);
    assert_eq!(sequence.dimensions(), Some((2, 2)));
}

#[test]
fn construction_checks_lengths_before_decoding() {
    let (source, requests) = CountingSource::new(3);
    let result = FrameSequence::new(source, vec![0.0; 4]);

    assert!(matches!(
        result,
        Err(SequenceError::LengthMismatch {
            frames: 3,
            timestamps: 4
        })
    ));
    assert_eq!(requests.load(Ordering::SeqCst), 0);
}

// ── Lazy ───────────────────────────────────────────────────────────

#[test]
fn lazy_source_converts_to_rgb8() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let gray = tmp.path().join("gray.png");
    let rgba = tmp.path().join("rgba.png");
    GrayImage::from_pixel(3, 2, Luma([90])).save(&gray).expect("save");
    RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 40])).save(&rgba).expect("save");

    let source = LazyFrameSource::new(vec![gray, rgba]);
    let first = source.get(0).expect("gray");
    let second = source.get(1).expect("rgba");

    assert!(matches!(first, DynamicImage::ImageRgb8(_)));
    assert!(matches!(second, DynamicImage::ImageRgb8(_)));
    assert_eq!(first.to_rgb8().get_pixel(0, 0), &Rgb([90, 90, 90]));
    assert_eq!(second.to_rgb8().get_pixel(0, 0), &Rgb([10, 20, 30]));
}

#[test]
fn lazy_source_reports_missing_files_on_access() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let source = LazyFrameSource::new(vec![tmp.path().join("gone.png")]);

    assert_eq!(source.len(), 1);
    assert!(source.get(0).is_err());
    assert!(matches!(
        source.get(5),
        Err(SequenceError::IndexOutOfRange { index: 5, len: 1 })
    ));
}

#[test]
fn lazy_source_exposes_paths() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let paths = vec![tmp.path().join("a.png"), tmp.path().join("b.png")];
    let source = LazyFrameSource::new(paths.clone());

    assert_eq!(source.paths(), paths.as_slice());
    assert_eq!(source.path(1), Some(paths[1].as_path()));
    assert_eq!(source.path(2), None);
}

// ── Cached ─────────────────────────────────────────────────────────

#[test]
fn cached_source_decodes_each_index_once() {
    let (inner, requests) = CountingSource::new(4);
    let cached = CachedFrameSource::new(inner);

    for _ in 0..3 {
        for index in 0..4 {
            let frame = cached.get(index).expect("frame");
            assert_eq!(frame.to_rgb8().get_pixel(0, 0)[0], index as u8);
        }
    }

    assert_eq!(requests.load(Ordering::SeqCst), 4);
    assert_eq!(cached.cached_len(), 4);
}

#[test]
fn cached_source_can_be_cleared() {
    let (inner, requests) = CountingSource::new(2);
    let cached = CachedFrameSource::new(inner);
    cached.get(0).expect("frame");
    cached.clear();
    assert_eq!(cached.cached_len(), 0);

    cached.get(0).expect("frame");
    assert_eq!(requests.load(Ordering::SeqCst), 2);
}

#[test]
fn cached_source_does_not_cache_failures() {
    let (mut inner, requests) = CountingSource::new(3);
    inner.fail_at = Some(1);
    let cached = CachedFrameSource::new(inner);

    assert!(cached.get(1).is_err());
    assert!(cached.get(1).is_err());
    assert_eq!(requests.load(Ordering::SeqCst), 2);
    assert_eq!(cached.cached_len(), 0);

    assert!(matches!(
        cached.get(3),
        Err(SequenceError::IndexOutOfRange { index: 3, len: 3 })
    ));
    assert_eq!(requests.load(Ordering::SeqCst), 2);
}

#[test]
fn cached_source_backs_a_sequence() {
    let (inner, requests) = CountingSource::new(5);
    let sequence =
        FrameSequence::new(CachedFrameSource::new(inner), vec![0.0; 5]).expect("sequence");

    for _ in 0..2 {
        for index in 0..5 {
            sequence.get(index).expect("frame");
        }
    }
    assert_eq!(requests.load(Ordering::SeqCst), 5);
}
