//! Indexable frame storage.
//!
//! A [`FrameSource`] knows how many frames it holds and hands out a decoded
//! frame for an index. Where the pixels live is up to the implementation:
//!
//! - `Vec<DynamicImage>` keeps decoded frames in memory.
//! - [`LazyFrameSource`] keeps only file paths and decodes on every access.
//! - [`CachedFrameSource`] wraps any source and memoizes what it decodes.
//!
//! Sources must be [`Send`] and [`Sync`] because folder export reads frames
//! from worker threads.

use std::{
    collections::HashMap,
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};

use image::DynamicImage;

use crate::error::SequenceError;

/// An indexable, length-known store of frames.
pub trait FrameSource: Send + Sync {
    /// Number of frames.
    fn len(&self) -> usize;

    /// Decode or fetch the frame at `index`.
    ///
    /// # Errors
    ///
    /// [`SequenceError::IndexOutOfRange`] for `index >= len()`, or whatever
    /// the backing storage fails with.
    fn get(&self, index: usize) -> Result<DynamicImage, SequenceError>;

    /// Returns `true` if the source holds no frames.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub(crate) fn check_index(index: usize, len: usize) -> Result<(), SequenceError> {
    if index >= len {
        return Err(SequenceError::IndexOutOfRange { index, len });
    }
    Ok(())
}

impl FrameSource for Vec<DynamicImage> {
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn get(&self, index: usize) -> Result<DynamicImage, SequenceError> {
        self.as_slice()
            .get(index)
            .cloned()
            .ok_or(SequenceError::IndexOutOfRange {
                index,
                len: self.as_slice().len(),
            })
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn get(&self, index: usize) -> Result<DynamicImage, SequenceError> {
        (**self).get(index)
    }
}

/// Frames backed by image files, decoded just in time.
///
/// Every [`get`](FrameSource::get) opens and decodes the file again and
/// converts it to 8-bit RGB. Nothing is cached; wrap the source in a
/// [`CachedFrameSource`] if repeated access is expected.
#[derive(Debug, Clone)]
pub struct LazyFrameSource {
    paths: Vec<PathBuf>,
}

impl LazyFrameSource {
    /// Create a source over `paths`, in the given order.
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    /// The backing file paths.
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Path of the file backing `index`, if in range.
    pub fn path(&self, index: usize) -> Option<&Path> {
        self.paths.get(index).map(PathBuf::as_path)
    }
}

impl FrameSource for LazyFrameSource {
    fn len(&self) -> usize {
        self.paths.len()
    }

    fn get(&self, index: usize) -> Result<DynamicImage, SequenceError> {
        let path = self.path(index).ok_or(SequenceError::IndexOutOfRange {
            index,
            len: self.paths.len(),
        })?;
        let image = image::open(path)?;
        Ok(DynamicImage::ImageRgb8(image.into_rgb8()))
    }
}

/// Memoizing decorator over another [`FrameSource`].
///
/// The first access to an index decodes through the inner source; later
/// accesses return a clone of the stored frame. Failed decodes are not
/// cached.
pub struct CachedFrameSource<S> {
    inner: S,
    cache: Mutex<HashMap<usize, DynamicImage>>,
}

impl<S: FrameSource> CachedFrameSource<S> {
    /// Wrap `inner` with an empty cache.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Number of frames currently held in the cache.
    pub fn cached_len(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Drop every cached frame.
    pub fn clear(&self) {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Unwrap the decorator, discarding the cache.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S> Debug for CachedFrameSource<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("CachedFrameSource")
            .field("cached", &self.cache.lock().map(|cache| cache.len()).ok())
            .finish_non_exhaustive()
    }
}

impl<S: FrameSource> FrameSource for CachedFrameSource<S> {
    fn len(&self) -> usize {
        self.inner.len()
    }

    fn get(&self, index: usize) -> Result<DynamicImage, SequenceError> {
        check_index(index, self.inner.len())?;
        if let Some(frame) = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&index)
        {
            return Ok(frame.clone());
        }

        // Decode outside the lock so other indices are not serialized.
        let frame = self.inner.get(index)?;
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(index, frame.clone());
        Ok(frame)
    }
}

/// A view of another source through an index map.
///
/// The inner source is shared, so the sequence it came from stays usable.
pub(crate) struct RemappedSource {
    inner: Arc<dyn FrameSource>,
    indices: Vec<usize>,
}

impl RemappedSource {
    pub(crate) fn new(inner: Arc<dyn FrameSource>, indices: Vec<usize>) -> Self {
        Self { inner, indices }
    }
}

impl FrameSource for RemappedSource {
    fn len(&self) -> usize {
        self.indices.len()
    }

    fn get(&self, index: usize) -> Result<DynamicImage, SequenceError> {
        let source_index = *self.indices.get(index).ok_or(SequenceError::IndexOutOfRange {
            index,
            len: self.indices.len(),
        })?;
        self.inner.get(source_index)
    }
}
