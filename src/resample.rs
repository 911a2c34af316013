//! Skip-and-repeat resampling.
//!
//! Skip-and-repeat drops frames in fixed-size groups and duplicates the
//! survivors, producing test inputs for frame-interpolation evaluation. The
//! source is walked in groups of `number_of_skips` consecutive elements (the
//! last group may be short); the first element of each group is kept and
//! emitted `1 + number_of_frames_to_insert` times in a row.
//!
//! | input          | skips | inserts | output                   |
//! |----------------|-------|---------|--------------------------|
//! | `0 1 2 3 4 5`  | 1     | 0       | `0 1 2 3 4 5`            |
//! | `0 1 2 3 4 5`  | 2     | 0       | `0 2 4`                  |
//! | `0 1 2 3 4`    | 2     | 1       | `0 0 2 2 4 4`            |
//! | `0 1 2 3 4 5 6`| 3     | 2       | `0 0 0 3 3 3 6 6 6`      |
//! | `0 1`          | 5     | 1       | `0 0`                    |
//!
//! Frames and timestamps of a [`FrameSequence`](crate::FrameSequence) go
//! through the same rule, so they stay paired.
//!
//! # Example
//!
//! ```
//! use frameseq::SkipAndRepeatExt;
//!
//! let resampled: Vec<u32> = (0..5).skip_and_repeat(2, 1)?.collect();
//! assert_eq!(resampled, vec![0, 0, 2, 2, 4, 4]);
//! # Ok::<(), frameseq::SequenceError>(())
//! ```

use std::iter::FusedIterator;

use crate::error::SequenceError;

/// Iterator adapter produced by [`SkipAndRepeatExt::skip_and_repeat`].
pub struct SkipAndRepeat<I: Iterator> {
    inner: I,
    number_of_skips: usize,
    number_of_frames_to_insert: usize,
    /// Element being repeated and how many more copies it owes.
    pending: Option<(I::Item, usize)>,
}

impl<I: Iterator> SkipAndRepeat<I> {
    /// Wrap `inner`.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError::InvalidSkip`] if `number_of_skips` is zero.
    pub fn new(
        inner: I,
        number_of_skips: usize,
        number_of_frames_to_insert: usize,
    ) -> Result<Self, SequenceError> {
        if number_of_skips == 0 {
            return Err(SequenceError::InvalidSkip);
        }
        Ok(Self {
            inner,
            number_of_skips,
            number_of_frames_to_insert,
            pending: None,
        })
    }
}

impl<I> Iterator for SkipAndRepeat<I>
where
    I: Iterator,
    I::Item: Clone,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some((item, remaining)) = self.pending.take() {
            if remaining > 1 {
                self.pending = Some((item.clone(), remaining - 1));
            }
            return Some(item);
        }

        let kept = self.inner.next()?;
        // Discard the rest of the group; a short final group just ends early.
        for _ in 1..self.number_of_skips {
            if self.inner.next().is_none() {
                break;
            }
        }

        if self.number_of_frames_to_insert > 0 {
            self.pending = Some((kept.clone(), self.number_of_frames_to_insert));
        }
        Some(kept)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let pending = self.pending.as_ref().map_or(0, |(_, remaining)| *remaining);
        let (lower, upper) = self.inner.size_hint();
        let inserts = self.number_of_frames_to_insert;
        let groups = |count: usize| count.div_ceil(self.number_of_skips);
        (
            pending.saturating_add(
                groups(lower).saturating_mul(inserts.saturating_add(1)),
            ),
            upper.and_then(|upper| {
                repeated_len(groups(upper), inserts).and_then(|total| total.checked_add(pending))
            }),
        )
    }
}

impl<I> FusedIterator for SkipAndRepeat<I>
where
    I: FusedIterator,
    I::Item: Clone,
{
}

/// Extension trait adding [`skip_and_repeat`](SkipAndRepeatExt::skip_and_repeat)
/// to every iterator.
pub trait SkipAndRepeatExt: Iterator + Sized {
    /// Keep the first of every `number_of_skips` elements and repeat it
    /// `number_of_frames_to_insert` extra times.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError::InvalidSkip`] if `number_of_skips` is zero.
    fn skip_and_repeat(
        self,
        number_of_skips: usize,
        number_of_frames_to_insert: usize,
    ) -> Result<SkipAndRepeat<Self>, SequenceError> {
        SkipAndRepeat::new(self, number_of_skips, number_of_frames_to_insert)
    }
}

impl<I: Iterator> SkipAndRepeatExt for I {}

/// `groups * (1 + inserts)`, or `None` if it does not fit in `usize`.
fn repeated_len(groups: usize, inserts: usize) -> Option<usize> {
    if groups == 0 {
        return Some(0);
    }
    inserts
        .checked_add(1)
        .and_then(|copies| groups.checked_mul(copies))
}

/// Source indices selected by skip-and-repeat over a sequence of `len`
/// elements.
///
/// Output length is `ceil(len / number_of_skips) * (1 + number_of_frames_to_insert)`.
///
/// # Errors
///
/// - [`SequenceError::InvalidSkip`] if `number_of_skips` is zero.
/// - [`SequenceError::ResampleOverflow`] if the output length does not fit
///   in `usize`.
pub fn skip_and_repeat_indices(
    len: usize,
    number_of_skips: usize,
    number_of_frames_to_insert: usize,
) -> Result<Vec<usize>, SequenceError> {
    let indices = (0..len).skip_and_repeat(number_of_skips, number_of_frames_to_insert)?;
    if repeated_len(len.div_ceil(number_of_skips), number_of_frames_to_insert).is_none() {
        return Err(SequenceError::ResampleOverflow {
            len,
            number_of_skips,
            number_of_frames_to_insert,
        });
    }
    Ok(indices.collect())
}
