//! Split-to-worker partitioning.
//!
//! `num_splits` contiguous split indices are divided into `num_workers`
//! near-equal contiguous ranges. The remainder after integer division goes
//! one split per worker to the lowest worker ids, so range sizes differ by
//! at most one. When `num_splits < num_workers`, trailing workers receive an
//! empty range (`first > last`); an empty range means "no work", never an
//! error.

use std::fmt;
use std::ops::RangeInclusive;

/// Inclusive range of split indices owned by one worker.
///
/// # Invariants
/// - `first > last` encodes the empty range handed to surplus workers.
/// - Across a [`SplitRanges`] partition, non-empty ranges are sorted,
///   contiguous, and non-overlapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SplitRange {
    /// First split index in the range.
    pub first: usize,
    /// Last split index in the range (inclusive).
    pub last: usize,
}

impl SplitRange {
    /// True when this range assigns no splits.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.first > self.last
    }

    /// Number of splits in the range.
    #[inline]
    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.last - self.first + 1
        }
    }

    /// Split indices in ascending order; yields nothing for an empty range.
    #[inline]
    pub fn splits(&self) -> RangeInclusive<usize> {
        self.first..=self.last
    }
}

impl fmt::Display for SplitRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}..{})", self.first, self.last)
    }
}

/// Deterministic partition of `[0, num_splits)` into per-worker ranges.
pub struct SplitRanges {
    ranges: Vec<SplitRange>,
}

impl SplitRanges {
    /// Computes the partition.
    ///
    /// # Panics
    /// Panics if `num_splits` or `num_workers` is zero.
    pub fn new(num_splits: usize, num_workers: usize) -> Self {
        assert!(num_splits > 0, "num_splits must be > 0");
        assert!(num_workers > 0, "num_workers must be > 0");

        let base = num_splits / num_workers;
        let remainder = num_splits % num_workers;

        let mut ranges = Vec::with_capacity(num_workers);
        let mut first = 0usize;
        for worker in 0..num_workers {
            let size = base + usize::from(worker < remainder);
            // `size == 0` only happens once `first >= num_splits >= 1`, so
            // `first + size - 1` cannot underflow and encodes `first > last`.
            let last = first + size - 1;
            ranges.push(SplitRange { first, last });
            first += size;
        }

        Self { ranges }
    }

    /// Range assigned to `worker_id`.
    ///
    /// # Panics
    /// Panics if `worker_id` is outside the dense id space `[0, num_workers)`.
    #[inline]
    pub fn splits_for(&self, worker_id: usize) -> SplitRange {
        self.ranges[worker_id]
    }

    /// Number of per-worker ranges (always the `num_workers` given at build).
    #[inline]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// True when the partition holds no ranges.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Iterates the ranges in worker-id order.
    pub fn iter(&self) -> impl Iterator<Item = SplitRange> + '_ {
        self.ranges.iter().copied()
    }
}

impl fmt::Display for SplitRanges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, range) in self.ranges.iter().enumerate() {
            if idx > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{range}")?;
        }
        Ok(())
    }
}
