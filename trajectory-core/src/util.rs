//! Index arithmetic shared by in-process and remote memories.
use crate::{MemoryError, Result};
use std::ops::Range;

/// Checks `idx` against a memory of length `len`.
pub fn checked_index(idx: usize, len: usize) -> Result<usize> {
    if idx >= len {
        return Err(MemoryError::IndexOutOfRange { index: idx, len });
    }
    Ok(idx)
}

/// Converts the arguments of `get_ranged_items` into a half-open range.
///
/// `end` is inclusive. Without `end`, the range runs to the last record.
/// `start == len` yields an empty range; requests beyond that are rejected
/// rather than clamped.
///
/// # Errors
///
/// [`MemoryError::IndexOutOfRange`] if `start > len`, `end < start` or `end >= len`.
pub fn checked_range(start: usize, end: Option<usize>, len: usize) -> Result<Range<usize>> {
    if start > len {
        return Err(MemoryError::IndexOutOfRange { index: start, len });
    }
    match end {
        None => Ok(start..len),
        Some(end) if end < start || end >= len => {
            Err(MemoryError::IndexOutOfRange { index: end, len })
        }
        Some(end) => Ok(start..end + 1),
    }
}

/// Number of oldest records to drop so that `len` fits in `capacity`.
pub(crate) fn n_evicted(len: usize, capacity: Option<usize>) -> usize {
    match capacity {
        Some(capacity) if len > capacity => len - capacity,
        _ => 0,
    }
}

/// Drops the first `n` entries of a column.
#[inline]
pub(crate) fn evict_front<T>(column: &mut Vec<T>, n: usize) {
    if n > 0 {
        column.drain(..n);
    }
}
