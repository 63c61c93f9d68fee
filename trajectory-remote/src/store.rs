//! Remote list stores.
use trajectory_core::Result;

/// An ordered list store shared between processes, such as a Redis list.
///
/// Indices follow Redis: `stop` is inclusive and negative indices count from
/// the end of the list (`-1` is the last element). Each call is independent;
/// there is no locking across calls.
///
/// Implementations report transport failures as
/// [`MemoryError::RemoteUnavailable`](trajectory_core::MemoryError::RemoteUnavailable)
/// and malformed replies as
/// [`MemoryError::Decode`](trajectory_core::MemoryError::Decode). They never retry.
pub trait ListStore {
    /// Appends `values` to the list at `key` in one call and returns the new length.
    fn rpush(&self, key: &str, values: &[String]) -> Result<usize>;

    /// Returns the elements from `start` to `stop`, both inclusive.
    fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>>;

    /// Returns the length of the list, `0` if it does not exist.
    fn llen(&self, key: &str) -> Result<usize>;

    /// Returns the element at `index`, `None` if out of range.
    fn lindex(&self, key: &str, index: i64) -> Result<Option<String>>;

    /// Deletes the list.
    fn del(&self, key: &str) -> Result<()>;
}

/// Resolves Redis-style inclusive indices against a list of length `len`.
///
/// Out-of-range indices are clamped as Redis does; an empty range is returned
/// when `start` lands after `stop`.
pub(crate) fn resolve_range(start: i64, stop: i64, len: usize) -> std::ops::Range<usize> {
    let len = len as i64;
    let resolve = |ix: i64| if ix < 0 { len + ix } else { ix };
    let start = resolve(start).max(0);
    let stop = resolve(stop).min(len - 1);
    if start > stop {
        0..0
    } else {
        start as usize..stop as usize + 1
    }
}
