//! Memory interface for trajectory collection.
//!
//! A memory accumulates the records produced by an environment-interaction loop
//! and hands them back, as a whole or by range, to training routines. It is
//! appended to during rollout collection, read while training, and cleared
//! after each update so that it can be reused for the life of the process.

use super::record::RecordBatch;
use crate::Result;

/// Interface shared by all trajectory memories.
///
/// Every variant keeps its columns at the same length after every mutating
/// operation. Mutations are all-or-nothing: when an operation returns an
/// error, the memory is left as it was.
///
/// # Associated Types
///
/// * `Record` - What is written, one row of the columns
/// * `Item` - What indexed access returns; differs from `Record` when stored
///   data is converted on read
/// * `Batch` - Owned columns accepted by bulk writes
/// * `View` - Columns returned by bulk reads
///
/// # Examples
///
/// ```
/// use trajectory_core::{Memory, PolicyMemory, Transition, TransitionBatch};
///
/// # fn main() -> trajectory_core::Result<()> {
/// let mut memory = PolicyMemory::<Vec<f32>, Vec<f32>>::new();
/// memory.save_one(Transition::new(vec![0., 0.], vec![1.], 1.0, false, vec![1., 1.]))?;
/// assert_eq!(memory.len()?, 1);
///
/// let items = memory.get_all_items()?.to_batch();
/// memory.clear_memory()?;
/// memory.save_all(items)?;
/// assert_eq!(memory.len()?, 1);
/// # Ok(())
/// # }
/// ```
pub trait Memory {
    /// One record as written to the memory.
    type Record;

    /// One record as read from the memory.
    type Item;

    /// Owned columns of records.
    type Batch: RecordBatch<Record = Self::Record>;

    /// Columns returned by [`Memory::get_all_items`] and [`Memory::get_ranged_items`].
    ///
    /// In-process memories return borrowed slices; callers must treat them as
    /// read-only snapshots.
    type View<'a>
    where
        Self: 'a;

    /// Returns the number of stored records.
    fn len(&self) -> Result<usize>;

    /// Returns `true` if the memory holds no record.
    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Returns the record at `idx`.
    ///
    /// # Errors
    ///
    /// [`MemoryError::IndexOutOfRange`](crate::MemoryError::IndexOutOfRange)
    /// if `idx >= len`.
    fn get(&self, idx: usize) -> Result<Self::Item>;

    /// Appends a single record.
    fn save_one(&mut self, record: Self::Record) -> Result<()>;

    /// Appends records, preserving their relative order.
    ///
    /// # Errors
    ///
    /// [`MemoryError::Validation`](crate::MemoryError::Validation) if the
    /// columns differ in length or a row is malformed; nothing is written.
    fn save_all(&mut self, batch: Self::Batch) -> Result<()>;

    /// Discards the current contents and stores `batch` instead.
    fn replace_all(&mut self, batch: Self::Batch) -> Result<()>;

    /// Returns every column in insertion order.
    fn get_all_items(&self) -> Result<Self::View<'_>>;

    /// Returns the records in `[start, end]` (both inclusive), or in
    /// `[start, len)` if `end` is `None`.
    ///
    /// # Errors
    ///
    /// [`MemoryError::IndexOutOfRange`](crate::MemoryError::IndexOutOfRange)
    /// if `start > len`, `end < start` or `end >= len`.
    fn get_ranged_items(&self, start: usize, end: Option<usize>) -> Result<Self::View<'_>>;

    /// Removes every record. The memory stays usable.
    fn clear_memory(&mut self) -> Result<()>;
}
