//! Records and column batches.
use super::feature::{check_shape, Feature, Shapes};
use crate::Result;
use ndarray::ArrayD;

/// A single entry of a memory, e.g. one environment step.
pub trait Record {
    /// Checks the record against the expected shapes.
    ///
    /// Returns [`MemoryError::Validation`](crate::MemoryError::Validation) for
    /// malformed records.
    fn validate(&self, shapes: &Shapes) -> Result<()>;
}

/// Parallel columns holding a sequence of records.
///
/// This is the owned form that `save_all` takes and that a memory can hand
/// back. All columns must have the same length, which [`RecordBatch::validate`]
/// checks before a memory accepts the batch.
pub trait RecordBatch: Default {
    /// The record one row of the columns corresponds to.
    type Record: Record;

    /// Returns the number of records, taken from the canonical column.
    fn len(&self) -> usize;

    /// Returns `true` if the batch holds no record.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks that every column has the same length and every row is well-formed.
    ///
    /// Returns the common length.
    fn validate(&self, shapes: &Shapes) -> Result<usize>;

    /// Appends a record to the columns.
    fn push(&mut self, record: Self::Record);

    /// Splits the columns into records, in order.
    fn into_records(self) -> Vec<Self::Record>;

    /// Builds columns from records, in order.
    fn from_records(records: Vec<Self::Record>) -> Self {
        let mut batch = Self::default();
        for record in records {
            batch.push(record);
        }
        batch
    }
}

macro_rules! impl_state_record {
    ($($t:ty),+) => {
        $(
            impl Record for $t {
                fn validate(&self, shapes: &Shapes) -> Result<()> {
                    check_shape("state", shapes.state.as_ref(), &Feature::shape(self))
                }
            }
        )+
    };
}

// A bare state is the record of the auxiliary memories.
impl_state_record!(Vec<f32>, Vec<f64>, Vec<i64>, ArrayD<f32>);

// A bare raw image is the record of the contrastive memory.
impl Record for ArrayD<u8> {
    fn validate(&self, shapes: &Shapes) -> Result<()> {
        check_shape("image", shapes.image.as_ref(), self.shape())
    }
}

impl<T: Record> RecordBatch for Vec<T> {
    type Record = T;

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn validate(&self, shapes: &Shapes) -> Result<usize> {
        for (ix, record) in self.iter().enumerate() {
            record.validate(shapes).map_err(|e| e.at_record(ix))?;
        }
        Ok(Vec::len(self))
    }

    fn push(&mut self, record: T) {
        Vec::push(self, record)
    }

    fn into_records(self) -> Vec<T> {
        self
    }

    fn from_records(records: Vec<T>) -> Self {
        records
    }
}
