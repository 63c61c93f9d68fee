//! Core interfaces.
mod feature;
mod memory;
mod record;
pub(crate) use feature::{check_len, check_same_shape, check_shape};
pub use feature::{Feature, Shapes};
pub use memory::Memory;
pub use record::{Record, RecordBatch};
