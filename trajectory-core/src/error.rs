//! Errors in the library.
use thiserror::Error;

/// Errors raised by memory operations.
///
/// Every operation surfaces these synchronously. A failed operation leaves the
/// memory as it was before the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    /// Malformed input, e.g. columns of different lengths or a record whose
    /// shape does not match the configured one.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Indexed or ranged access outside the stored transitions.
    #[error("Index {index} out of range for memory of length {len}")]
    IndexOutOfRange {
        /// The offending index.
        index: usize,

        /// Length of the memory when the access was attempted.
        len: usize,
    },

    /// The backing store failed to respond.
    #[error("Remote store unavailable: {0}")]
    RemoteUnavailable(String),

    /// A stored record could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl MemoryError {
    /// Prefixes a validation message with the position of the offending record.
    pub fn at_record(self, ix: usize) -> Self {
        match self {
            Self::Validation(msg) => Self::Validation(format!("record {}: {}", ix, msg)),
            e => e,
        }
    }
}

/// Result of memory operations.
pub type Result<T> = std::result::Result<T, MemoryError>;
