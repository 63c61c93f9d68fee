//! Shapes of the values stored in a memory.
use crate::{error::MemoryError, Result};
use ndarray::ArrayD;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// A state or action value held by a memory.
///
/// The shape is used to reject malformed records before anything is written.
/// Scalars have the empty shape `[]`.
pub trait Feature: Clone + Debug {
    /// Returns the shape of the value.
    fn shape(&self) -> Vec<usize>;
}

macro_rules! impl_vec_feature {
    ($($t:ty),+) => {
        $(
            impl Feature for Vec<$t> {
                fn shape(&self) -> Vec<usize> {
                    vec![self.len()]
                }
            }
        )+
    };
}

impl_vec_feature!(f32, f64, i64);

impl Feature for f32 {
    fn shape(&self) -> Vec<usize> {
        vec![]
    }
}

impl Feature for i64 {
    fn shape(&self) -> Vec<usize> {
        vec![]
    }
}

impl Feature for ArrayD<f32> {
    fn shape(&self) -> Vec<usize> {
        self.shape().to_vec()
    }
}

/// Expected shapes of the columns of a memory.
///
/// `None` disables the check for that column. Next states and next images are
/// always required to share the shape of the state and the image of the same
/// record, whether or not a shape is configured.
#[derive(Debug, Default, Deserialize, Serialize, PartialEq, Eq, Clone)]
pub struct Shapes {
    /// Shape of states.
    pub state: Option<Vec<usize>>,

    /// Shape of actions.
    pub action: Option<Vec<usize>>,

    /// Shape of raw images.
    pub image: Option<Vec<usize>>,
}

/// Fails with [`MemoryError::Validation`] if `actual` differs from `expected`.
pub(crate) fn check_shape(column: &str, expected: Option<&Vec<usize>>, actual: &[usize]) -> Result<()> {
    match expected {
        Some(expected) if expected.as_slice() != actual => Err(MemoryError::Validation(format!(
            "{}: expected shape {:?}, got {:?}",
            column, expected, actual
        ))),
        _ => Ok(()),
    }
}

/// Fails with [`MemoryError::Validation`] if `next` does not share the shape of `current`.
pub(crate) fn check_same_shape(column: &str, current: &[usize], next: &[usize]) -> Result<()> {
    if current != next {
        return Err(MemoryError::Validation(format!(
            "{}: shape {:?} differs from the current one {:?}",
            column, next, current
        )));
    }
    Ok(())
}

/// Fails with [`MemoryError::Validation`] if a column is not `len` long.
pub(crate) fn check_len(column: &str, actual: usize, len: usize) -> Result<()> {
    if actual != len {
        return Err(MemoryError::Validation(format!(
            "{} has {} entries, expected {}",
            column, actual, len
        )));
    }
    Ok(())
}
