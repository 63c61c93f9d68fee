#![warn(missing_docs)]
//! Trajectory memories for policy-optimization agents.
//!
//! A memory accumulates the transitions produced by an environment-interaction
//! loop, hands them back as a whole or by range to training routines, and is
//! cleared after each update. Every memory keeps its parallel columns at the
//! same length after every mutating operation; a failed operation leaves the
//! memory untouched.
//!
//! # Memories
//!
//! * [`PolicyMemory`] - states, actions, rewards, terminal flags, next states
//! * [`ImageStatePolicyMemory`] - [`PolicyMemory`] plus raw frames
//! * [`MaskedPolicyMemory`] - [`PolicyMemory`] plus legal action indices
//! * [`AuxPpgMemory`], [`ImageStateAuxPpgMemory`], [`AuxClrMemory`] - states
//!   and/or frames replayed in the auxiliary phases of phasic policy gradient
//!
//! All of them implement [`Memory`]. A memory shared between processes is
//! provided by the `trajectory-remote` crate.
//!
//! # Basic Usage
//!
//! ```rust
//! use trajectory_core::{Memory, PolicyMemory, Transition};
//!
//! # fn main() -> trajectory_core::Result<()> {
//! let mut memory = PolicyMemory::<Vec<f32>, Vec<f32>>::new();
//! for i in 0..3 {
//!     let x = i as f32;
//!     memory.save_one(Transition::new(vec![x, x], vec![1.], 1.0, false, vec![x + 1., x + 1.]))?;
//! }
//! assert_eq!(memory.len()?, 3);
//!
//! let items = memory.get_all_items()?;
//! assert_eq!(items.states[2], vec![2., 2.]);
//!
//! memory.clear_memory()?;
//! assert_eq!(memory.len()?, 0);
//! # Ok(())
//! # }
//! ```
pub mod error;
pub mod image;
pub mod util;

mod base;
pub use base::{Feature, Memory, Record, RecordBatch, Shapes};

mod config;
pub use config::MemoryConfig;

pub use error::{MemoryError, Result};

mod transition;
pub use transition::{Transition, TransitionBatch, TransitionView};

mod policy_memory;
pub use policy_memory::PolicyMemory;

mod image_state;
pub use image_state::{
    ImageStateBatch, ImageStatePolicyMemory, ImageStateSample, ImageStateTransition,
    ImageStateView,
};

mod masked;
pub use masked::{MaskedBatch, MaskedPolicyMemory, MaskedTransition, MaskedView};

mod auxiliary;
pub use auxiliary::{
    AuxClrMemory, AuxPpgMemory, ImageState, ImageStateAuxPpgMemory, ImageStateAuxSample,
    ImageStateColumns, ImageStateColumnsView,
};

mod loader;
pub use loader::{MiniBatchLoader, MiniBatchLoaderConfig, MiniBatches};
