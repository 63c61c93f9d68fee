#![warn(missing_docs)]
//! Trajectory memory shared between processes through a remote list.
//!
//! Several collectors append their transitions to the same list while a
//! trainer waits for the list to reach a threshold, drains it into an
//! in-process memory and clears it. [`RemoteMemory`] implements
//! [`Memory`](trajectory_core::Memory) on top of any [`ListStore`]:
//!
//! * [`WebdisListStore`] - Redis reached through a Webdis HTTP endpoint
//! * [`SharedListStore`] - lists held in the current process, shared by threads
//!
//! ```rust
//! use trajectory_core::{Memory, Transition, TransitionBatch};
//! use trajectory_remote::{RemoteMemory, RemoteMemoryConfig, SharedListStore};
//!
//! # fn main() -> trajectory_core::Result<()> {
//! let store = SharedListStore::new();
//! let config = RemoteMemoryConfig::default().key("rollouts").threshold(Some(2));
//!
//! let mut collector =
//!     RemoteMemory::<TransitionBatch<Vec<f32>, i64>, _>::build(&config, store.clone());
//! let trainer = RemoteMemory::<TransitionBatch<Vec<f32>, i64>, _>::build(&config, store);
//!
//! collector.save_one(Transition::new(vec![0.0], 1, 0.5, false, vec![1.0]))?;
//! assert!(!trainer.is_ready()?);
//! collector.save_one(Transition::new(vec![1.0], 0, 1.0, true, vec![2.0]))?;
//! assert!(trainer.is_ready()?);
//!
//! let batch = trainer.get_all_items()?;
//! assert_eq!(batch.rewards, vec![0.5, 1.0]);
//! # Ok(())
//! # }
//! ```
mod config;
mod memory;
mod shared;
mod store;
mod webdis;

pub use config::{RemoteMemoryConfig, WebdisConfig};
pub use memory::RemoteMemory;
pub use shared::SharedListStore;
pub use store::ListStore;
pub use webdis::WebdisListStore;
