//! Mini-batch iteration over a memory.
//!
//! The memory itself holds no random state. Shuffling belongs here, to the
//! consumer, and is driven by an explicit seed so that epochs are reproducible.
use crate::{Memory, MemoryError, Result};
use anyhow::Result as AnyResult;
use log::trace;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`MiniBatchLoader`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone)]
pub struct MiniBatchLoaderConfig {
    /// Number of records per mini-batch.
    pub batch_size: usize,

    /// Reshuffle the records at the start of every epoch.
    pub shuffle: bool,

    /// Skip the last mini-batch if it is smaller than `batch_size`.
    pub drop_last: bool,

    /// Seed of the random number generator used for shuffling.
    pub seed: u64,
}

impl Default for MiniBatchLoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: 32,
            shuffle: false,
            drop_last: false,
            seed: 42,
        }
    }
}

impl MiniBatchLoaderConfig {
    /// Sets the mini-batch size.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Enables or disables reshuffling.
    pub fn shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Enables or disables dropping the last partial mini-batch.
    pub fn drop_last(mut self, drop_last: bool) -> Self {
        self.drop_last = drop_last;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Loads the configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> AnyResult<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves the configuration to a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> AnyResult<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Splits a memory into mini-batches, epoch after epoch.
///
/// # Examples
///
/// ```
/// use trajectory_core::{Memory, MiniBatchLoader, MiniBatchLoaderConfig, PolicyMemory, Transition};
///
/// # fn main() -> trajectory_core::Result<()> {
/// let mut memory = PolicyMemory::<Vec<f32>, i64>::new();
/// for i in 0..10 {
///     memory.save_one(Transition::new(vec![i as f32], 0, 0.0, false, vec![0.0]))?;
/// }
///
/// let config = MiniBatchLoaderConfig::default().batch_size(4).shuffle(true).seed(1);
/// let mut loader = MiniBatchLoader::build(&config)?;
/// for _epoch in 0..3 {
///     for batch in loader.epoch(&memory)? {
///         let batch = batch?;
///         assert!(batch.len() <= 4);
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct MiniBatchLoader {
    config: MiniBatchLoaderConfig,
    rng: StdRng,
}

impl MiniBatchLoader {
    /// Creates a loader.
    ///
    /// # Errors
    ///
    /// [`MemoryError::Validation`] if `batch_size` is zero.
    pub fn build(config: &MiniBatchLoaderConfig) -> Result<Self> {
        if config.batch_size == 0 {
            return Err(MemoryError::Validation(
                "batch_size must be positive".to_string(),
            ));
        }
        Ok(Self {
            config: config.clone(),
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    /// Returns the indices of each mini-batch of one epoch over `len` records.
    ///
    /// With shuffling enabled, every call draws a new permutation.
    pub fn index_batches(&mut self, len: usize) -> Vec<Vec<usize>> {
        let mut ixs = (0..len).collect::<Vec<_>>();
        if self.config.shuffle {
            ixs.shuffle(&mut self.rng);
        }
        let batch_size = self.config.batch_size;
        ixs.chunks(batch_size)
            .filter(|chunk| !self.config.drop_last || chunk.len() == batch_size)
            .map(|chunk| chunk.to_vec())
            .collect()
    }

    /// Starts an epoch over `memory`.
    ///
    /// The memory must not be mutated until the returned iterator is dropped.
    pub fn epoch<'a, M: Memory>(&mut self, memory: &'a M) -> Result<MiniBatches<'a, M>> {
        let len = memory.len()?;
        let batches = self.index_batches(len);
        trace!("Epoch of {} mini-batches over {} records", batches.len(), len);
        Ok(MiniBatches {
            memory,
            batches: batches.into_iter(),
        })
    }
}

/// Mini-batches of one epoch, see [`MiniBatchLoader::epoch`].
pub struct MiniBatches<'a, M: Memory> {
    memory: &'a M,
    batches: std::vec::IntoIter<Vec<usize>>,
}

impl<'a, M: Memory> Iterator for MiniBatches<'a, M> {
    type Item = Result<Vec<M::Item>>;

    fn next(&mut self) -> Option<Self::Item> {
        let ixs = self.batches.next()?;
        Some(ixs.into_iter().map(|ix| self.memory.get(ix)).collect())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.batches.size_hint()
    }
}
