//! Configuration of in-process memories.
use crate::Shapes;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    num::NonZeroUsize,
    path::Path,
};

/// Configuration shared by the in-process memories.
///
/// # Fields
///
/// * `capacity` - Maximum number of records; `None` for an unbounded memory
/// * `shapes` - Expected shapes of states, actions and images
///
/// # Examples
///
/// ```rust
/// use std::num::NonZeroUsize;
/// use trajectory_core::MemoryConfig;
///
/// // Off-policy memory keeping the latest 102400 transitions
/// let config = MemoryConfig::default()
///     .capacity(NonZeroUsize::new(102400))
///     .state_shape(vec![24])
///     .action_shape(vec![4]);
/// ```
#[derive(Debug, Default, Deserialize, Serialize, PartialEq, Eq, Clone)]
pub struct MemoryConfig {
    /// Maximum number of records that can be stored.
    /// When the memory is full, new records evict the oldest ones.
    pub capacity: Option<NonZeroUsize>,

    /// Expected shapes of the stored values.
    #[serde(default)]
    pub shapes: Shapes,
}

impl MemoryConfig {
    /// Sets the capacity of the memory.
    pub fn capacity(mut self, capacity: Option<NonZeroUsize>) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the expected shape of states.
    pub fn state_shape(mut self, shape: Vec<usize>) -> Self {
        self.shapes.state = Some(shape);
        self
    }

    /// Sets the expected shape of actions.
    pub fn action_shape(mut self, shape: Vec<usize>) -> Self {
        self.shapes.action = Some(shape);
        self
    }

    /// Sets the expected shape of raw images.
    pub fn image_shape(mut self, shape: Vec<usize>) -> Self {
        self.shapes.image = Some(shape);
        self
    }

    /// Loads the configuration from a YAML file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves the configuration to a YAML file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path where the configuration should be saved
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }

    pub(crate) fn capacity_as_usize(&self) -> Option<usize> {
        self.capacity.map(NonZeroUsize::get)
    }
}
