//! Configurations of the remote memory and the Webdis store.
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};
use trajectory_core::Shapes;

/// Configuration of [`RemoteMemory`](crate::RemoteMemory).
///
/// # Fields
///
/// * `key` - Name of the shared list
/// * `threshold` - Length at which [`RemoteMemory::is_ready`](crate::RemoteMemory::is_ready)
///   turns `true`; `None` to never report readiness
/// * `shapes` - Expected shapes checked before records are pushed
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone)]
pub struct RemoteMemoryConfig {
    /// Name of the shared list.
    pub key: String,

    /// Number of stored records that triggers an update.
    pub threshold: Option<usize>,

    /// Expected shapes of the stored values.
    #[serde(default)]
    pub shapes: Shapes,
}

impl Default for RemoteMemoryConfig {
    fn default() -> Self {
        Self {
            key: "trajectories".to_string(),
            threshold: None,
            shapes: Shapes::default(),
        }
    }
}

impl RemoteMemoryConfig {
    /// Sets the name of the shared list.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Sets the update threshold.
    pub fn threshold(mut self, threshold: Option<usize>) -> Self {
        self.threshold = threshold;
        self
    }

    /// Sets the expected shapes.
    pub fn shapes(mut self, shapes: Shapes) -> Self {
        self.shapes = shapes;
        self
    }

    /// Loads the configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves the configuration to a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Configuration of [`WebdisListStore`](crate::WebdisListStore).
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone)]
pub struct WebdisConfig {
    /// Base URL of the Webdis endpoint.
    pub base_url: String,

    /// Timeout of each request in seconds.
    pub timeout_secs: u64,
}

impl Default for WebdisConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:7379".to_string(),
            timeout_secs: 10,
        }
    }
}

impl WebdisConfig {
    /// Sets the base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the request timeout.
    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Loads the configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves the configuration to a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
