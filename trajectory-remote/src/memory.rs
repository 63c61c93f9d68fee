//! Memory stored in a shared remote list.
use crate::{config::RemoteMemoryConfig, store::ListStore};
use log::{debug, info, trace, warn};
use serde::{de::DeserializeOwned, Serialize};
use std::marker::PhantomData;
use trajectory_core::{
    util::{checked_index, checked_range},
    Memory, MemoryError, Record, RecordBatch, Result, Shapes,
};

/// A [`Memory`] whose records live in a list of a [`ListStore`].
///
/// Each record is encoded as one JSON list element, so the columns of a record
/// stay together and the list length is the memory length. Several processes
/// or threads may append to the same list, each through its own handle.
///
/// `B` is the batch type of the in-process memory with the same records, e.g.
/// [`TransitionBatch`](trajectory_core::TransitionBatch). Bulk reads decode
/// the list into an owned `B`.
///
/// Each operation is a separate store call. In particular
/// [`Memory::replace_all`] deletes the list and then pushes the new records,
/// so a concurrent reader may observe the list empty in between.
pub struct RemoteMemory<B, L> {
    store: L,
    key: String,
    threshold: Option<usize>,
    shapes: Shapes,
    phantom: PhantomData<fn() -> B>,
}

impl<B, L> RemoteMemory<B, L>
where
    B: RecordBatch,
    B::Record: Serialize + DeserializeOwned,
    L: ListStore,
{
    /// Creates a memory on the list `key` of `store`, without threshold.
    pub fn new(store: L, key: impl Into<String>) -> Self {
        Self::build(&RemoteMemoryConfig::default().key(key), store)
    }

    /// Creates a memory from a configuration.
    pub fn build(config: &RemoteMemoryConfig, store: L) -> Self {
        Self {
            store,
            key: config.key.clone(),
            threshold: config.threshold,
            shapes: config.shapes.clone(),
            phantom: PhantomData,
        }
    }

    /// Returns the name of the shared list.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the store handle.
    pub fn store(&self) -> &L {
        &self.store
    }

    /// Returns `true` if the shared list holds at least `threshold` records.
    ///
    /// Writers sharing the list may all observe `true` for the same crossing.
    /// The consumer that trains on the records clears the memory afterwards.
    pub fn is_ready(&self) -> Result<bool> {
        let threshold = match self.threshold {
            None => return Ok(false),
            Some(threshold) => threshold,
        };
        let len = self.len()?;
        let ready = len >= threshold;
        if ready {
            info!(
                "Remote memory {} holds {} records (threshold {})",
                self.key, len, threshold
            );
        }
        Ok(ready)
    }

    /// Encodes a record, rejecting records that would not decode back.
    ///
    /// JSON has no NaN or infinity: `serde_json` writes them as `null`, which
    /// no `f32` field accepts on read.
    fn encode(record: &B::Record) -> Result<String> {
        let value =
            serde_json::to_string(record).map_err(|e| MemoryError::Validation(e.to_string()))?;
        if let Err(e) = serde_json::from_str::<B::Record>(&value) {
            return Err(MemoryError::Validation(format!(
                "record does not survive JSON encoding ({}), non-finite number?",
                e
            )));
        }
        Ok(value)
    }

    fn decode(value: &str) -> Result<B::Record> {
        serde_json::from_str(value).map_err(|e| MemoryError::Decode(e.to_string()))
    }

    fn decode_all(values: Vec<String>) -> Result<B> {
        let records = values
            .iter()
            .map(|v| Self::decode(v))
            .collect::<Result<Vec<_>>>()?;
        Ok(B::from_records(records))
    }

    /// Checks and encodes a batch before anything is sent.
    fn encode_batch(&self, batch: B) -> Result<Vec<String>> {
        if let Err(e) = batch.validate(&self.shapes) {
            warn!("Rejected batch for {}: {}", self.key, e);
            return Err(e);
        }
        let values = batch
            .into_records()
            .iter()
            .enumerate()
            .map(|(ix, record)| Self::encode(record).map_err(|e| e.at_record(ix)))
            .collect::<Result<Vec<_>>>();
        if let Err(e) = &values {
            warn!("Rejected batch for {}: {}", self.key, e);
        }
        values
    }
}

impl<B, L> Memory for RemoteMemory<B, L>
where
    B: RecordBatch,
    B::Record: Serialize + DeserializeOwned,
    L: ListStore,
{
    type Record = B::Record;
    type Item = B::Record;
    type Batch = B;
    type View<'a> = B where Self: 'a;

    fn len(&self) -> Result<usize> {
        self.store.llen(&self.key)
    }

    fn get(&self, idx: usize) -> Result<Self::Item> {
        let len = self.len()?;
        checked_index(idx, len)?;
        match self.store.lindex(&self.key, idx as i64)? {
            Some(value) => Self::decode(&value),
            // cleared by another handle since the length was read
            None => Err(MemoryError::IndexOutOfRange { index: idx, len: 0 }),
        }
    }

    fn save_one(&mut self, record: Self::Record) -> Result<()> {
        if let Err(e) = record.validate(&self.shapes) {
            warn!("Rejected record for {}: {}", self.key, e);
            return Err(e);
        }
        let value = match Self::encode(&record) {
            Ok(value) => value,
            Err(e) => {
                warn!("Rejected record for {}: {}", self.key, e);
                return Err(e);
            }
        };
        let len = self.store.rpush(&self.key, &[value])?;
        trace!("Pushed a record to {}, len = {}", self.key, len);
        Ok(())
    }

    fn save_all(&mut self, batch: Self::Batch) -> Result<()> {
        let values = self.encode_batch(batch)?;
        if values.is_empty() {
            return Ok(());
        }
        let len = self.store.rpush(&self.key, &values)?;
        debug!("Pushed {} records to {}, len = {}", values.len(), self.key, len);
        Ok(())
    }

    /// Deletes the shared list and pushes `batch` in its place.
    ///
    /// The batch is checked and encoded before anything is sent, so a
    /// rejected batch leaves the list untouched. The two store calls are not
    /// atomic: if the push fails after the delete, the error is returned with
    /// the list left empty and the caller has to push the records again.
    fn replace_all(&mut self, batch: Self::Batch) -> Result<()> {
        let values = self.encode_batch(batch)?;
        self.store.del(&self.key)?;
        if !values.is_empty() {
            self.store.rpush(&self.key, &values)?;
        }
        debug!("Replaced {} with {} records", self.key, values.len());
        Ok(())
    }

    fn get_all_items(&self) -> Result<Self::View<'_>> {
        Self::decode_all(self.store.lrange(&self.key, 0, -1)?)
    }

    fn get_ranged_items(&self, start: usize, end: Option<usize>) -> Result<Self::View<'_>> {
        let range = checked_range(start, end, self.len()?)?;
        if range.is_empty() {
            return Ok(B::default());
        }
        let values = self
            .store
            .lrange(&self.key, range.start as i64, range.end as i64 - 1)?;
        Self::decode_all(values)
    }

    fn clear_memory(&mut self) -> Result<()> {
        self.store.del(&self.key)?;
        debug!("Cleared {}", self.key);
        Ok(())
    }
}
