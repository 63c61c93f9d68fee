//! Memories of the auxiliary phases of phasic policy gradient.
//!
//! These drop actions, rewards and terminal flags: the auxiliary value phase
//! only replays states (and frames), the contrastive phase only frames. They
//! are filled from the output of a policy memory once its update is done.
use crate::{
    base::{check_len, check_shape},
    image::{to_tensor, ImageTensor, RawImage},
    util::{checked_index, checked_range, evict_front, n_evicted},
    Memory, MemoryConfig, Record, RecordBatch, Result, Shapes,
};
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A bounded, validated column backing the single-column memories.
#[derive(Debug, Clone)]
struct Column<T> {
    capacity: Option<usize>,
    shapes: Shapes,
    items: Vec<T>,
}

impl<T: Record> Column<T> {
    fn build(config: &MemoryConfig) -> Self {
        Self {
            capacity: config.capacity_as_usize(),
            shapes: config.shapes.clone(),
            items: vec![],
        }
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn evict(&mut self) {
        let n = n_evicted(self.items.len(), self.capacity);
        evict_front(&mut self.items, n);
    }

    fn save_one(&mut self, record: T) -> Result<()> {
        if let Err(e) = record.validate(&self.shapes) {
            warn!("Rejected record: {}", e);
            return Err(e);
        }
        self.items.push(record);
        self.evict();
        trace!("Saved a record, len = {}", self.items.len());
        Ok(())
    }

    fn save_all(&mut self, mut records: Vec<T>) -> Result<()> {
        let n = match records.validate(&self.shapes) {
            Ok(n) => n,
            Err(e) => {
                warn!("Rejected batch of records: {}", e);
                return Err(e);
            }
        };
        self.items.append(&mut records);
        self.evict();
        debug!("Saved {} records, len = {}", n, self.items.len());
        Ok(())
    }

    fn replace_all(&mut self, records: Vec<T>) -> Result<()> {
        let n = records.validate(&self.shapes)?;
        self.items = records;
        self.evict();
        debug!("Replaced contents with {} records", n);
        Ok(())
    }

    fn at(&self, idx: usize) -> Result<&T> {
        Ok(&self.items[checked_index(idx, self.items.len())?])
    }

    fn range(&self, start: usize, end: Option<usize>) -> Result<&[T]> {
        Ok(&self.items[checked_range(start, end, self.items.len())?])
    }

    fn clear(&mut self) {
        debug!("Clear {} records", self.items.len());
        self.items.clear();
    }
}

/// Memory of states replayed in the auxiliary value phase.
#[derive(Debug, Clone)]
pub struct AuxPpgMemory<S> {
    states: Column<S>,
}

impl<S: Record + Clone> Default for AuxPpgMemory<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Record + Clone> AuxPpgMemory<S> {
    /// Creates an unbounded memory without shape checks.
    pub fn new() -> Self {
        Self::build(&MemoryConfig::default())
    }

    /// Creates an empty memory with the given configuration.
    pub fn build(config: &MemoryConfig) -> Self {
        Self {
            states: Column::build(config),
        }
    }
}

impl<S: Record + Clone> Memory for AuxPpgMemory<S> {
    type Record = S;
    type Item = S;
    type Batch = Vec<S>;
    type View<'a> = &'a [S] where Self: 'a;

    fn len(&self) -> Result<usize> {
        Ok(self.states.len())
    }

    fn get(&self, idx: usize) -> Result<S> {
        self.states.at(idx).cloned()
    }

    fn save_one(&mut self, record: S) -> Result<()> {
        self.states.save_one(record)
    }

    fn save_all(&mut self, batch: Vec<S>) -> Result<()> {
        self.states.save_all(batch)
    }

    fn replace_all(&mut self, batch: Vec<S>) -> Result<()> {
        self.states.replace_all(batch)
    }

    fn get_all_items(&self) -> Result<&[S]> {
        Ok(&self.states.items)
    }

    fn get_ranged_items(&self, start: usize, end: Option<usize>) -> Result<&[S]> {
        self.states.range(start, end)
    }

    fn clear_memory(&mut self) -> Result<()> {
        self.states.clear();
        Ok(())
    }
}

/// Memory of raw frames replayed in the contrastive phase.
///
/// [`Memory::get`] converts the stored frame to `f32`.
#[derive(Debug, Clone)]
pub struct AuxClrMemory {
    images: Column<RawImage>,
}

impl Default for AuxClrMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl AuxClrMemory {
    /// Creates an unbounded memory without shape checks.
    pub fn new() -> Self {
        Self::build(&MemoryConfig::default())
    }

    /// Creates an empty memory with the given configuration.
    pub fn build(config: &MemoryConfig) -> Self {
        Self {
            images: Column::build(config),
        }
    }
}

impl Memory for AuxClrMemory {
    type Record = RawImage;
    type Item = ImageTensor;
    type Batch = Vec<RawImage>;
    type View<'a> = &'a [RawImage] where Self: 'a;

    fn len(&self) -> Result<usize> {
        Ok(self.images.len())
    }

    fn get(&self, idx: usize) -> Result<ImageTensor> {
        Ok(to_tensor(self.images.at(idx)?))
    }

    fn save_one(&mut self, record: RawImage) -> Result<()> {
        self.images.save_one(record)
    }

    fn save_all(&mut self, batch: Vec<RawImage>) -> Result<()> {
        self.images.save_all(batch)
    }

    fn replace_all(&mut self, batch: Vec<RawImage>) -> Result<()> {
        self.images.replace_all(batch)
    }

    fn get_all_items(&self) -> Result<&[RawImage]> {
        Ok(&self.images.items)
    }

    fn get_ranged_items(&self, start: usize, end: Option<usize>) -> Result<&[RawImage]> {
        self.images.range(start, end)
    }

    fn clear_memory(&mut self) -> Result<()> {
        self.images.clear();
        Ok(())
    }
}

/// A frame and the state observed with it.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ImageState<S> {
    /// Raw frame.
    pub image: RawImage,

    /// State.
    pub state: S,
}

impl<S> ImageState<S> {
    /// Creates a record.
    pub fn new(image: RawImage, state: S) -> Self {
        Self { image, state }
    }
}

impl<S: Record> Record for ImageState<S> {
    fn validate(&self, shapes: &Shapes) -> Result<()> {
        check_shape("image", shapes.image.as_ref(), self.image.shape())?;
        self.state.validate(shapes)
    }
}

/// [`ImageState`] with the frame converted to `f32`.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageStateAuxSample<S> {
    /// Converted frame.
    pub image: ImageTensor,

    /// State.
    pub state: S,
}

/// Owned columns of [`ImageState`]s.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ImageStateColumns<S> {
    /// Frames.
    pub images: Vec<RawImage>,

    /// States.
    pub states: Vec<S>,
}

impl<S> Default for ImageStateColumns<S> {
    fn default() -> Self {
        Self {
            images: vec![],
            states: vec![],
        }
    }
}

impl<S> ImageStateColumns<S> {
    /// Creates columns.
    pub fn new(images: Vec<RawImage>, states: Vec<S>) -> Self {
        Self { images, states }
    }
}

impl<S: Record> RecordBatch for ImageStateColumns<S> {
    type Record = ImageState<S>;

    fn len(&self) -> usize {
        self.images.len()
    }

    fn validate(&self, shapes: &Shapes) -> Result<usize> {
        let len = self.images.len();
        check_len("states", self.states.len(), len)?;
        for (ix, (image, state)) in self.images.iter().zip(&self.states).enumerate() {
            check_shape("image", shapes.image.as_ref(), image.shape())
                .and_then(|_| state.validate(shapes))
                .map_err(|e| e.at_record(ix))?;
        }
        Ok(len)
    }

    fn push(&mut self, record: ImageState<S>) {
        self.images.push(record.image);
        self.states.push(record.state);
    }

    fn into_records(self) -> Vec<ImageState<S>> {
        self.images
            .into_iter()
            .zip(self.states)
            .map(|(image, state)| ImageState::new(image, state))
            .collect()
    }
}

/// Borrowed columns of an [`ImageStateAuxPpgMemory`].
#[derive(Debug, PartialEq)]
pub struct ImageStateColumnsView<'a, S> {
    /// Frames.
    pub images: &'a [RawImage],

    /// States.
    pub states: &'a [S],
}

impl<'a, S: Clone> ImageStateColumnsView<'a, S> {
    /// Returns the number of records in the view.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Returns `true` if the view is empty.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Copies the view into owned columns.
    pub fn to_batch(&self) -> ImageStateColumns<S> {
        ImageStateColumns::new(self.images.to_vec(), self.states.to_vec())
    }
}

/// Memory of frames and states replayed in the auxiliary value phase of
/// image-state agents.
#[derive(Debug, Clone)]
pub struct ImageStateAuxPpgMemory<S> {
    capacity: Option<usize>,
    shapes: Shapes,
    images: Vec<RawImage>,
    states: Vec<S>,
}

impl<S: Record + Clone> Default for ImageStateAuxPpgMemory<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Record + Clone> ImageStateAuxPpgMemory<S> {
    /// Creates an unbounded memory without shape checks.
    pub fn new() -> Self {
        Self::build(&MemoryConfig::default())
    }

    /// Creates an empty memory with the given configuration.
    pub fn build(config: &MemoryConfig) -> Self {
        Self {
            capacity: config.capacity_as_usize(),
            shapes: config.shapes.clone(),
            images: vec![],
            states: vec![],
        }
    }

    fn evict(&mut self) {
        let n = n_evicted(self.images.len(), self.capacity);
        if n > 0 {
            trace!("Evict {} oldest image-state records", n);
        }
        evict_front(&mut self.images, n);
        evict_front(&mut self.states, n);
    }

    fn view(&self, range: Range<usize>) -> ImageStateColumnsView<'_, S> {
        ImageStateColumnsView {
            images: &self.images[range.clone()],
            states: &self.states[range],
        }
    }
}

impl<S: Record + Clone> Memory for ImageStateAuxPpgMemory<S> {
    type Record = ImageState<S>;
    type Item = ImageStateAuxSample<S>;
    type Batch = ImageStateColumns<S>;
    type View<'a> = ImageStateColumnsView<'a, S> where Self: 'a;

    fn len(&self) -> Result<usize> {
        Ok(self.images.len())
    }

    fn get(&self, idx: usize) -> Result<Self::Item> {
        let ix = checked_index(idx, self.images.len())?;
        Ok(ImageStateAuxSample {
            image: to_tensor(&self.images[ix]),
            state: self.states[ix].clone(),
        })
    }

    fn save_one(&mut self, record: ImageState<S>) -> Result<()> {
        if let Err(e) = record.validate(&self.shapes) {
            warn!("Rejected image-state record: {}", e);
            return Err(e);
        }
        self.images.push(record.image);
        self.states.push(record.state);
        self.evict();
        trace!("Saved an image-state record, len = {}", self.images.len());
        Ok(())
    }

    fn save_all(&mut self, batch: ImageStateColumns<S>) -> Result<()> {
        let n = match batch.validate(&self.shapes) {
            Ok(n) => n,
            Err(e) => {
                warn!("Rejected batch of image-state records: {}", e);
                return Err(e);
            }
        };
        let ImageStateColumns {
            mut images,
            mut states,
        } = batch;
        self.images.append(&mut images);
        self.states.append(&mut states);
        self.evict();
        debug!("Saved {} image-state records, len = {}", n, self.images.len());
        Ok(())
    }

    fn replace_all(&mut self, batch: ImageStateColumns<S>) -> Result<()> {
        let n = batch.validate(&self.shapes)?;
        self.images = batch.images;
        self.states = batch.states;
        self.evict();
        debug!("Replaced contents with {} image-state records", n);
        Ok(())
    }

    fn get_all_items(&self) -> Result<Self::View<'_>> {
        Ok(self.view(0..self.images.len()))
    }

    fn get_ranged_items(&self, start: usize, end: Option<usize>) -> Result<Self::View<'_>> {
        let range = checked_range(start, end, self.images.len())?;
        Ok(self.view(range))
    }

    fn clear_memory(&mut self) -> Result<()> {
        debug!("Clear {} image-state records", self.images.len());
        self.images.clear();
        self.states.clear();
        Ok(())
    }
}
