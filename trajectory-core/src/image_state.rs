//! Memory of transitions paired with camera frames.
use crate::{
    base::{check_len, check_same_shape, check_shape},
    image::{to_tensor, ImageTensor, RawImage},
    util::{checked_index, checked_range, evict_front},
    Feature, Memory, MemoryConfig, PolicyMemory, Record, RecordBatch, Result, Shapes,
    Transition, TransitionBatch, TransitionView,
};
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A transition with the frames observed at `s_t` and `s_t+1`.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ImageStateTransition<S, A> {
    /// Frame observed with the state.
    pub image: RawImage,

    /// The transition.
    pub transition: Transition<S, A>,

    /// Frame observed with the next state.
    pub next_image: RawImage,
}

impl<S, A> ImageStateTransition<S, A> {
    /// Creates a record.
    pub fn new(image: RawImage, transition: Transition<S, A>, next_image: RawImage) -> Self {
        Self {
            image,
            transition,
            next_image,
        }
    }
}

fn validate_images(image: &RawImage, next_image: &RawImage, shapes: &Shapes) -> Result<()> {
    check_shape("image", shapes.image.as_ref(), image.shape())?;
    check_same_shape("next_image", image.shape(), next_image.shape())
}

impl<S: Feature, A: Feature> Record for ImageStateTransition<S, A> {
    fn validate(&self, shapes: &Shapes) -> Result<()> {
        self.transition.validate(shapes)?;
        validate_images(&self.image, &self.next_image, shapes)
    }
}

/// A record as returned by [`ImageStatePolicyMemory::get`](Memory::get), with
/// frames converted to `f32`.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageStateSample<S, A> {
    /// Frame observed with the state.
    pub image: ImageTensor,

    /// The transition.
    pub transition: Transition<S, A>,

    /// Frame observed with the next state.
    pub next_image: ImageTensor,
}

/// Owned columns of [`ImageStateTransition`]s.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ImageStateBatch<S, A> {
    /// Frames observed with the states.
    pub images: Vec<RawImage>,

    /// Transition columns.
    pub transitions: TransitionBatch<S, A>,

    /// Frames observed with the next states.
    pub next_images: Vec<RawImage>,
}

impl<S, A> Default for ImageStateBatch<S, A> {
    fn default() -> Self {
        Self {
            images: vec![],
            transitions: TransitionBatch::default(),
            next_images: vec![],
        }
    }
}

impl<S, A> ImageStateBatch<S, A> {
    /// Creates a batch from its columns.
    pub fn new(
        images: Vec<RawImage>,
        transitions: TransitionBatch<S, A>,
        next_images: Vec<RawImage>,
    ) -> Self {
        Self {
            images,
            transitions,
            next_images,
        }
    }
}

impl<S: Feature, A: Feature> RecordBatch for ImageStateBatch<S, A> {
    type Record = ImageStateTransition<S, A>;

    fn len(&self) -> usize {
        self.transitions.len()
    }

    fn validate(&self, shapes: &Shapes) -> Result<usize> {
        let len = self.transitions.validate(shapes)?;
        check_len("images", self.images.len(), len)?;
        check_len("next_images", self.next_images.len(), len)?;
        for (ix, (image, next_image)) in self.images.iter().zip(&self.next_images).enumerate() {
            validate_images(image, next_image, shapes).map_err(|e| e.at_record(ix))?;
        }
        Ok(len)
    }

    fn push(&mut self, record: Self::Record) {
        self.images.push(record.image);
        self.transitions.push(record.transition);
        self.next_images.push(record.next_image);
    }

    fn into_records(self) -> Vec<Self::Record> {
        self.images
            .into_iter()
            .zip(self.transitions.into_records())
            .zip(self.next_images)
            .map(|((image, transition), next_image)| {
                ImageStateTransition::new(image, transition, next_image)
            })
            .collect()
    }
}

/// Borrowed columns of an [`ImageStatePolicyMemory`].
#[derive(Debug, PartialEq)]
pub struct ImageStateView<'a, S, A> {
    /// Frames observed with the states.
    pub images: &'a [RawImage],

    /// Transition columns.
    pub transitions: TransitionView<'a, S, A>,

    /// Frames observed with the next states.
    pub next_images: &'a [RawImage],
}

impl<'a, S: Clone, A: Clone> ImageStateView<'a, S, A> {
    /// Returns the number of records in the view.
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Returns `true` if the view is empty.
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Copies the view into owned columns.
    pub fn to_batch(&self) -> ImageStateBatch<S, A> {
        ImageStateBatch {
            images: self.images.to_vec(),
            transitions: self.transitions.to_batch(),
            next_images: self.next_images.to_vec(),
        }
    }
}

/// A [`PolicyMemory`] with two more columns holding raw frames.
///
/// Used by agents whose observation is a camera frame plus a state vector,
/// e.g. in a driving simulator. Frames are stored as raw `u8` pixels and
/// converted to `f32` by [`Memory::get`].
#[derive(Debug, Clone)]
pub struct ImageStatePolicyMemory<S, A> {
    base: PolicyMemory<S, A>,
    images: Vec<RawImage>,
    next_images: Vec<RawImage>,
}

impl<S: Feature, A: Feature> Default for ImageStatePolicyMemory<S, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Feature, A: Feature> ImageStatePolicyMemory<S, A> {
    /// Creates an unbounded memory without shape checks.
    pub fn new() -> Self {
        Self::build(&MemoryConfig::default())
    }

    /// Creates an empty memory with the given configuration.
    pub fn build(config: &MemoryConfig) -> Self {
        Self {
            base: PolicyMemory::build(config),
            images: vec![],
            next_images: vec![],
        }
    }

    fn evict(&mut self, n: usize) {
        evict_front(&mut self.images, n);
        evict_front(&mut self.next_images, n);
    }

    fn append_unchecked(&mut self, batch: ImageStateBatch<S, A>) {
        let ImageStateBatch {
            mut images,
            transitions,
            mut next_images,
        } = batch;
        let n = self.base.append_unchecked(transitions);
        self.images.append(&mut images);
        self.next_images.append(&mut next_images);
        self.evict(n);
    }

    fn view(&self, range: Range<usize>) -> ImageStateView<'_, S, A> {
        ImageStateView {
            images: &self.images[range.clone()],
            transitions: self.base.view(range.clone()),
            next_images: &self.next_images[range],
        }
    }
}

impl<S: Feature, A: Feature> Memory for ImageStatePolicyMemory<S, A> {
    type Record = ImageStateTransition<S, A>;
    type Item = ImageStateSample<S, A>;
    type Batch = ImageStateBatch<S, A>;
    type View<'a> = ImageStateView<'a, S, A> where Self: 'a;

    fn len(&self) -> Result<usize> {
        Ok(self.base.n_transitions())
    }

    fn get(&self, idx: usize) -> Result<Self::Item> {
        let ix = checked_index(idx, self.base.n_transitions())?;
        Ok(ImageStateSample {
            image: to_tensor(&self.images[ix]),
            transition: self.base.transition(ix),
            next_image: to_tensor(&self.next_images[ix]),
        })
    }

    fn save_one(&mut self, record: Self::Record) -> Result<()> {
        if let Err(e) = record.validate(self.base.shapes()) {
            warn!("Rejected image-state transition: {}", e);
            return Err(e);
        }
        let ImageStateTransition {
            image,
            transition,
            next_image,
        } = record;
        let n = self.base.push_unchecked(transition);
        self.images.push(image);
        self.next_images.push(next_image);
        self.evict(n);
        trace!("Saved an image-state transition, len = {}", self.base.n_transitions());
        Ok(())
    }

    fn save_all(&mut self, batch: Self::Batch) -> Result<()> {
        let n = match batch.validate(self.base.shapes()) {
            Ok(n) => n,
            Err(e) => {
                warn!("Rejected batch of image-state transitions: {}", e);
                return Err(e);
            }
        };
        self.append_unchecked(batch);
        debug!("Saved {} image-state transitions", n);
        Ok(())
    }

    fn replace_all(&mut self, batch: Self::Batch) -> Result<()> {
        let n = batch.validate(self.base.shapes())?;
        self.clear_memory()?;
        self.append_unchecked(batch);
        debug!("Replaced contents with {} image-state transitions", n);
        Ok(())
    }

    fn get_all_items(&self) -> Result<Self::View<'_>> {
        Ok(self.view(0..self.base.n_transitions()))
    }

    fn get_ranged_items(&self, start: usize, end: Option<usize>) -> Result<Self::View<'_>> {
        let range = checked_range(start, end, self.base.n_transitions())?;
        Ok(self.view(range))
    }

    fn clear_memory(&mut self) -> Result<()> {
        self.base.clear_memory()?;
        self.images.clear();
        self.next_images.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryError;
    use ndarray::IxDyn;
    use std::num::NonZeroUsize;

    type Mem = ImageStatePolicyMemory<Vec<f32>, Vec<f32>>;

    fn frame(v: u8) -> RawImage {
        RawImage::from_elem(IxDyn(&[2, 2, 3]), v)
    }

    fn record(i: usize) -> ImageStateTransition<Vec<f32>, Vec<f32>> {
        let x = i as f32;
        ImageStateTransition::new(
            frame(i as u8),
            Transition::new(vec![x], vec![x], x, false, vec![x + 1.]),
            frame(i as u8 + 1),
        )
    }

    #[test]
    fn test_get_converts_frames() -> Result<()> {
        let mut memory = Mem::new();
        memory.save_one(record(7))?;

        let sample = memory.get(0)?;
        assert_eq!(sample.image.shape(), &[2, 2, 3]);
        assert!(sample.image.iter().all(|&p| p == 7.));
        assert!(sample.next_image.iter().all(|&p| p == 8.));
        assert_eq!(sample.transition.reward, 7.);

        // stored frames stay raw
        let items = memory.get_all_items()?;
        assert_eq!(items.images[0], frame(7));
        Ok(())
    }

    #[test]
    fn test_save_all_and_range() -> Result<()> {
        let mut memory = Mem::new();
        memory.save_all(ImageStateBatch::from_records((0..5).map(record).collect()))?;
        assert_eq!(memory.len()?, 5);

        let items = memory.get_ranged_items(3, None)?;
        assert_eq!(items.len(), 2);
        assert_eq!(items.images.len(), 2);
        assert_eq!(items.next_images[1], frame(5));
        assert_eq!(items.transitions.rewards, &[3., 4.]);
        Ok(())
    }

    #[test]
    fn test_missing_frame_is_rejected() -> Result<()> {
        let mut memory = Mem::new();
        memory.save_one(record(0))?;

        let mut batch = ImageStateBatch::from_records((1..4).map(record).collect());
        batch.next_images.pop();
        assert!(matches!(
            memory.save_all(batch),
            Err(MemoryError::Validation(_))
        ));
        assert_eq!(memory.len()?, 1);
        assert_eq!(memory.get_all_items()?.images.len(), 1);
        Ok(())
    }

    #[test]
    fn test_image_shape_is_checked() {
        let config = MemoryConfig::default().image_shape(vec![2, 2, 3]);
        let mut memory = Mem::build(&config);
        assert!(memory.save_one(record(0)).is_ok());

        let mut bad = record(1);
        bad.image = RawImage::zeros(IxDyn(&[4, 4, 3]));
        bad.next_image = RawImage::zeros(IxDyn(&[4, 4, 3]));
        assert!(memory.save_one(bad).is_err());
        assert_eq!(memory.len().unwrap(), 1);
    }

    #[test]
    fn test_capacity_evicts_frames_too() -> Result<()> {
        let config = MemoryConfig::default().capacity(NonZeroUsize::new(2));
        let mut memory = Mem::build(&config);
        for i in 0..4 {
            memory.save_one(record(i))?;
        }
        let items = memory.get_all_items()?;
        assert_eq!(items.images, &[frame(2), frame(3)]);
        assert_eq!(items.transitions.rewards, &[2., 3.]);
        Ok(())
    }

    #[test]
    fn test_clear_and_replace() -> Result<()> {
        let mut memory = Mem::new();
        memory.save_all(ImageStateBatch::from_records((0..3).map(record).collect()))?;
        let items = memory.get_all_items()?.to_batch();

        memory.clear_memory()?;
        assert_eq!(memory.len()?, 0);
        assert!(memory.get_all_items()?.images.is_empty());

        memory.save_one(record(9))?;
        memory.replace_all(items.clone())?;
        assert_eq!(memory.get_all_items()?.to_batch(), items);
        Ok(())
    }
}
