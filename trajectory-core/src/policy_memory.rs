//! The base record store.
//!
//! [`PolicyMemory`] holds parallel columns of states, actions, rewards, terminal
//! flags and next states. The specialized memories of this crate wrap it and add
//! their own columns on top.
use crate::{
    util::{checked_index, checked_range, evict_front, n_evicted},
    Feature, Memory, MemoryConfig, Record, RecordBatch, Result, Shapes, Transition,
    TransitionBatch, TransitionView,
};
use log::{debug, trace, warn};
use std::ops::Range;

/// A memory of transitions kept in process.
///
/// Columns are appended in insertion order and always have the same length;
/// the length of `dones` is the length of the memory. With a capacity, the
/// oldest transitions are evicted from every column at once.
///
/// # Type Parameters
///
/// * `S` - The type of states, must implement [`Feature`]
/// * `A` - The type of actions, must implement [`Feature`]
///
/// # Examples
///
/// ```
/// use trajectory_core::{Memory, MemoryConfig, PolicyMemory, TransitionBatch};
///
/// # fn main() -> trajectory_core::Result<()> {
/// let config = MemoryConfig::default().state_shape(vec![2]);
/// let mut memory = PolicyMemory::<Vec<f32>, i64>::build(&config);
///
/// memory.save_all(TransitionBatch::new(
///     vec![vec![0., 0.], vec![0., 1.]],
///     vec![1, 0],
///     vec![1.0, 0.5],
///     vec![false, true],
///     vec![vec![0., 1.], vec![1., 1.]],
/// ))?;
///
/// let items = memory.get_ranged_items(1, None)?;
/// assert_eq!(items.rewards, &[0.5]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PolicyMemory<S, A> {
    /// Maximum number of transitions, if bounded.
    capacity: Option<usize>,

    /// Expected shapes of states and actions.
    shapes: Shapes,

    states: Vec<S>,
    actions: Vec<A>,
    rewards: Vec<f32>,
    dones: Vec<bool>,
    next_states: Vec<S>,
}

impl<S: Feature, A: Feature> Default for PolicyMemory<S, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Feature, A: Feature> PolicyMemory<S, A> {
    /// Creates an unbounded memory without shape checks.
    pub fn new() -> Self {
        Self::build(&MemoryConfig::default())
    }

    /// Creates an empty memory with the given configuration.
    pub fn build(config: &MemoryConfig) -> Self {
        Self {
            capacity: config.capacity_as_usize(),
            shapes: config.shapes.clone(),
            states: vec![],
            actions: vec![],
            rewards: vec![],
            dones: vec![],
            next_states: vec![],
        }
    }

    /// Returns the capacity, if the memory is bounded.
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Returns the expected shapes of stored values.
    pub fn shapes(&self) -> &Shapes {
        &self.shapes
    }

    /// Number of stored transitions.
    #[inline]
    pub(crate) fn n_transitions(&self) -> usize {
        self.dones.len()
    }

    /// Appends a transition that has already been validated.
    ///
    /// Returns the number of oldest transitions evicted to respect the capacity.
    pub(crate) fn push_unchecked(&mut self, tr: Transition<S, A>) -> usize {
        self.states.push(tr.state);
        self.actions.push(tr.action);
        self.rewards.push(tr.reward);
        self.dones.push(tr.done);
        self.next_states.push(tr.next_state);
        self.evict()
    }

    /// Appends columns that have already been validated.
    ///
    /// Returns the number of oldest transitions evicted to respect the capacity.
    pub(crate) fn append_unchecked(&mut self, batch: TransitionBatch<S, A>) -> usize {
        let TransitionBatch {
            mut states,
            mut actions,
            mut rewards,
            mut dones,
            mut next_states,
        } = batch;
        self.states.append(&mut states);
        self.actions.append(&mut actions);
        self.rewards.append(&mut rewards);
        self.dones.append(&mut dones);
        self.next_states.append(&mut next_states);
        self.evict()
    }

    fn evict(&mut self) -> usize {
        let n = n_evicted(self.n_transitions(), self.capacity);
        if n > 0 {
            trace!("Evict {} oldest transitions", n);
            evict_front(&mut self.states, n);
            evict_front(&mut self.actions, n);
            evict_front(&mut self.rewards, n);
            evict_front(&mut self.dones, n);
            evict_front(&mut self.next_states, n);
        }
        n
    }

    /// Empties every column in place.
    pub(crate) fn clear(&mut self) {
        self.states.clear();
        self.actions.clear();
        self.rewards.clear();
        self.dones.clear();
        self.next_states.clear();
    }

    /// Borrows the columns over `range`, which must be within bounds.
    pub(crate) fn view(&self, range: Range<usize>) -> TransitionView<'_, S, A> {
        TransitionView {
            states: &self.states[range.clone()],
            actions: &self.actions[range.clone()],
            rewards: &self.rewards[range.clone()],
            dones: &self.dones[range.clone()],
            next_states: &self.next_states[range],
        }
    }

    /// Clones the transition at `ix`, which must be within bounds.
    pub(crate) fn transition(&self, ix: usize) -> Transition<S, A> {
        Transition::new(
            self.states[ix].clone(),
            self.actions[ix].clone(),
            self.rewards[ix],
            self.dones[ix],
            self.next_states[ix].clone(),
        )
    }
}

impl<S: Feature, A: Feature> Memory for PolicyMemory<S, A> {
    type Record = Transition<S, A>;
    type Item = Transition<S, A>;
    type Batch = TransitionBatch<S, A>;
    type View<'a> = TransitionView<'a, S, A> where Self: 'a;

    fn len(&self) -> Result<usize> {
        Ok(self.n_transitions())
    }

    fn get(&self, idx: usize) -> Result<Self::Item> {
        let ix = checked_index(idx, self.n_transitions())?;
        Ok(self.transition(ix))
    }

    fn save_one(&mut self, record: Self::Record) -> Result<()> {
        if let Err(e) = record.validate(&self.shapes) {
            warn!("Rejected transition: {}", e);
            return Err(e);
        }
        self.push_unchecked(record);
        trace!("Saved a transition, len = {}", self.n_transitions());
        Ok(())
    }

    fn save_all(&mut self, batch: Self::Batch) -> Result<()> {
        let n = match batch.validate(&self.shapes) {
            Ok(n) => n,
            Err(e) => {
                warn!("Rejected batch of transitions: {}", e);
                return Err(e);
            }
        };
        self.append_unchecked(batch);
        debug!("Saved {} transitions, len = {}", n, self.n_transitions());
        Ok(())
    }

    fn replace_all(&mut self, batch: Self::Batch) -> Result<()> {
        let n = batch.validate(&self.shapes)?;
        self.clear();
        self.append_unchecked(batch);
        debug!("Replaced contents with {} transitions", n);
        Ok(())
    }

    fn get_all_items(&self) -> Result<Self::View<'_>> {
        Ok(self.view(0..self.n_transitions()))
    }

    fn get_ranged_items(&self, start: usize, end: Option<usize>) -> Result<Self::View<'_>> {
        let range = checked_range(start, end, self.n_transitions())?;
        Ok(self.view(range))
    }

    fn clear_memory(&mut self) -> Result<()> {
        debug!("Clear {} transitions", self.n_transitions());
        self.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryError;
    use std::num::NonZeroUsize;
    use test_log::test;

    type Mem = PolicyMemory<Vec<f32>, Vec<f32>>;

    fn tr(i: usize) -> Transition<Vec<f32>, Vec<f32>> {
        let x = i as f32;
        Transition::new(vec![x, x], vec![x], x, i % 2 == 1, vec![x + 1., x + 1.])
    }

    fn batch(ixs: Range<usize>) -> TransitionBatch<Vec<f32>, Vec<f32>> {
        TransitionBatch::from_records(ixs.map(tr).collect())
    }

    fn assert_columns_match(memory: &Mem) {
        let len = memory.len().unwrap();
        let items = memory.get_all_items().unwrap();
        assert_eq!(items.states.len(), len);
        assert_eq!(items.actions.len(), len);
        assert_eq!(items.rewards.len(), len);
        assert_eq!(items.dones.len(), len);
        assert_eq!(items.next_states.len(), len);
    }

    #[test]
    fn test_save_one_three_times() -> Result<()> {
        let mut memory = Mem::new();
        for i in 0..3 {
            memory.save_one(tr(i))?;
            assert_columns_match(&memory);
        }
        assert_eq!(memory.len()?, 3);

        let items = memory.get_all_items()?;
        let records = items.iter().collect::<Vec<_>>();
        assert_eq!(records, vec![tr(0), tr(1), tr(2)]);

        memory.clear_memory()?;
        assert_eq!(memory.len()?, 0);
        Ok(())
    }

    #[test]
    fn test_save_all_preserves_order() -> Result<()> {
        let mut memory = Mem::new();
        memory.save_one(tr(0))?;
        memory.save_all(batch(1..4))?;
        assert_columns_match(&memory);

        let items = memory.get_all_items()?;
        assert_eq!(items.rewards, &[0., 1., 2., 3.]);
        assert_eq!(memory.get(2)?, tr(2));
        Ok(())
    }

    #[test]
    fn test_save_all_rejects_mismatched_columns() -> Result<()> {
        let mut memory = Mem::new();
        memory.save_all(batch(0..2))?;

        let mut bad = batch(2..5);
        bad.next_states.pop();
        assert!(matches!(
            memory.save_all(bad),
            Err(MemoryError::Validation(_))
        ));
        assert_eq!(memory.len()?, 2);
        assert_columns_match(&memory);
        Ok(())
    }

    #[test]
    fn test_save_one_rejects_wrong_shape() -> Result<()> {
        let config = MemoryConfig::default()
            .state_shape(vec![2])
            .action_shape(vec![1]);
        let mut memory = Mem::build(&config);
        memory.save_one(tr(0))?;

        let bad = Transition::new(vec![0., 0., 0.], vec![0.], 0., false, vec![0., 0., 0.]);
        assert!(matches!(
            memory.save_one(bad),
            Err(MemoryError::Validation(_))
        ));

        // next_state must follow the state even without a configured shape
        let mut memory = Mem::new();
        let bad = Transition::new(vec![0., 0.], vec![0.], 0., false, vec![0.]);
        assert!(memory.save_one(bad).is_err());
        assert_eq!(memory.len()?, 0);
        Ok(())
    }

    #[test]
    fn test_get_ranged_items() -> Result<()> {
        let mut memory = Mem::new();
        memory.save_all(batch(0..6))?;
        let n = memory.len()?;

        let items = memory.get_ranged_items(2, Some(4))?;
        assert_eq!(items.iter().collect::<Vec<_>>(), vec![tr(2), tr(3), tr(4)]);

        let items = memory.get_ranged_items(n - 1, None)?;
        assert_eq!(items.iter().collect::<Vec<_>>(), vec![tr(5)]);

        let items = memory.get_ranged_items(n, None)?;
        assert!(items.is_empty());

        assert_eq!(
            memory.get_ranged_items(n + 1, None),
            Err(MemoryError::IndexOutOfRange { index: n + 1, len: n })
        );
        assert!(memory.get_ranged_items(1, Some(n)).is_err());
        Ok(())
    }

    #[test]
    fn test_get_out_of_range() -> Result<()> {
        let mut memory = Mem::new();
        assert_eq!(
            memory.get(0),
            Err(MemoryError::IndexOutOfRange { index: 0, len: 0 })
        );
        memory.save_one(tr(0))?;
        assert!(memory.get(1).is_err());
        Ok(())
    }

    #[test]
    fn test_clear_is_idempotent() -> Result<()> {
        let mut memory = Mem::new();
        memory.clear_memory()?;
        assert_eq!(memory.len()?, 0);

        memory.save_all(batch(0..3))?;
        memory.clear_memory()?;
        memory.clear_memory()?;
        assert_eq!(memory.len()?, 0);
        assert!(memory.get_all_items()?.is_empty());
        assert_columns_match(&memory);
        Ok(())
    }

    #[test]
    fn test_round_trip() -> Result<()> {
        let mut memory = Mem::new();
        memory.save_all(batch(0..4))?;
        let before = memory.get_all_items()?.to_batch();

        let items = memory.get_all_items()?.to_batch();
        memory.clear_memory()?;
        memory.save_all(items)?;
        assert_eq!(memory.get_all_items()?.to_batch(), before);
        Ok(())
    }

    #[test]
    fn test_replace_all() -> Result<()> {
        let mut memory = Mem::new();
        memory.save_all(batch(0..4))?;
        memory.replace_all(batch(10..12))?;
        assert_eq!(memory.len()?, 2);
        assert_eq!(memory.get(0)?, tr(10));

        let mut bad = batch(0..2);
        bad.dones.push(true);
        assert!(memory.replace_all(bad).is_err());
        assert_eq!(memory.len()?, 2);
        Ok(())
    }

    #[test]
    fn test_capacity_evicts_oldest() -> Result<()> {
        let config = MemoryConfig::default().capacity(NonZeroUsize::new(3));
        let mut memory = Mem::build(&config);
        memory.save_all(batch(0..2))?;
        memory.save_one(tr(2))?;
        memory.save_one(tr(3))?;
        assert_eq!(memory.len()?, 3);
        assert_eq!(memory.get(0)?, tr(1));

        memory.save_all(batch(4..9))?;
        assert_columns_match(&memory);
        let items = memory.get_all_items()?;
        assert_eq!(items.rewards, &[6., 7., 8.]);
        Ok(())
    }
}
