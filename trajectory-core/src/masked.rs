//! Memory of transitions with the set of legal actions at each step.
use crate::{
    base::check_len,
    util::{checked_index, checked_range, evict_front},
    Feature, Memory, MemoryConfig, PolicyMemory, Record, RecordBatch, Result, Shapes,
    Transition, TransitionBatch, TransitionView,
};
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A transition with the indices of the actions that were legal at `s_t`.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct MaskedTransition<S, A> {
    /// The transition.
    pub transition: Transition<S, A>,

    /// Legal action indices, of any length.
    pub available_actions: Vec<usize>,
}

impl<S, A> MaskedTransition<S, A> {
    /// Creates a record.
    pub fn new(transition: Transition<S, A>, available_actions: Vec<usize>) -> Self {
        Self {
            transition,
            available_actions,
        }
    }
}

impl<S: Feature, A: Feature> Record for MaskedTransition<S, A> {
    fn validate(&self, shapes: &Shapes) -> Result<()> {
        self.transition.validate(shapes)
    }
}

/// Owned columns of [`MaskedTransition`]s.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct MaskedBatch<S, A> {
    /// Transition columns.
    pub transitions: TransitionBatch<S, A>,

    /// Legal action indices per step.
    pub available_actions: Vec<Vec<usize>>,
}

impl<S, A> Default for MaskedBatch<S, A> {
    fn default() -> Self {
        Self {
            transitions: TransitionBatch::default(),
            available_actions: vec![],
        }
    }
}

impl<S, A> MaskedBatch<S, A> {
    /// Creates a batch from its columns.
    pub fn new(transitions: TransitionBatch<S, A>, available_actions: Vec<Vec<usize>>) -> Self {
        Self {
            transitions,
            available_actions,
        }
    }
}

impl<S: Feature, A: Feature> RecordBatch for MaskedBatch<S, A> {
    type Record = MaskedTransition<S, A>;

    fn len(&self) -> usize {
        self.transitions.len()
    }

    fn validate(&self, shapes: &Shapes) -> Result<usize> {
        let len = self.transitions.validate(shapes)?;
        check_len("available_actions", self.available_actions.len(), len)?;
        Ok(len)
    }

    fn push(&mut self, record: Self::Record) {
        self.transitions.push(record.transition);
        self.available_actions.push(record.available_actions);
    }

    fn into_records(self) -> Vec<Self::Record> {
        self.transitions
            .into_records()
            .into_iter()
            .zip(self.available_actions)
            .map(|(transition, available_actions)| {
                MaskedTransition::new(transition, available_actions)
            })
            .collect()
    }
}

/// Borrowed columns of a [`MaskedPolicyMemory`].
#[derive(Debug, PartialEq)]
pub struct MaskedView<'a, S, A> {
    /// Transition columns.
    pub transitions: TransitionView<'a, S, A>,

    /// Legal action indices per step.
    pub available_actions: &'a [Vec<usize>],
}

impl<'a, S: Clone, A: Clone> MaskedView<'a, S, A> {
    /// Returns the number of records in the view.
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Returns `true` if the view is empty.
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Copies the view into owned columns.
    pub fn to_batch(&self) -> MaskedBatch<S, A> {
        MaskedBatch {
            transitions: self.transitions.to_batch(),
            available_actions: self.available_actions.to_vec(),
        }
    }
}

/// A [`PolicyMemory`] with one more column holding legal action indices.
///
/// Used by discrete policies that mask unavailable actions.
#[derive(Debug, Clone)]
pub struct MaskedPolicyMemory<S, A> {
    base: PolicyMemory<S, A>,
    available_actions: Vec<Vec<usize>>,
}

impl<S: Feature, A: Feature> Default for MaskedPolicyMemory<S, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Feature, A: Feature> MaskedPolicyMemory<S, A> {
    /// Creates an unbounded memory without shape checks.
    pub fn new() -> Self {
        Self::build(&MemoryConfig::default())
    }

    /// Creates an empty memory with the given configuration.
    pub fn build(config: &MemoryConfig) -> Self {
        Self {
            base: PolicyMemory::build(config),
            available_actions: vec![],
        }
    }

    fn append_unchecked(&mut self, batch: MaskedBatch<S, A>) {
        let MaskedBatch {
            transitions,
            mut available_actions,
        } = batch;
        let n = self.base.append_unchecked(transitions);
        self.available_actions.append(&mut available_actions);
        evict_front(&mut self.available_actions, n);
    }

    fn view(&self, range: Range<usize>) -> MaskedView<'_, S, A> {
        MaskedView {
            transitions: self.base.view(range.clone()),
            available_actions: &self.available_actions[range],
        }
    }
}

impl<S: Feature, A: Feature> Memory for MaskedPolicyMemory<S, A> {
    type Record = MaskedTransition<S, A>;
    type Item = MaskedTransition<S, A>;
    type Batch = MaskedBatch<S, A>;
    type View<'a> = MaskedView<'a, S, A> where Self: 'a;

    fn len(&self) -> Result<usize> {
        Ok(self.base.n_transitions())
    }

    fn get(&self, idx: usize) -> Result<Self::Item> {
        let ix = checked_index(idx, self.base.n_transitions())?;
        Ok(MaskedTransition::new(
            self.base.transition(ix),
            self.available_actions[ix].clone(),
        ))
    }

    fn save_one(&mut self, record: Self::Record) -> Result<()> {
        if let Err(e) = record.validate(self.base.shapes()) {
            warn!("Rejected masked transition: {}", e);
            return Err(e);
        }
        let n = self.base.push_unchecked(record.transition);
        self.available_actions.push(record.available_actions);
        evict_front(&mut self.available_actions, n);
        trace!("Saved a masked transition, len = {}", self.base.n_transitions());
        Ok(())
    }

    fn save_all(&mut self, batch: Self::Batch) -> Result<()> {
        let n = match batch.validate(self.base.shapes()) {
            Ok(n) => n,
            Err(e) => {
                warn!("Rejected batch of masked transitions: {}", e);
                return Err(e);
            }
        };
        self.append_unchecked(batch);
        debug!("Saved {} masked transitions", n);
        Ok(())
    }

    fn replace_all(&mut self, batch: Self::Batch) -> Result<()> {
        let n = batch.validate(self.base.shapes())?;
        self.clear_memory()?;
        self.append_unchecked(batch);
        debug!("Replaced contents with {} masked transitions", n);
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
        self.available_actions.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryError;

    type Mem = MaskedPolicyMemory<Vec<f32>, i64>;

    fn transitions(n: usize) -> TransitionBatch<Vec<f32>, i64> {
        TransitionBatch::from_records(
            (0..n)
                .map(|i| {
                    let x = i as f32;
                    Transition::new(vec![x, 0.], i as i64, x, i + 1 == n, vec![x + 1., 0.])
                })
                .collect(),
        )
    }

    fn assert_columns_match(memory: &Mem) {
        let len = memory.len().unwrap();
        let items = memory.get_all_items().unwrap();
        assert_eq!(items.transitions.states.len(), len);
        assert_eq!(items.transitions.actions.len(), len);
        assert_eq!(items.transitions.rewards.len(), len);
        assert_eq!(items.transitions.dones.len(), len);
        assert_eq!(items.transitions.next_states.len(), len);
        assert_eq!(items.available_actions.len(), len);
    }

    #[test]
    fn test_save_all_keeps_six_columns_aligned() -> Result<()> {
        let mut memory = Mem::new();
        let batch = MaskedBatch::new(transitions(3), vec![vec![0, 1], vec![0, 2], vec![1]]);
        memory.save_all(batch)?;
        assert_eq!(memory.len()?, 3);
        assert_columns_match(&memory);
        assert_eq!(memory.get(1)?.available_actions, vec![0, 2]);
        Ok(())
    }

    #[test]
    fn test_mismatched_available_actions_is_rejected() -> Result<()> {
        let mut memory = Mem::new();
        memory.save_one(MaskedTransition::new(
            Transition::new(vec![0., 0.], 0, 0., false, vec![1., 0.]),
            vec![0],
        ))?;

        let batch = MaskedBatch::new(transitions(3), vec![vec![0, 1], vec![0, 2]]);
        assert!(matches!(
            memory.save_all(batch),
            Err(MemoryError::Validation(_))
        ));
        assert_eq!(memory.len()?, 1);
        assert_columns_match(&memory);
        Ok(())
    }

    #[test]
    fn test_ranged_items() -> Result<()> {
        let mut memory = Mem::new();
        let batch = MaskedBatch::new(
            transitions(4),
            vec![vec![0], vec![0, 1], vec![0, 1, 2], vec![3]],
        );
        memory.save_all(batch)?;

        let items = memory.get_ranged_items(1, Some(2))?;
        assert_eq!(items.len(), 2);
        assert_eq!(items.available_actions, &[vec![0, 1], vec![0, 1, 2]]);
        assert_eq!(items.transitions.actions, &[1, 2]);

        let items = memory.get_ranged_items(3, None)?;
        assert_eq!(items.available_actions, &[vec![3]]);
        Ok(())
    }

    #[test]
    fn test_round_trip_and_clear() -> Result<()> {
        let mut memory = Mem::new();
        let batch = MaskedBatch::new(transitions(3), vec![vec![0, 1], vec![0, 2], vec![1]]);
        memory.save_all(batch.clone())?;

        let items = memory.get_all_items()?.to_batch();
        memory.clear_memory()?;
        assert_columns_match(&memory);
        memory.save_all(items)?;
        assert_eq!(memory.get_all_items()?.to_batch(), batch);
        Ok(())
    }
}
