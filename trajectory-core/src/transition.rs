//! Transitions and their column forms.
use crate::{
    base::{check_len, check_same_shape, check_shape},
    Feature, Record, RecordBatch, Result, Shapes,
};
use serde::{Deserialize, Serialize};

/// One environment step `(s_t, a_t, r_t, done_t, s_t+1)`.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Transition<S, A> {
    /// State `s_t`.
    pub state: S,

    /// Action `a_t`.
    pub action: A,

    /// Reward `r_t`.
    pub reward: f32,

    /// Terminal flag.
    pub done: bool,

    /// Next state `s_t+1`, with the shape of `state`.
    pub next_state: S,
}

impl<S, A> Transition<S, A> {
    /// Creates a transition.
    pub fn new(state: S, action: A, reward: f32, done: bool, next_state: S) -> Self {
        Self {
            state,
            action,
            reward,
            done,
            next_state,
        }
    }
}

/// Checks the fields of one transition.
fn validate_fields<S: Feature, A: Feature>(
    state: &S,
    action: &A,
    next_state: &S,
    shapes: &Shapes,
) -> Result<()> {
    let state_shape = state.shape();
    check_shape("state", shapes.state.as_ref(), &state_shape)?;
    check_same_shape("next_state", &state_shape, &next_state.shape())?;
    check_shape("action", shapes.action.as_ref(), &action.shape())
}

impl<S: Feature, A: Feature> Record for Transition<S, A> {
    fn validate(&self, shapes: &Shapes) -> Result<()> {
        validate_fields(&self.state, &self.action, &self.next_state, shapes)
    }
}

/// Owned columns of transitions.
///
/// `dones` is the canonical column: its length is the length of the batch.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct TransitionBatch<S, A> {
    /// States.
    pub states: Vec<S>,

    /// Actions.
    pub actions: Vec<A>,

    /// Rewards.
    pub rewards: Vec<f32>,

    /// Terminal flags.
    pub dones: Vec<bool>,

    /// Next states.
    pub next_states: Vec<S>,
}

impl<S, A> Default for TransitionBatch<S, A> {
    fn default() -> Self {
        Self {
            states: vec![],
            actions: vec![],
            rewards: vec![],
            dones: vec![],
            next_states: vec![],
        }
    }
}

impl<S, A> TransitionBatch<S, A> {
    /// Creates a batch from its columns.
    ///
    /// The columns are not checked here; memories validate batches on write.
    pub fn new(
        states: Vec<S>,
        actions: Vec<A>,
        rewards: Vec<f32>,
        dones: Vec<bool>,
        next_states: Vec<S>,
    ) -> Self {
        Self {
            states,
            actions,
            rewards,
            dones,
            next_states,
        }
    }

    /// Checks that every column has as many entries as `dones`.
    pub(crate) fn check_lens(&self) -> Result<usize> {
        let len = self.dones.len();
        check_len("states", self.states.len(), len)?;
        check_len("actions", self.actions.len(), len)?;
        check_len("rewards", self.rewards.len(), len)?;
        check_len("next_states", self.next_states.len(), len)?;
        Ok(len)
    }
}

impl<S: Feature, A: Feature> RecordBatch for TransitionBatch<S, A> {
    type Record = Transition<S, A>;

    fn len(&self) -> usize {
        self.dones.len()
    }

    fn validate(&self, shapes: &Shapes) -> Result<usize> {
        let len = self.check_lens()?;
        for ix in 0..len {
            validate_fields(
                &self.states[ix],
                &self.actions[ix],
                &self.next_states[ix],
                shapes,
            )
            .map_err(|e| e.at_record(ix))?;
        }
        Ok(len)
    }

    fn push(&mut self, record: Transition<S, A>) {
        self.states.push(record.state);
        self.actions.push(record.action);
        self.rewards.push(record.reward);
        self.dones.push(record.done);
        self.next_states.push(record.next_state);
    }

    fn into_records(self) -> Vec<Transition<S, A>> {
        self.states
            .into_iter()
            .zip(self.actions)
            .zip(self.rewards)
            .zip(self.dones)
            .zip(self.next_states)
            .map(|((((state, action), reward), done), next_state)| {
                Transition::new(state, action, reward, done, next_state)
            })
            .collect()
    }
}

/// Borrowed columns of transitions, in insertion order.
#[derive(Debug, PartialEq)]
pub struct TransitionView<'a, S, A> {
    /// States.
    pub states: &'a [S],

    /// Actions.
    pub actions: &'a [A],

    /// Rewards.
    pub rewards: &'a [f32],

    /// Terminal flags.
    pub dones: &'a [bool],

    /// Next states.
    pub next_states: &'a [S],
}

impl<'a, S, A> Clone for TransitionView<'a, S, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, S, A> Copy for TransitionView<'a, S, A> {}

impl<'a, S: Clone, A: Clone> TransitionView<'a, S, A> {
    /// Returns the number of transitions in the view.
    pub fn len(&self) -> usize {
        self.dones.len()
    }

    /// Returns `true` if the view is empty.
    pub fn is_empty(&self) -> bool {
        self.dones.is_empty()
    }

    /// Returns the transition at `ix` of the view.
    pub fn get(&self, ix: usize) -> Option<Transition<S, A>> {
        if ix >= self.len() {
            return None;
        }
        Some(Transition::new(
            self.states[ix].clone(),
            self.actions[ix].clone(),
            self.rewards[ix],
            self.dones[ix],
            self.next_states[ix].clone(),
        ))
    }

    /// Iterates over the transitions of the view.
    pub fn iter(&self) -> impl Iterator<Item = Transition<S, A>> + 'a {
        let view = *self;
        (0..view.len()).filter_map(move |ix| view.get(ix))
    }

    /// Copies the view into owned columns.
    pub fn to_batch(&self) -> TransitionBatch<S, A> {
        TransitionBatch {
            states: self.states.to_vec(),
            actions: self.actions.to_vec(),
            rewards: self.rewards.to_vec(),
            dones: self.dones.to_vec(),
            next_states: self.next_states.to_vec(),
        }
    }
}
