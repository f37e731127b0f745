use crate::env::Environment;

/// Represents a single experience or transition in the environment
pub struct Exp<E: Environment> {
    /// The state of the environment before taking the action
    pub state: E::State,
    /// The action taken in the given state
    pub action: E::Action,
    /// The reward received after taking the action
    pub reward: f32,
    /// The state of the environment after the action is taken
    pub next_state: E::State,
    /// Whether the action ended the episode
    pub done: bool,
}

impl<E: Environment> Clone for Exp<E> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            action: self.action.clone(),
            reward: self.reward,
            next_state: self.next_state.clone(),
            done: self.done,
        }
    }
}

/// A zipped batch of [experiences](Exp)
pub struct ExpBatch<E: Environment> {
    pub states: Vec<E::State>,
    pub actions: Vec<E::Action>,
    pub rewards: Vec<f32>,
    pub next_states: Vec<E::State>,
    pub dones: Vec<bool>,
}

impl<E: Environment> ExpBatch<E> {
    /// Construct an `ExpBatch` from an iterator of [experiences](Exp) and a specified batch size
    pub fn from_iter(iter: impl IntoIterator<Item = Exp<E>>, batch_size: usize) -> Self {
        let batch = Self {
            states: Vec::with_capacity(batch_size),
            actions: Vec::with_capacity(batch_size),
            rewards: Vec::with_capacity(batch_size),
            next_states: Vec::with_capacity(batch_size),
            dones: Vec::with_capacity(batch_size),
        };

        iter.into_iter().fold(batch, |mut b, e| {
            b.states.push(e.state);
            b.actions.push(e.action);
            b.rewards.push(e.reward);
            b.next_states.push(e.next_state);
            b.dones.push(e.done);
            b
        })
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
