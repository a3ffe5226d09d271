//! Experience replay.
//!
//! A bounded FIFO of transitions sampled uniformly without replacement.
//! Once full, each insert evicts the oldest transition.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use rand::{rngs::StdRng, seq::index, Rng, SeedableRng};

use crate::{
    env::Conformation,
    error::{Error, Result},
    protein::Angles,
};

/// One observed `(state, action, reward, next_state)` step.
///
/// States and actions are stored flattened.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: Vec<f32>,
    pub action: Vec<f32>,
    pub reward: f32,
    pub next_state: Vec<f32>,
}

impl Transition {
    pub fn new(state: Vec<f32>, action: Vec<f32>, reward: f32, next_state: Vec<f32>) -> Self {
        Self {
            state,
            action,
            reward,
            next_state,
        }
    }

    /// Flatten a conformation step into a transition.
    pub fn from_step<S: Conformation>(state: &S, action: &Angles, reward: f32, next_state: &S) -> Self {
        Self::new(
            state.angles().flatten().to_vec(),
            action.flatten().to_vec(),
            reward,
            next_state.angles().flatten().to_vec(),
        )
    }
}

/// Minibatch drawn from the buffer: four parallel sequences, one row per
/// sampled transition.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    pub states: Vec<Vec<f32>>,
    pub actions: Vec<Vec<f32>>,
    pub rewards: Vec<f32>,
    pub next_states: Vec<Vec<f32>>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }
}

/// Fixed-capacity FIFO replay buffer.
#[derive(Debug)]
pub struct ReplayBuffer {
    capacity: usize,
    transitions: VecDeque<Transition>,
    /// `(state_dim, action_dim)` fixed by the first insert
    dims: Option<(usize, usize)>,
    rng: StdRng,
}

impl ReplayBuffer {
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_rng(capacity, StdRng::from_entropy())
    }

    pub fn seeded(capacity: usize, seed: u64) -> Result<Self> {
        Self::with_rng(capacity, StdRng::seed_from_u64(seed))
    }

    fn with_rng(capacity: usize, rng: StdRng) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidConfig("replay capacity must be positive".into()));
        }
        Ok(Self {
            capacity,
            transitions: VecDeque::with_capacity(capacity.min(1 << 16)),
            dims: None,
            rng,
        })
    }

    /// Store a transition, evicting the oldest one when full.
    ///
    /// Every transition must have the same state and action widths as the
    /// first one stored, and `next_state` must match `state`.
    pub fn append(&mut self, transition: Transition) -> Result<()> {
        let dims = (transition.state.len(), transition.action.len());
        if transition.next_state.len() != dims.0 {
            return Err(Error::shape(
                "next_state",
                &[dims.0],
                &[transition.next_state.len()],
            ));
        }
        match self.dims {
            Some(expected) if expected != dims => {
                return Err(Error::shape(
                    "transition (state, action)",
                    &[expected.0, expected.1],
                    &[dims.0, dims.1],
                ));
            }
            Some(_) => {}
            None => self.dims = Some(dims),
        }

        if self.transitions.len() == self.capacity {
            self.transitions.pop_front();
        }
        self.transitions.push_back(transition);
        Ok(())
    }

    /// Uniformly sample `min(batch_size, len)` distinct transitions.
    pub fn sample(&mut self, batch_size: usize) -> Batch {
        let Self {
            transitions, rng, ..
        } = self;
        Self::gather(transitions, batch_size, rng)
    }

    /// Like [`ReplayBuffer::sample`] but drawing indices from `rng`.
    pub fn sample_with<R: Rng + ?Sized>(&self, batch_size: usize, rng: &mut R) -> Batch {
        Self::gather(&self.transitions, batch_size, rng)
    }

    fn gather<R: Rng + ?Sized>(transitions: &VecDeque<Transition>, batch_size: usize, rng: &mut R) -> Batch {
        let amount = batch_size.min(transitions.len());
        let indices = index::sample(rng, transitions.len(), amount);

        let mut batch = Batch {
            states: Vec::with_capacity(amount),
            actions: Vec::with_capacity(amount),
            rewards: Vec::with_capacity(amount),
            next_states: Vec::with_capacity(amount),
        };
        for i in indices.iter() {
            let t = &transitions[i];
            batch.states.push(t.state.clone());
            batch.actions.push(t.action.clone());
            batch.rewards.push(t.reward);
            batch.next_states.push(t.next_state.clone());
        }
        batch
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Stored transitions, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.transitions.iter()
    }
}

/// Replay buffer shared between rollout workers and a learner.
///
/// `append` and `sample` each hold the lock for their whole duration.
#[derive(Debug, Clone)]
pub struct SharedReplayBuffer {
    inner: Arc<Mutex<ReplayBuffer>>,
}

impl SharedReplayBuffer {
    pub fn new(buffer: ReplayBuffer) -> Self {
        Self {
            inner: Arc::new(Mutex::new(buffer)),
        }
    }

    pub fn append(&self, transition: Transition) -> Result<()> {
        self.inner.lock().append(transition)
    }

    pub fn sample(&self, batch_size: usize) -> Batch {
        self.inner.lock().sample(batch_size)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Run `f` with exclusive access to the underlying buffer.
    pub fn with<T>(&self, f: impl FnOnce(&mut ReplayBuffer) -> T) -> T {
        f(&mut self.inner.lock())
    }
}
