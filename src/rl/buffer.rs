//! Experience replay memory
//!
//! A fixed-capacity FIFO ring of transitions with uniform sampling without
//! replacement. Unlike a prioritised buffer, nothing is weighted by recency or
//! reward.

use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;

use super::observation::Observation;
use crate::game::Turn;

/// One recorded step of experience
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub observation: Observation,
    pub action: Turn,
    pub reward: f32,
    pub next_observation: Observation,
    pub terminal: bool,
}

impl Transition {
    pub fn new(
        observation: Observation,
        action: Turn,
        reward: f32,
        next_observation: Observation,
        terminal: bool,
    ) -> Self {
        Self {
            observation,
            action,
            reward,
            next_observation,
            terminal,
        }
    }
}

/// Fixed-capacity ring buffer of transitions
pub struct ReplayMemory {
    buffer: Vec<Transition>,
    capacity: usize,
    /// Slot the next push writes to; also the oldest entry once full
    position: usize,
    rng: StdRng,
}

impl ReplayMemory {
    /// Create an empty memory holding at most `capacity` transitions
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of stored transitions
    /// * `seed` - Seed for the sampling rng; entropy when `None`
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. [`AgentConfig::validate`](super::AgentConfig::validate)
    /// rejects such configurations before a memory is built.
    pub fn new(capacity: usize, seed: Option<u64>) -> Self {
        assert!(capacity > 0, "replay capacity must be positive");
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        ReplayMemory {
            // Capacity may be in the millions; grow on demand.
            buffer: Vec::new(),
            capacity,
            position: 0,
            rng,
        }
    }

    /// Add a transition to the buffer. Overwrites oldest when full.
    pub fn push(&mut self, transition: Transition) {
        if self.buffer.len() < self.capacity {
            self.buffer.push(transition);
        } else {
            self.buffer[self.position] = transition;
        }
        self.position = (self.position + 1) % self.capacity;
    }

    /// Draw a batch of at most `batch_size` transitions
    ///
    /// When the memory holds no more than `batch_size` entries all of them are
    /// returned; otherwise `batch_size` distinct entries are drawn uniformly.
    pub fn sample(&mut self, batch_size: usize) -> Vec<&Transition> {
        if self.buffer.len() <= batch_size {
            return self.iter().collect();
        }
        let indices = index::sample(&mut self.rng, self.buffer.len(), batch_size);
        indices.iter().map(|i| &self.buffer[i]).collect()
    }

    /// Stored transitions, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        let split = if self.buffer.len() < self.capacity {
            0
        } else {
            self.position
        };
        self.buffer[split..].iter().chain(self.buffer[..split].iter())
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.position = 0;
    }
}
