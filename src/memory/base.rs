use rand::{seq::SliceRandom, thread_rng};

use crate::{ds::RingBuffer, env::Environment};

use super::{Exp, ExpBatch};

/// A fixed-size memory storage for reinforcement learning experiences
///
/// This structure uses a ring buffer to store experiences and
/// automatically overwrites the oldest experiences once it reaches its capacity.
pub struct ReplayMemory<E: Environment> {
    memory: RingBuffer<Exp<E>>,
    pub batch_size: usize,
}

impl<E: Environment> ReplayMemory<E> {
    pub fn new(capacity: usize, batch_size: usize) -> Self {
        Self {
            memory: RingBuffer::new(capacity),
            batch_size,
        }
    }

    /// Add a new experience to the memory
    pub fn push(&mut self, exp: Exp<E>) {
        self.memory.push(exp);
    }

    pub fn len(&self) -> usize {
        self.memory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    /// Whether enough experiences are stored to draw a batch
    pub fn can_sample(&self) -> bool {
        self.batch_size <= self.memory.len()
    }

    /// Sample a random batch of experiences from the memory and zip the vector of tuples into a tuple of vectors
    ///
    /// ### Returns
    /// - `Some(batch)` if `batch_size` is less than or equal to the buffer length
    /// - `None` otherwise
    pub fn sample_zipped(&self) -> Option<ExpBatch<E>> {
        if !self.can_sample() {
            return None;
        }
        let experiences = self
            .memory
            .view()
            .choose_multiple(&mut thread_rng(), self.batch_size)
            .cloned();
        Some(ExpBatch::from_iter(experiences, self.batch_size))
    }
}
