use rand::Rng;

use crate::assert_interval;

/// Exploration policy result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Explore,
    Exploit,
}

/// Draw an epsilon-greedy [`Choice`], exploring with probability `epsilon`
pub fn choose(epsilon: f32, rng: &mut impl Rng) -> Choice {
    if rng.gen::<f32>() < epsilon {
        Choice::Explore
    } else {
        Choice::Exploit
    }
}

/// Epsilon schedule with geometric per-episode decay and a hard floor
///
/// ε<sub>i</sub> = max(ε<sub>end</sub>, ε<sub>start</sub> * r<sup>i</sup>)
#[derive(Debug, Clone, PartialEq)]
pub struct EpsilonGreedy {
    epsilon: f32,
    end: f32,
    decay: f32,
}

impl EpsilonGreedy {
    /// Initialize the schedule from start, end, and decay rate
    ///
    /// **Panics** if `start` or `end` is not in the interval `[0,1]`, if `start` is less than `end`,
    /// or if `decay` is not in the interval `(0,1]`
    pub fn new(start: f32, end: f32, decay: f32) -> Self {
        assert_interval!(start, 0.0, 1.0);
        assert_interval!(end, 0.0, 1.0);
        assert!(
            decay > 0.0 && decay <= 1.0,
            "Epsilon decay rate must be in the interval (0, 1]."
        );
        assert!(
            start >= end,
            "Epsilon start value must not be less than end value."
        );
        Self {
            epsilon: start,
            end,
            decay,
        }
    }

    /// The current exploration rate
    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    /// Advance the schedule by one episode and return the new rate
    pub fn decay(&mut self) -> f32 {
        self.epsilon = self.end.max(self.decay * self.epsilon);
        self.epsilon
    }
}
