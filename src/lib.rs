/// Agent trait
pub mod agent;

/// Implemented RL algorithms
pub mod algo;

/// Data structures
pub mod ds;

/// Environment trait
pub mod env;

/// Error types
pub mod error;

/// Epsilon-greedy exploration
pub mod exploration;

/// Experience replay
pub mod memory;

/// Rendered single-episode runner
pub mod runner;

/// Episodic training loop
pub mod trainer;

/// Tensor conversion traits
pub mod traits;

/// Testing environments
#[cfg(feature = "gym")]
pub mod gym;

mod util;

pub use error::{Error, Result};
pub use runner::run;
pub use trainer::{train, Trainer, TrainerConfig};
