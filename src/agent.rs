use std::path::Path;

use crate::{env::Environment, error::Result, memory::Exp};

/// A learning agent that can be trained by the [`Trainer`](crate::trainer::Trainer)
pub trait Agent<E>
where
    E: Environment,
{
    /// Choose an action for `state`, exploring with probability `epsilon`
    fn act(&mut self, state: &E::State, epsilon: f32) -> E::Action;

    /// Observe one transition and learn from it online
    fn step(&mut self, exp: Exp<E>);

    /// Persist the agent's learned parameters to `path`
    fn save_checkpoint(&self, path: &Path) -> Result<()>;
}
