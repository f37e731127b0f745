/// Represents an episodic, discrete-time environment in which an agent can act.
///
/// Environments are driven either by the [runner](crate::runner), which renders every frame,
/// or by the [trainer](crate::trainer), which feeds every transition to an [`Agent`](crate::agent::Agent).
pub trait Environment {
    /// A representation of the state of the environment to be passed to an agent
    type State: Clone;

    /// A representation of an action that an agent can take to affect the environment
    type Action: Clone;

    /// Auxiliary diagnostic information returned alongside each step
    type Info;

    /// Reset the environment to an initial state
    ///
    /// **Returns** the initial state
    fn reset(&mut self) -> Self::State;

    /// Update the environment in response to an action taken by an agent
    ///
    /// **Returns** `(next_state, reward, done, info)`
    fn step(&mut self, action: Self::Action) -> (Self::State, f32, bool, Self::Info);

    /// Draw the current frame
    fn render(&mut self);

    /// Release any resources held by the environment
    fn close(&mut self);

    /// Sample an action uniformly from the action space
    fn random_action(&self) -> Self::Action;
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::Cell;

    use super::Environment;

    /// An environment that ends every episode after a fixed number of steps,
    /// paying out one reward per episode from a script (the last entry repeats)
    #[derive(Debug, Default)]
    pub struct MockEnv {
        pub episode_len: usize,
        pub rewards: Vec<f32>,
        pub resets: usize,
        pub steps: usize,
        pub renders: usize,
        pub closes: usize,
        pub random_actions: Cell<usize>,
        pub panic_on_step: bool,
        t: usize,
    }

    impl MockEnv {
        pub fn new(episode_len: usize, rewards: Vec<f32>) -> Self {
            Self {
                episode_len,
                rewards,
                ..Default::default()
            }
        }

        fn episode_reward(&self) -> f32 {
            let episode = self.resets.saturating_sub(1);
            self.rewards
                .get(episode)
                .or(self.rewards.last())
                .copied()
                .unwrap_or(0.0)
        }
    }

    impl Environment for MockEnv {
        type State = usize;
        type Action = i32;
        type Info = ();

        fn reset(&mut self) -> Self::State {
            self.resets += 1;
            self.t = 0;
            self.t
        }

        fn step(&mut self, _action: Self::Action) -> (Self::State, f32, bool, Self::Info) {
            assert!(!self.panic_on_step, "step failed");
            self.steps += 1;
            self.t += 1;
            let done = self.t >= self.episode_len;
            let reward = if done { self.episode_reward() } else { 0.0 };
            (self.t, reward, done, ())
        }

        fn render(&mut self) {
            self.renders += 1;
        }

        fn close(&mut self) {
            self.closes += 1;
        }

        fn random_action(&self) -> Self::Action {
            self.random_actions.set(self.random_actions.get() + 1);
            -1
        }
    }
}
