use gym_rs::core::{ActionReward, Env};
use gym_rs::envs::classical_control::cartpole::{CartPoleEnv, CartPoleObservation};
use gym_rs::utils::renderer::RenderMode;
use rand::seq::IteratorRandom;
use rand::thread_rng;
use strum::{EnumIter, FromRepr, IntoEnumIterator, VariantArray};

use crate::env::Environment;

fn obs2arr(observation: CartPoleObservation) -> [f32; 4] {
    let values = Vec::from(observation);
    std::array::from_fn(|i| values[i] as f32)
}

/// Actions for the [`CartPole`] environment, representing applying a left or right force to the cart
#[derive(FromRepr, EnumIter, VariantArray, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CPAction {
    Left = 0,
    Right = 1,
}

impl From<usize> for CPAction {
    /// **Panics** if `value` is not a valid action index
    fn from(value: usize) -> Self {
        Self::from_repr(value).expect("CPAction::from is only called with valid values [0, 1]")
    }
}

impl From<CPAction> for usize {
    fn from(value: CPAction) -> Self {
        value as usize
    }
}

/// The classic CartPole reinforcement learning environment
///
/// This implementation is a thin wrapper around [gym_rs](https://github.com/MathisWellmann/gym-rs).
/// Frames are only drawn when constructed with [`RenderMode::Human`].
#[derive(Debug, Clone)]
pub struct CartPole {
    gym_env: CartPoleEnv,
    render_mode: RenderMode,
}

impl CartPole {
    pub fn new(render_mode: RenderMode) -> Self {
        Self {
            gym_env: CartPoleEnv::new(render_mode.clone()),
            render_mode,
        }
    }

    /// Number of discrete actions
    pub fn n_actions() -> usize {
        CPAction::VARIANTS.len()
    }
}

impl Environment for CartPole {
    type State = [f32; 4];
    type Action = CPAction;
    type Info = ();

    fn reset(&mut self) -> Self::State {
        obs2arr(self.gym_env.reset(None, false, None).0)
    }

    fn step(&mut self, action: Self::Action) -> (Self::State, f32, bool, Self::Info) {
        let ActionReward {
            observation,
            reward,
            done,
            ..
        } = self.gym_env.step(action as usize);

        (obs2arr(observation), *reward as f32, done, ())
    }

    fn render(&mut self) {
        self.gym_env.render(self.render_mode.clone());
    }

    fn close(&mut self) {
        self.gym_env.close();
    }

    fn random_action(&self) -> Self::Action {
        CPAction::iter()
            .choose(&mut thread_rng())
            .unwrap_or(CPAction::Left)
    }
}
