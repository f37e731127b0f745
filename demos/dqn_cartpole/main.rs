use std::path::Path;

use burn::{
    backend::{ndarray::NdArrayDevice, Autodiff, NdArray},
    optim::AdamWConfig,
};
use deepq::{
    agent::Agent,
    algo::dqn::{DQNAgent, DQNAgentConfig},
    env::Environment,
    gym::CartPole,
    Trainer, TrainerConfig,
};
use gym_rs::utils::renderer::RenderMode;
use log::info;
use model::{Model, ModelConfig};
use once_cell::sync::Lazy;

mod model;

type DQNBackend = Autodiff<NdArray>;

static DEVICE: Lazy<NdArrayDevice> = Lazy::new(NdArrayDevice::default);

const MAX_T: usize = 500;

fn main() -> deepq::Result<()> {
    env_logger::init();

    // Watch an untrained, random-action episode first
    deepq::run(&mut CartPole::new(RenderMode::Human), None, MAX_T);

    let model = ModelConfig::new(64, 64).init::<DQNBackend>(&*DEVICE);
    let optimizer = AdamWConfig::new().init::<DQNBackend, Model<DQNBackend>>();
    let agent_config = DQNAgentConfig::new(optimizer, CartPole::n_actions());
    let mut agent: DQNAgent<DQNBackend, _, CartPole, 2, _> = DQNAgent::new(model, agent_config, &*DEVICE);

    let config = TrainerConfig {
        max_t: MAX_T,
        ..Default::default()
    };
    let checkpoint = config.checkpoint_path.clone();
    let mut env = CartPole::new(RenderMode::None);
    let scores = Trainer::new(config).train(&mut agent, &mut env)?;
    env.close();
    info!("Trained for {} episodes", scores.len());

    if Path::new(&checkpoint).exists() {
        agent.load_checkpoint(&checkpoint)?;
    }

    // Replay the learned greedy policy
    let mut env = CartPole::new(RenderMode::Human);
    deepq::run(&mut env, Some(&mut |state: &[f32; 4]| agent.act(state, 0.0)), MAX_T);

    Ok(())
}
