use std::{fs, path::Path};

use burn::{
    module::{AutodiffModule, Param},
    nn::{
        loss::{MseLoss, Reduction},
        Linear,
    },
    optim::{GradientsParams, Optimizer},
    prelude::*,
    record::{BinBytesRecorder, FullPrecisionSettings, Recorder},
    tensor::{backend::AutodiffBackend, ElementConversion},
};
use log::debug;
use rand::{thread_rng, Rng};

use crate::{
    agent::Agent,
    env::Environment,
    error::Result,
    exploration::{self, Choice},
    memory::{Exp, ReplayMemory},
    traits::ToTensor,
};

type CheckpointRecorder = BinBytesRecorder<FullPrecisionSettings>;

/// A burn module used as the Q-network of a [`DQNAgent`]
///
/// ### Generics
/// - `B`: A burn backend
/// - `D`: The dimension of the input tensor
pub trait DQNModel<B: AutodiffBackend, const D: usize>: AutodiffModule<B> {
    /// Forward pass through the model, producing one Q value per action
    fn forward(&self, input: Tensor<B, D>) -> Tensor<B, 2>;

    /// Soft update the parameters of the target network
    ///
    /// θ′ ← τθ + (1 − τ)θ′
    ///
    /// ```ignore
    /// target_net = target_net.soft_update(&local_net, tau);
    /// ```
    fn soft_update(self, other: &Self, tau: f32) -> Self;
}

/// Interpolate a parameter towards `that` by `tau`
pub fn soft_update_tensor<B: Backend, const D: usize>(
    this: Param<Tensor<B, D>>,
    that: &Param<Tensor<B, D>>,
    tau: f32,
) -> Param<Tensor<B, D>> {
    this.map(|tensor| tensor * (1.0 - tau) + that.val() * tau)
}

/// Soft update a linear layer, a building block for [`DQNModel::soft_update`]
pub fn soft_update_linear<B: Backend>(mut this: Linear<B>, that: &Linear<B>, tau: f32) -> Linear<B> {
    this.weight = soft_update_tensor(this.weight, &that.weight, tau);
    this.bias = match (this.bias, &that.bias) {
        (Some(b1), Some(b2)) => Some(soft_update_tensor(b1, b2, tau)),
        _ => None,
    };

    this
}

/// Configuration for the [`DQNAgent`]
pub struct DQNAgentConfig<O> {
    /// The [`Optimizer`] to train the local network with
    pub optimizer: O,
    /// The size of the discrete action space
    pub n_actions: usize,
    /// How many transitions the replay memory holds
    pub memory_capacity: usize,
    /// How many transitions each learning step samples
    pub batch_size: usize,
    /// Learn once every this many agent steps
    pub update_every: usize,
    /// The discount factor
    pub gamma: f32,
    /// The rate at which the target network's parameters are soft updated with the local network's parameters
    pub tau: f32,
    /// The learning rate for the optimizer
    pub lr: f32,
}

impl<O> DQNAgentConfig<O> {
    /// Default hyperparameters for an action space of `n_actions` actions, trained with `optimizer`
    ///
    /// ```ignore
    /// let config = DQNAgentConfig::new(AdamWConfig::new().init::<B, Model<B>>(), 2);
    /// ```
    pub fn new(optimizer: O, n_actions: usize) -> Self {
        Self {
            optimizer,
            n_actions,
            memory_capacity: 100_000,
            batch_size: 64,
            update_every: 4,
            gamma: 0.99,
            tau: 1e-3,
            lr: 5e-4,
        }
    }
}

/// A Deep Q Network agent
///
/// Transitions passed to [`Agent::step`] are stored in a replay memory, and every `update_every` steps
/// the local network is fit to the TD target `r + γ max Q_target(s', ·) (1 - done)` on a sampled batch,
/// after which the target network is soft updated towards it. The local network is what gets checkpointed.
///
/// ### Generics
/// - `B`: A burn backend
/// - `M`: The [`DQNModel`] used for the local and target networks
/// - `E`: The [`Environment`] in which the agent will learn
///     - The action space must be discrete and indexable, since the network produces a Q value for each action.
///     - The state and action types' implementations of [`Clone`] should be lightweight, as they are cloned often.
/// - `D`: The dimension of the input
/// - `O`: An [`Optimizer`]
pub struct DQNAgent<B, M, E, const D: usize, O>
where
    B: AutodiffBackend,
    E: Environment,
{
    qnetwork_local: M,
    qnetwork_target: M,
    device: &'static B::Device,
    memory: ReplayMemory<E>,
    optimizer: O,
    loss: MseLoss<B>,
    n_actions: usize,
    update_every: usize,
    gamma: f32,
    tau: f32,
    lr: f32,
    t_step: usize,
}

impl<B, M, E, const D: usize, O> DQNAgent<B, M, E, D, O>
where
    B: AutodiffBackend,
    M: DQNModel<B, D>,
    E: Environment,
    O: Optimizer<M, B>,
    Vec<E::State>: ToTensor<B, D, Float>,
    E::Action: From<usize> + Into<usize>,
{
    /// Initialize a new `DQNAgent`
    ///
    /// ### Arguments
    /// - `model` A [`DQNModel`] to be used as the local and target networks
    /// - `config` A [`DQNAgentConfig`] containing components and hyperparameters for the agent
    /// - `device` A static reference to the device used for the `model`
    ///
    /// **Panics** if `n_actions` or `update_every` is zero
    pub fn new(model: M, config: DQNAgentConfig<O>, device: &'static B::Device) -> Self {
        assert!(config.n_actions > 0, "Action space must not be empty.");
        assert!(config.update_every > 0, "`update_every` must be nonzero.");
        Self {
            qnetwork_target: model.clone(),
            qnetwork_local: model,
            device,
            memory: ReplayMemory::new(config.memory_capacity, config.batch_size),
            optimizer: config.optimizer,
            loss: MseLoss::new(),
            n_actions: config.n_actions,
            update_every: config.update_every,
            gamma: config.gamma,
            tau: config.tau,
            lr: config.lr,
            t_step: 0,
        }
    }

    /// The network being trained
    pub fn qnetwork_local(&self) -> &M {
        &self.qnetwork_local
    }

    /// The network providing TD targets, trailing the local network
    pub fn qnetwork_target(&self) -> &M {
        &self.qnetwork_target
    }

    /// Number of transitions currently held in replay memory
    pub fn memory_len(&self) -> usize {
        self.memory.len()
    }

    /// Pick the action with the highest Q value in `state`
    pub fn greedy(&self, state: &E::State) -> E::Action {
        let input = vec![state.clone()].to_tensor(self.device);
        let output = self.qnetwork_local.forward(input).argmax(1).into_scalar();
        E::Action::from(output.elem::<i64>() as usize)
    }

    /// Load parameters written by [`Agent::save_checkpoint`] into both networks
    pub fn load_checkpoint(&mut self, path: &Path) -> Result<()> {
        let bytes = fs::read(path)?;
        let record = <CheckpointRecorder as Recorder<B>>::load(
            &CheckpointRecorder::default(),
            bytes,
            self.device,
        )?;
        self.qnetwork_local = self.qnetwork_local.clone().load_record(record);
        self.qnetwork_target = self.qnetwork_local.clone();
        Ok(())
    }

    /// Perform one DQN learning step on a batch sampled from replay memory
    fn learn(&mut self) {
        let Some(batch) = self.memory.sample_zipped() else {
            return;
        };
        let batch_size = batch.len();

        let states = batch.states.to_tensor(self.device);
        let next_states = batch.next_states.to_tensor(self.device);
        let actions = Tensor::<B, 1, Int>::from_data(
            Data::new(
                batch
                    .actions
                    .into_iter()
                    .map(|a| (Into::<usize>::into(a) as i64).elem::<B::IntElem>())
                    .collect::<Vec<_>>(),
                Shape::new([batch_size]),
            ),
            self.device,
        )
        .unsqueeze_dim::<2>(1);
        let rewards =
            Tensor::<B, 1>::from_floats(batch.rewards.as_slice(), self.device).unsqueeze_dim::<2>(1);
        let dones = batch
            .dones
            .iter()
            .map(|&done| if done { 1.0 } else { 0.0 })
            .collect::<Vec<f32>>();
        let not_done = Tensor::<B, 1>::from_floats(dones.as_slice(), self.device)
            .unsqueeze_dim::<2>(1)
            .neg()
            .add_scalar(1.0);

        // Maximum Q values obtainable from each next state, zeroed past the end of an episode
        let q_targets_next = self
            .qnetwork_target
            .forward(next_states)
            .max_dim(1)
            .detach();
        let q_targets = rewards + q_targets_next * not_done * self.gamma;

        // Q values of the actions that were actually taken
        let q_expected = self.qnetwork_local.forward(states).gather(1, actions);

        let loss = self.loss.forward(q_expected, q_targets, Reduction::Mean);
        debug!("DQN loss {:.5}", loss.clone().into_scalar().elem::<f32>());

        let grads = GradientsParams::from_grads(loss.backward(), &self.qnetwork_local);
        self.qnetwork_local = self
            .optimizer
            .step(self.lr.into(), self.qnetwork_local.clone(), grads);

        self.qnetwork_target = self
            .qnetwork_target
            .clone()
            .soft_update(&self.qnetwork_local, self.tau);
    }
}

impl<B, M, E, const D: usize, O> Agent<E> for DQNAgent<B, M, E, D, O>
where
    B: AutodiffBackend,
    M: DQNModel<B, D>,
    E: Environment,
    O: Optimizer<M, B>,
    Vec<E::State>: ToTensor<B, D, Float>,
    E::Action: From<usize> + Into<usize>,
{
    fn act(&mut self, state: &E::State, epsilon: f32) -> E::Action {
        let mut rng = thread_rng();
        match exploration::choose(epsilon, &mut rng) {
            Choice::Explore => E::Action::from(rng.gen_range(0..self.n_actions)),
            Choice::Exploit => self.greedy(state),
        }
    }

    fn step(&mut self, exp: Exp<E>) {
        self.memory.push(exp);

        self.t_step = (self.t_step + 1) % self.update_every;
        if self.t_step == 0 && self.memory.can_sample() {
            self.learn();
        }
    }

    fn save_checkpoint(&self, path: &Path) -> Result<()> {
        let bytes = <CheckpointRecorder as Recorder<B>>::record(
            &CheckpointRecorder::default(),
            self.qnetwork_local.clone().into_record(),
            (),
        )?;
        fs::write(path, bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use burn::{
        backend::{ndarray::NdArrayDevice, Autodiff, NdArray},
        nn::LinearConfig,
        optim::AdamWConfig,
        tensor::activation::relu,
    };
    use tempdir::TempDir;

    use super::*;

    type TestBackend = Autodiff<NdArray>;

    static DEVICE: NdArrayDevice = NdArrayDevice::Cpu;

    #[derive(Module, Debug)]
    struct Net<B: Backend> {
        fc1: Linear<B>,
        fc2: Linear<B>,
    }

    impl<B: Backend> Net<B> {
        fn new(device: &B::Device) -> Self {
            Self {
                fc1: LinearConfig::new(2, 16).init(device),
                fc2: LinearConfig::new(16, 3).init(device),
            }
        }
    }

    impl<B: AutodiffBackend> DQNModel<B, 2> for Net<B> {
        fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
            self.fc2.forward(relu(self.fc1.forward(input)))
        }

        fn soft_update(self, other: &Self, tau: f32) -> Self {
            Self {
                fc1: soft_update_linear(self.fc1, &other.fc1, tau),
                fc2: soft_update_linear(self.fc2, &other.fc2, tau),
            }
        }
    }

    /// A walk along a line, ending at either edge
    struct LineWalk {
        pos: i32,
    }

    impl Environment for LineWalk {
        type State = [f32; 2];
        type Action = usize;
        type Info = ();

        fn reset(&mut self) -> Self::State {
            self.pos = 0;
            [0.0, 1.0]
        }

        fn step(&mut self, action: Self::Action) -> (Self::State, f32, bool, Self::Info) {
            self.pos += action as i32 - 1;
            let done = self.pos.abs() >= 3;
            ([self.pos as f32, 1.0], if done { 1.0 } else { 0.0 }, done, ())
        }

        fn render(&mut self) {}

        fn close(&mut self) {}

        fn random_action(&self) -> Self::Action {
            thread_rng().gen_range(0..3)
        }
    }

    fn agent_with_lr(
        lr: f32,
    ) -> DQNAgent<TestBackend, Net<TestBackend>, LineWalk, 2, impl Optimizer<Net<TestBackend>, TestBackend>> {
        let optimizer = AdamWConfig::new().init::<TestBackend, Net<TestBackend>>();
        let config = DQNAgentConfig {
            batch_size: 4,
            update_every: 2,
            lr,
            ..DQNAgentConfig::new(optimizer, 3)
        };
        DQNAgent::new(Net::new(&DEVICE), config, &DEVICE)
    }

    fn agent(
    ) -> DQNAgent<TestBackend, Net<TestBackend>, LineWalk, 2, impl Optimizer<Net<TestBackend>, TestBackend>> {
        agent_with_lr(5e-4)
    }

    fn q_values(net: &Net<TestBackend>) -> Vec<f32> {
        let states: Tensor<TestBackend, 2> = vec![[0.0, 1.0], [2.0, 1.0], [-2.0, 1.0]].to_tensor(&DEVICE);
        net.forward(states).into_data().value
    }

    fn distance(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
    }

    #[test]
    fn dqn_actions_in_range() {
        let mut agent = agent();
        for eps in [0.0, 0.5, 1.0] {
            for _ in 0..20 {
                let action = agent.act(&[0.5, -0.5], eps);
                assert!(action < 3, "action {action} outside action space");
            }
        }
    }

    #[test]
    fn dqn_learns_online() {
        let mut agent = agent_with_lr(1e-2);
        let local_before = q_values(agent.qnetwork_local());
        let target_before = q_values(agent.qnetwork_target());
        assert_eq!(local_before, target_before, "target starts as a copy of local");

        let mut env = LineWalk { pos: 0 };
        let mut state = env.reset();
        for _ in 0..64 {
            let action = agent.act(&state, 1.0);
            let (next_state, reward, done, _) = env.step(action);
            agent.step(Exp {
                state,
                action,
                reward,
                next_state,
                done,
            });
            state = if done { env.reset() } else { next_state };
        }

        assert_eq!(agent.memory_len(), 64, "every transition remembered");
        assert!(agent.greedy(&state) < 3, "network still produces valid actions");

        let local_moved = distance(&local_before, &q_values(agent.qnetwork_local()));
        let target_moved = distance(&target_before, &q_values(agent.qnetwork_target()));
        assert!(local_moved > 1e-4, "optimizer steps change the local network: {local_moved}");
        assert!(
            target_moved < local_moved,
            "soft update keeps the target behind the local network: {target_moved} vs {local_moved}"
        );
    }

    #[test]
    fn dqn_checkpoint_roundtrip() {
        let dir = TempDir::new("deepq").expect("create temp dir");
        let path = dir.path().join("checkpoint.pth");

        let trained = agent();
        trained.save_checkpoint(&path).expect("checkpoint written");
        assert!(
            fs::metadata(&path).expect("checkpoint exists").len() > 0,
            "checkpoint is not empty"
        );

        let mut restored = agent();
        restored.load_checkpoint(&path).expect("checkpoint loaded");
        for state in [[0.0, 1.0], [2.0, 1.0], [-2.0, 1.0], [0.3, -4.0]] {
            assert_eq!(
                restored.greedy(&state),
                trained.greedy(&state),
                "restored network acts like the saved one"
            );
        }
    }
}
