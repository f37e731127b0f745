use std::{
    io::{self, Stdout, Write},
    path::PathBuf,
};

use log::{debug, info, warn};

use crate::{
    agent::Agent, ds::RingBuffer, env::Environment, error::Result, exploration::EpsilonGreedy,
    memory::Exp, util,
};

/// Configuration for the [`Trainer`]
#[derive(Debug, Clone, PartialEq)]
pub struct TrainerConfig {
    /// Maximum number of training episodes
    pub n_episodes: usize,
    /// Maximum number of steps per episode
    pub max_t: usize,
    /// Starting value of epsilon for epsilon-greedy action selection
    pub eps_start: f32,
    /// Minimum value of epsilon
    pub eps_end: f32,
    /// Multiplicative factor (per episode) for decreasing epsilon
    pub eps_decay: f32,
    /// Number of trailing episodes averaged for progress and the solved check
    pub window: usize,
    /// Trailing average score at which the environment counts as solved
    pub solved_threshold: f32,
    /// Where the agent's parameters are saved once solved
    pub checkpoint_path: PathBuf,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            n_episodes: 2000,
            max_t: 1000,
            eps_start: 1.0,
            eps_end: 0.01,
            eps_decay: 0.995,
            window: 100,
            solved_threshold: 200.0,
            checkpoint_path: PathBuf::from("checkpoint.pth"),
        }
    }
}

/// The scores of the most recent episodes, oldest evicted first
#[derive(Debug, Clone)]
pub struct ScoreWindow {
    scores: RingBuffer<f32>,
}

impl ScoreWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            scores: RingBuffer::new(capacity),
        }
    }

    pub fn push(&mut self, score: f32) {
        self.scores.push(score);
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Scores in the order they were recorded
    pub fn iter(&self) -> impl Iterator<Item = &f32> {
        self.scores.iter()
    }

    /// Mean of the scores in the window, `0.0` when empty
    pub fn mean(&self) -> f32 {
        util::mean(self.scores.view())
    }
}

/// Runs the episodic Deep Q-Learning training loop
///
/// Every episode the agent acts epsilon-greedily and observes each transition. After the episode,
/// epsilon decays geometrically towards its floor and the trailing average score is reported to the
/// output (stdout unless replaced with [`Trainer::with_output`]). Training stops early once the
/// trailing average reaches [`TrainerConfig::solved_threshold`], at which point the agent is
/// checkpointed to [`TrainerConfig::checkpoint_path`].
pub struct Trainer<W: Write = Stdout> {
    config: TrainerConfig,
    out: W,
}

impl Trainer<Stdout> {
    pub fn new(config: TrainerConfig) -> Self {
        Self {
            config,
            out: io::stdout(),
        }
    }
}

impl<W: Write> Trainer<W> {
    /// Replace the writer progress lines are printed to
    pub fn with_output<O: Write>(self, out: O) -> Trainer<O> {
        Trainer {
            config: self.config,
            out,
        }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Consume the trainer, returning its output writer
    pub fn into_output(self) -> W {
        self.out
    }

    /// Train `agent` in `env`
    ///
    /// **Returns** the total reward of every episode that was run, including the solving episode
    ///
    /// **Panics** if `window` is zero or the epsilon parameters are invalid (see [`EpsilonGreedy::new`])
    pub fn train<E, A>(&mut self, agent: &mut A, env: &mut E) -> Result<Vec<f32>>
    where
        E: Environment,
        A: Agent<E>,
    {
        let config = &self.config;
        assert!(config.window > 0, "Score window must hold at least one episode.");
        let mut scores = Vec::with_capacity(config.n_episodes);
        let mut window = ScoreWindow::new(config.window);
        let mut eps = EpsilonGreedy::new(config.eps_start, config.eps_end, config.eps_decay);

        for i_episode in 1..=config.n_episodes {
            let score = run_episode(agent, env, eps.epsilon(), config.max_t);

            window.push(score);
            scores.push(score);
            let epsilon = eps.decay();
            let average = window.mean();
            debug!("Episode {i_episode} score {score:.2}, epsilon now {epsilon:.4}");

            write!(
                self.out,
                "\rEpisode {}\tAverage Score: {:.2}",
                i_episode, average
            )?;
            if i_episode % config.window == 0 {
                writeln!(
                    self.out,
                    "\rEpisode {}\tAverage Score: {:.2}",
                    i_episode, average
                )?;
                info!("Episode {i_episode}: average score {average:.2}");
            }
            self.out.flush()?;

            if average >= config.solved_threshold {
                let solved_in = i_episode as i64 - config.window as i64;
                writeln!(self.out, "\nEnvironment solved in {} episodes!", solved_in)?;
                writeln!(self.out, "\nAverage Score: {:.2}", average)?;
                self.out.flush()?;
                info!("Environment solved in {solved_in} episodes with average score {average:.2}");

                agent.save_checkpoint(&config.checkpoint_path)?;
                info!("Saved checkpoint to {:?}", config.checkpoint_path);
                return Ok(scores);
            }
        }

        warn!(
            "Training ended after {} episodes without reaching an average score of {:.2}",
            config.n_episodes, config.solved_threshold
        );
        Ok(scores)
    }
}

/// Play one training episode and return its total reward
fn run_episode<E, A>(agent: &mut A, env: &mut E, epsilon: f32, max_t: usize) -> f32
where
    E: Environment,
    A: Agent<E>,
{
    let mut state = env.reset();
    let mut score = 0.0;

    for _ in 0..max_t {
        let action = agent.act(&state, epsilon);
        let (next_state, reward, done, _info) = env.step(action.clone());
        agent.step(Exp {
            state,
            action,
            reward,
            next_state: next_state.clone(),
            done,
        });
        state = next_state;
        score += reward;

        if done {
            break;
        }
    }

    score
}

/// Train `agent` in `env` with the given configuration, printing progress to stdout
///
/// See [`Trainer::train`]
pub fn train<E, A>(agent: &mut A, env: &mut E, config: TrainerConfig) -> Result<Vec<f32>>
where
    E: Environment,
    A: Agent<E>,
{
    Trainer::new(config).train(agent, env)
}
