//! Epsilon-greedy Q-learning agent
//!
//! The agent owns everything needed to act and learn: the feature encoder,
//! the Q-network with its trainer, and the replay memory. The training loop
//! drives it one tick at a time:
//!
//! ```text
//! obs  = encode(env)
//! turn = select_action(obs)
//! ...  env.step(turn)
//! train_short(transition); remember(transition)
//! on terminal: finish_episode(); train_long()
//! ```

use burn::{module::AutodiffModule, tensor::backend::AutodiffBackend};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;

use super::buffer::{ReplayMemory, Transition};
use super::config::AgentConfig;
use super::network::{argmax, QNetwork, QNetworkConfig};
use super::observation::{FeatureEncoder, Observation};
use super::persistence::{self, ModelMetadata};
use super::trainer::QTrainer;
use crate::error::{ConfigError, PersistenceError};
use crate::game::{GridEnvironment, Turn};

/// Q-learning agent over the three relative turns
///
/// # Example
///
/// ```rust
/// use snake_dqn::game::{GridConfig, GridEnvironment};
/// use snake_dqn::rl::{default_device, Agent, AgentConfig, TrainingBackend};
///
/// let config = AgentConfig { hidden_size: 16, ..Default::default() };
/// let mut agent = Agent::<TrainingBackend>::new(&config, Some(7), default_device()).unwrap();
/// let env = GridEnvironment::new(GridConfig::small(), Some(7)).unwrap();
///
/// let obs = agent.encode(&env);
/// let turn = agent.select_action(&obs);
/// assert_eq!(turn.one_hot().iter().sum::<f32>(), 1.0);
/// ```
pub struct Agent<B: AutodiffBackend> {
    encoder: FeatureEncoder,
    network: QNetwork<B>,
    trainer: QTrainer<B>,
    memory: ReplayMemory,
    config: AgentConfig,

    /// Drives exploration decisions and random moves
    rng: StdRng,

    /// Finished episodes; feeds the exploration schedule
    episodes: usize,

    /// Fixed exploration probability overriding the schedule
    epsilon_override: Option<f64>,

    device: B::Device,
}

impl<B: AutodiffBackend> Agent<B> {
    /// Create an agent with a freshly initialised network
    ///
    /// With a seed, the agent's own rng uses `seed + 1` and the replay memory
    /// `seed + 2`; the environment is expected to use `seed` itself.
    pub fn new(
        config: &AgentConfig,
        seed: Option<u64>,
        device: B::Device,
    ) -> Result<Self, ConfigError> {
        let encoder = FeatureEncoder::new(config.far_danger);
        let network = QNetworkConfig::new(encoder.len(), config.hidden_size).init::<B>(&device);
        Self::from_network(config, network, seed, device)
    }

    /// Create an agent around an existing network
    ///
    /// Fails when the network's input width differs from the encoder length.
    pub fn from_network(
        config: &AgentConfig,
        network: QNetwork<B>,
        seed: Option<u64>,
        device: B::Device,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let encoder = FeatureEncoder::new(config.far_danger);
        if network.input_size() != encoder.len() {
            return Err(ConfigError::DimensionMismatch {
                encoder: encoder.len(),
                network: network.input_size(),
            });
        }

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            encoder,
            network,
            trainer: QTrainer::new(config.learning_rate, config.gamma),
            memory: ReplayMemory::new(config.replay_capacity, seed.map(|s| s.wrapping_add(2))),
            config: config.clone(),
            rng,
            episodes: 0,
            epsilon_override: None,
            device,
        })
    }

    /// Observation of the environment as the network sees it
    pub fn encode(&self, env: &GridEnvironment) -> Observation {
        self.encoder.encode(env)
    }

    /// Probability that the next call to [`Agent::select_action`] picks a random turn
    pub fn exploration_probability(&self) -> f64 {
        match self.epsilon_override {
            Some(epsilon) => epsilon.clamp(0.0, 1.0),
            None => self.config.exploration.probability(self.episodes),
        }
    }

    /// Pin exploration to a fixed probability, or return to the schedule with `None`
    pub fn set_epsilon(&mut self, epsilon: Option<f64>) {
        self.epsilon_override = epsilon;
    }

    /// Epsilon-greedy action selection
    ///
    /// With probability [`Agent::exploration_probability`] a turn is drawn
    /// uniformly from the agent's rng; otherwise the greedy turn is taken.
    ///
    /// # Arguments
    ///
    /// * `observation` - Encoded state, as produced by [`Agent::encode`]
    ///
    /// # Example
    ///
    /// ```rust
    /// use snake_dqn::rl::{default_device, Agent, AgentConfig, TrainingBackend};
    ///
    /// let config = AgentConfig { hidden_size: 8, ..Default::default() };
    /// let mut agent = Agent::<TrainingBackend>::new(&config, Some(1), default_device()).unwrap();
    /// agent.set_epsilon(Some(0.0));
    ///
    /// let obs = vec![0.0; 14];
    /// assert_eq!(agent.select_action(&obs), agent.greedy_action(&obs));
    /// ```
    pub fn select_action(&mut self, observation: &[f32]) -> Turn {
        let explore = self.exploration_probability();
        if self.rng.gen::<f64>() < explore {
            return Turn::ALL[self.rng.gen_range(0..Turn::COUNT)];
        }
        self.greedy_action(observation)
    }

    /// Turn with the highest predicted Q-value; ties go to the lowest index
    pub fn greedy_action(&self, observation: &[f32]) -> Turn {
        let q = self.q_values(observation);
        Turn::ALL[argmax(&q)]
    }

    /// Predicted Q-values for straight, right, left
    pub fn q_values(&self, observation: &[f32]) -> Vec<f32> {
        self.network.valid().q_values(observation, &self.device)
    }

    /// Immediate update on the transition just observed
    pub fn train_short(&mut self, transition: &Transition) -> f32 {
        let (network, loss) =
            self.trainer
                .train_step(self.network.clone(), &[transition], &self.device);
        self.network = network;
        loss.unwrap_or_default()
    }

    /// Update on a batch replayed from memory
    ///
    /// Uses every stored transition when there are no more than `batch_size`
    /// of them. Returns `None` when memory is empty.
    pub fn train_long(&mut self) -> Option<f32> {
        let batch = self.memory.sample(self.config.batch_size);
        let (network, loss) = self
            .trainer
            .train_step(self.network.clone(), &batch, &self.device);
        self.network = network;
        loss
    }

    /// Store a transition for later replay
    pub fn remember(&mut self, transition: Transition) {
        self.memory.push(transition);
    }

    /// Count a finished episode; advances the exploration schedule
    pub fn finish_episode(&mut self) {
        self.episodes += 1;
    }

    /// Finished episodes, including any restored by [`Agent::load`]
    pub fn episodes(&self) -> usize {
        self.episodes
    }

    /// Replay memory fed by [`Agent::remember`]
    pub fn memory(&self) -> &ReplayMemory {
        &self.memory
    }

    pub fn encoder(&self) -> FeatureEncoder {
        self.encoder
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn network(&self) -> &QNetwork<B> {
        &self.network
    }

    /// Gradient steps taken so far, short and long updates combined
    pub fn updates(&self) -> usize {
        self.trainer.updates()
    }

    /// Snapshot the network and its metadata to `path`
    pub fn save(&self, path: &Path, high_score: u32) -> Result<(), PersistenceError> {
        let metadata = ModelMetadata::new(
            QNetworkConfig::new(self.encoder.len(), self.config.hidden_size),
            self.config.clone(),
            self.episodes,
            high_score,
        );
        persistence::save_network(&self.network, &metadata, path)
    }

    /// Replace the network with one saved at `path`
    ///
    /// The episode counter is restored from the metadata so the exploration
    /// schedule continues where it stopped.
    pub fn load(&mut self, path: &Path) -> Result<ModelMetadata, PersistenceError> {
        let (network, metadata) =
            persistence::load_network::<B>(path, Some(self.encoder.len()), &self.device)?;
        self.network = network;
        self.episodes = metadata.episodes_trained;
        Ok(metadata)
    }
}
