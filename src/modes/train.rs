//! Self-play training loop
//!
//! One tick of training runs the agent for a single environment step and
//! learns from it immediately; finished episodes additionally trigger a
//! replayed batch update and, on a new record score, a model snapshot.
//!
//! # Example
//!
//! ```rust,no_run
//! use snake_dqn::config::AppConfig;
//! use snake_dqn::modes::TrainMode;
//! use snake_dqn::rl::{default_device, TrainingBackend};
//!
//! let mut config = AppConfig::default();
//! config.training.max_episodes = Some(500);
//!
//! let mut train_mode = TrainMode::<TrainingBackend>::new(config, default_device())?;
//! let report = train_mode.run();
//! println!("record {} after {} games", report.high_score, report.episodes);
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{Context, Result};
use burn::tensor::backend::AutodiffBackend;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::game::GridEnvironment;
use crate::metrics::TrainingStats;
use crate::rl::{Agent, Transition};

/// What happened in an episode that just ended
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeSummary {
    /// Episodes finished by the agent, including any restored from a saved model
    pub episode: usize,
    pub score: u32,
    pub reward: f32,
    pub ticks: usize,
    pub high_score: u32,
    /// All-time mean score of this run
    pub mean_score: f64,
    pub new_record: bool,
    /// Loss of the replayed batch update
    pub loss: Option<f32>,
}

/// Totals at the end of [`TrainMode::run`]
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    pub episodes: usize,
    pub total_steps: usize,
    pub high_score: u32,
    pub mean_score: f64,
}

/// Training mode for the Q-learning agent
pub struct TrainMode<B: AutodiffBackend> {
    agent: Agent<B>,
    env: GridEnvironment,
    stats: TrainingStats,
    config: AppConfig,

    /// Reward accumulated in the running episode
    episode_reward: f32,

    /// Ticks taken in the running episode
    episode_ticks: usize,
}

impl<B: AutodiffBackend> TrainMode<B> {
    /// Build the environment and agent, restoring a saved model if configured
    pub fn new(config: AppConfig, device: B::Device) -> Result<Self> {
        config.validate().context("invalid configuration")?;

        let seed = config.training.seed;
        if let Some(seed) = seed {
            B::seed(seed);
        }

        let env = GridEnvironment::new(config.grid.clone(), seed)
            .context("failed to create environment")?;
        let mut agent =
            Agent::new(&config.agent, seed, device).context("failed to create agent")?;

        let mut stats = TrainingStats::new(config.training.stats_window);
        if let Some(path) = &config.training.resume_from {
            let metadata = agent
                .load(path)
                .with_context(|| format!("failed to resume from {}", path.display()))?;
            info!(
                path = %path.display(),
                episodes = metadata.episodes_trained,
                high_score = metadata.high_score,
                "resumed model"
            );
            stats = stats.with_high_score(metadata.high_score);
        }

        Ok(Self {
            agent,
            env,
            stats,
            config,
            episode_reward: 0.0,
            episode_ticks: 0,
        })
    }

    /// Train until `max_episodes` episodes have finished
    ///
    /// Without a limit this only returns if the process is stopped.
    pub fn run(&mut self) -> TrainingReport {
        info!(
            grid = %format!("{}x{}", self.config.grid.columns(), self.config.grid.rows()),
            inputs = self.agent.encoder().len(),
            learning_rate = self.config.agent.learning_rate,
            gamma = self.config.agent.gamma,
            max_episodes = ?self.config.training.max_episodes,
            model_path = %self.config.training.model_path.display(),
            "starting training"
        );

        while !self.finished() {
            self.run_tick();
        }

        let report = self.report();
        info!("training complete: {}", self.stats.format_summary());
        report
    }

    /// Advance training by one environment step
    ///
    /// Returns a summary when the step ended an episode; the environment has
    /// already been reset for the next one by then.
    pub fn run_tick(&mut self) -> Option<EpisodeSummary> {
        let observation = self.agent.encode(&self.env);
        let action = self.agent.select_action(&observation);
        let result = self.env.step(action);
        let next_observation = self.agent.encode(&self.env);

        let transition = Transition::new(
            observation,
            action,
            result.reward,
            next_observation,
            result.terminal,
        );
        self.agent.train_short(&transition);
        self.agent.remember(transition);

        self.episode_reward += result.reward;
        self.episode_ticks += 1;

        if !result.terminal {
            return None;
        }

        self.env.reset();
        self.agent.finish_episode();
        let loss = self.agent.train_long();
        if let Some(loss) = loss {
            self.stats.record_loss(loss);
        }

        let new_record =
            self.stats
                .record_episode(self.episode_reward, self.episode_ticks, result.score);
        if new_record {
            info!(score = result.score, "new high score");
            self.persist_record(result.score);
        }

        let summary = EpisodeSummary {
            episode: self.agent.episodes(),
            score: result.score,
            reward: self.episode_reward,
            ticks: self.episode_ticks,
            high_score: self.stats.high_score(),
            mean_score: self.stats.mean_score(),
            new_record,
            loss,
        };
        self.episode_reward = 0.0;
        self.episode_ticks = 0;

        info!(
            game = summary.episode,
            score = summary.score,
            record = summary.high_score,
            mean_score = summary.mean_score,
            "episode finished"
        );
        if self.stats.total_episodes() % self.config.training.log_frequency == 0 {
            info!("{}", self.stats.format_summary());
        }

        Some(summary)
    }

    /// Save the model for a new record; failures are logged and training goes on
    fn persist_record(&self, score: u32) -> bool {
        let path = &self.config.training.model_path;
        match self.agent.save(path, score) {
            Ok(()) => {
                info!(path = %path.display(), score, "model saved");
                true
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to save model");
                false
            }
        }
    }

    fn finished(&self) -> bool {
        self.config
            .training
            .max_episodes
            .is_some_and(|max| self.stats.total_episodes() >= max)
    }

    pub fn report(&self) -> TrainingReport {
        TrainingReport {
            episodes: self.stats.total_episodes(),
            total_steps: self.stats.total_steps(),
            high_score: self.stats.high_score(),
            mean_score: self.stats.mean_score(),
        }
    }

    pub fn env(&self) -> &GridEnvironment {
        &self.env
    }

    pub fn agent(&self) -> &Agent<B> {
        &self.agent
    }

    pub fn agent_mut(&mut self) -> &mut Agent<B> {
        &mut self.agent
    }

    pub fn stats(&self) -> &TrainingStats {
        &self.stats
    }
}
