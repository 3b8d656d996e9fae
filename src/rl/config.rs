//! Q-learning hyperparameter configuration

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How the chance of a random move shrinks as episodes accumulate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExplorationSchedule {
    /// ε = `start − episodes`; a move is random when a uniform integer in
    /// `0..=range` falls below ε. Once ε reaches zero exploration stops.
    Linear { start: i64, range: u32 },

    /// ε = `min + (max − min) · exp(−decay_rate · episodes)`
    Exponential { max: f64, min: f64, decay_rate: f64 },
}

impl Default for ExplorationSchedule {
    fn default() -> Self {
        ExplorationSchedule::Linear {
            start: 80,
            range: 200,
        }
    }
}

impl ExplorationSchedule {
    /// The schedule's own ε after `episodes` finished episodes
    ///
    /// For the linear schedule this is the unscaled `start − episodes`, which
    /// goes negative.
    pub fn raw_epsilon(&self, episodes: usize) -> f64 {
        match *self {
            ExplorationSchedule::Linear { start, .. } => (start - episodes as i64) as f64,
            ExplorationSchedule::Exponential {
                max,
                min,
                decay_rate,
            } => min + (max - min) * (-decay_rate * episodes as f64).exp(),
        }
    }

    /// Probability of taking a random move after `episodes` finished episodes
    pub fn probability(&self, episodes: usize) -> f64 {
        match *self {
            ExplorationSchedule::Linear { range, .. } => {
                // P(uniform{0..=range} < ε) for integer ε
                let outcomes = f64::from(range) + 1.0;
                self.raw_epsilon(episodes).clamp(0.0, outcomes) / outcomes
            }
            ExplorationSchedule::Exponential { .. } => {
                self.raw_epsilon(episodes).clamp(0.0, 1.0)
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            ExplorationSchedule::Linear { range, .. } => {
                if range == 0 {
                    return Err(ConfigError::Validation(
                        "agent.exploration.range must be at least 1".into(),
                    ));
                }
            }
            ExplorationSchedule::Exponential {
                max,
                min,
                decay_rate,
            } => {
                if !(0.0..=1.0).contains(&min) || !(0.0..=1.0).contains(&max) {
                    return Err(ConfigError::Validation(format!(
                        "agent.exploration min/max must be in [0, 1], got {min}/{max}"
                    )));
                }
                if min > max {
                    return Err(ConfigError::Validation(
                        "agent.exploration.min must be <= agent.exploration.max".into(),
                    ));
                }
                if decay_rate <= 0.0 {
                    return Err(ConfigError::Validation(format!(
                        "agent.exploration.decay_rate must be positive, got {decay_rate}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Configuration for the Q-learning agent
///
/// Defaults follow the values the training loop was tuned with: γ = 0.9,
/// Adam at 1e-3, 256 hidden units, batches of 1000 replayed transitions.
///
/// # Example
///
/// ```rust
/// use snake_dqn::rl::{AgentConfig, ExplorationSchedule};
///
/// let config = AgentConfig {
///     gamma: 0.8,
///     exploration: ExplorationSchedule::Exponential { max: 1.0, min: 0.01, decay_rate: 0.005 },
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Learning rate for the Adam optimizer
    pub learning_rate: f64,

    /// Discount factor applied to the bootstrapped next-state value
    pub gamma: f32,

    /// Width of the single hidden layer
    pub hidden_size: usize,

    /// Transitions replayed per long-memory update
    pub batch_size: usize,

    /// Replay memory capacity; the oldest transition is evicted beyond this
    pub replay_capacity: usize,

    /// Append the three far-danger values to the observation (14 inputs instead of 11)
    pub far_danger: bool,

    pub exploration: ExplorationSchedule,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1e-3,
            gamma: 0.9,
            hidden_size: 256,
            batch_size: 1000,
            replay_capacity: 100_000,
            far_danger: true,
            exploration: ExplorationSchedule::default(),
        }
    }
}

impl AgentConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.learning_rate <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "agent.learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }

        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(ConfigError::Validation(format!(
                "agent.gamma must be in [0, 1], got {}",
                self.gamma
            )));
        }

        if self.hidden_size == 0 {
            return Err(ConfigError::Validation(
                "agent.hidden_size must be at least 1".into(),
            ));
        }

        if self.batch_size == 0 {
            return Err(ConfigError::Validation(
                "agent.batch_size must be at least 1".into(),
            ));
        }

        if self.replay_capacity == 0 {
            return Err(ConfigError::Validation(
                "agent.replay_capacity must be at least 1".into(),
            ));
        }

        self.exploration.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AgentConfig::default();
        assert_eq!(config.learning_rate, 1e-3);
        assert_eq!(config.gamma, 0.9);
        assert_eq!(config.hidden_size, 256);
        assert_eq!(config.batch_size, 1000);
        assert_eq!(config.replay_capacity, 100_000);
        assert!(config.far_danger);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_negative_learning_rate() {
        let config = AgentConfig {
            learning_rate: -0.1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_gamma_out_of_range() {
        let mut config = AgentConfig::default();
        config.gamma = 1.5;
        assert!(config.validate().is_err());

        config.gamma = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_zero_sizes() {
        for config in [
            AgentConfig {
                hidden_size: 0,
                ..Default::default()
            },
            AgentConfig {
                batch_size: 0,
                ..Default::default()
            },
            AgentConfig {
                replay_capacity: 0,
                ..Default::default()
            },
        ] {
            assert!(config.validate().is_err());
        }
    }

    #[test]
    fn test_linear_schedule() {
        let schedule = ExplorationSchedule::Linear {
            start: 80,
            range: 200,
        };

        assert_eq!(schedule.raw_epsilon(0), 80.0);
        assert!((schedule.probability(0) - 80.0 / 201.0).abs() < 1e-12);
        assert!((schedule.probability(70) - 10.0 / 201.0).abs() < 1e-12);
        assert_eq!(schedule.probability(80), 0.0);

        // Negative ε disables randomness entirely
        assert_eq!(schedule.raw_epsilon(100), -20.0);
        assert_eq!(schedule.probability(100), 0.0);
    }

    #[test]
    fn test_exponential_schedule_decreases_towards_min() {
        let schedule = ExplorationSchedule::Exponential {
            max: 1.0,
            min: 0.01,
            decay_rate: 0.01,
        };

        assert!((schedule.probability(0) - 1.0).abs() < 1e-12);
        let mut previous = schedule.probability(0);
        for episodes in [10, 100, 500, 1000] {
            let eps = schedule.probability(episodes);
            assert!(eps < previous);
            assert!(eps > 0.01);
            previous = eps;
        }
    }

    #[test]
    fn test_exploration_validation() {
        let config = AgentConfig {
            exploration: ExplorationSchedule::Exponential {
                max: 0.1,
                min: 0.5,
                decay_rate: 0.01,
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = AgentConfig {
            exploration: ExplorationSchedule::Linear { start: 80, range: 0 },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_schedule_toml_round_trip() {
        let config = AgentConfig {
            exploration: ExplorationSchedule::Exponential {
                max: 1.0,
                min: 0.05,
                decay_rate: 0.002,
            },
            ..Default::default()
        };
        let text = toml::to_string(&config).unwrap();
        assert!(text.contains("kind = \"exponential\""));
        let parsed: AgentConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
