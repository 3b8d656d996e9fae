//! Q-learning agent for the snake environment
//!
//! Provides:
//! - Fixed-layout 0/1 feature observations (11 or 14 values)
//! - A two-layer Q-network on the Burn NdArray backend
//! - One-step bootstrapped Q updates with Adam
//! - FIFO experience replay
//! - Epsilon-greedy agent with linear or exponential exploration decay
//! - Model persistence

pub mod agent;
pub mod backend;
pub mod buffer;
pub mod config;
pub mod network;
pub mod observation;
pub mod persistence;
pub mod trainer;

pub use agent::Agent;
pub use backend::{default_device, InferenceBackend, TrainingBackend};
pub use buffer::{ReplayMemory, Transition};
pub use config::{AgentConfig, ExplorationSchedule};
pub use network::{QNetwork, QNetworkConfig};
pub use observation::{FeatureEncoder, Observation};
pub use persistence::{load_network, save_network, ModelMetadata};
pub use trainer::QTrainer;
