//! Snake DQN - a snake game that learns to play itself
//!
//! This library provides:
//! - Core game logic on a tile grid (game module)
//! - Feature encoding, Q-network, replay memory and agent (rl module)
//! - Training statistics (metrics module)
//! - The self-play training loop (modes module)
//! - TOML configuration and error types

pub mod config;
pub mod error;
pub mod game;
pub mod metrics;
pub mod modes;
pub mod rl;
