//! Core game logic module for Snake
//!
//! This module contains all the simulation rules without any I/O or rendering
//! dependencies. Rendering and keyboard collaborators only read
//! [`GridEnvironment::state`] and call [`GridEnvironment::steer`].

pub mod action;
pub mod config;
pub mod engine;
pub mod state;

// Re-export commonly used types
pub use action::{Heading, Turn};
pub use config::GridConfig;
pub use engine::{DeathCause, GridEnvironment, StepOutcome, StepResult};
pub use state::{EpisodeState, Position, Snake};
