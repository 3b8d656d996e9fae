use serde::{Deserialize, Serialize};

use super::state::Position;
use crate::error::ConfigError;

/// Geometry and reward constants of the grid
///
/// Bounds are half-open, `[x_min, x_max) × [y_min, y_max)`, and every bound as
/// well as the start cell must be a multiple of `tile_size`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Size of one tile; the snake advances this far per tick
    pub tile_size: i32,
    pub x_min: i32,
    pub x_max: i32,
    pub y_min: i32,
    pub y_max: i32,
    /// Cell the 1-cell snake starts on after every reset
    pub start: Position,

    // Rewards (for RL)
    /// Reward for eating food
    pub food_reward: f32,
    /// Reward for a tick that neither eats nor dies
    pub step_reward: f32,
    /// Penalty for dying (wall, self, or stalling)
    pub death_penalty: f32,
    /// An episode ends once the frame counter exceeds `stall_factor × snake length`
    pub stall_factor: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            tile_size: 40,
            x_min: 400,
            x_max: 1200,
            y_min: 0,
            y_max: 800,
            start: Position::new(600, 200),
            food_reward: 10.0,
            step_reward: 0.0,
            death_penalty: -10.0,
            stall_factor: 100,
        }
    }
}

impl GridConfig {
    /// Grid of `width × height` tiles with its origin at (0, 0)
    ///
    /// The snake starts on the tile nearest the centre.
    pub fn new(width: i32, height: i32, tile_size: i32) -> Self {
        Self {
            tile_size,
            x_min: 0,
            x_max: width * tile_size,
            y_min: 0,
            y_max: height * tile_size,
            start: Position::new((width / 2) * tile_size, (height / 2) * tile_size),
            ..Default::default()
        }
    }

    /// Create a small grid for testing
    pub fn small() -> Self {
        Self::new(10, 10, 1)
    }

    pub fn with_start(mut self, start: Position) -> Self {
        self.start = start;
        self
    }

    /// Number of tile columns
    pub fn columns(&self) -> i32 {
        (self.x_max - self.x_min) / self.tile_size
    }

    /// Number of tile rows
    pub fn rows(&self) -> i32 {
        (self.y_max - self.y_min) / self.tile_size
    }

    pub fn cell_count(&self) -> usize {
        (self.columns().max(0) as usize) * (self.rows().max(0) as usize)
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= self.x_min && pos.x < self.x_max && pos.y >= self.y_min && pos.y < self.y_max
    }

    /// Position of the `index`-th cell in row-major order
    pub fn cell_at(&self, index: usize) -> Position {
        let columns = self.columns() as usize;
        let col = (index % columns) as i32;
        let row = (index / columns) as i32;
        Position::new(
            self.x_min + col * self.tile_size,
            self.y_min + row * self.tile_size,
        )
    }

    /// Check that the geometry describes a usable, tile-aligned grid
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tile_size <= 0 {
            return Err(ConfigError::Validation(format!(
                "grid.tile_size must be positive, got {}",
                self.tile_size
            )));
        }

        let aligned = [self.x_min, self.x_max, self.y_min, self.y_max]
            .iter()
            .all(|bound| bound % self.tile_size == 0);
        if !aligned {
            return Err(ConfigError::Validation(format!(
                "grid bounds must be multiples of tile_size {}",
                self.tile_size
            )));
        }

        if self.x_max <= self.x_min || self.y_max <= self.y_min {
            return Err(ConfigError::Validation(
                "grid bounds must describe a non-empty rectangle".into(),
            ));
        }

        if !self.contains(self.start)
            || self.start.x % self.tile_size != 0
            || self.start.y % self.tile_size != 0
        {
            return Err(ConfigError::Validation(format!(
                "grid.start ({}, {}) must be a tile inside the grid",
                self.start.x, self.start.y
            )));
        }

        // The starting snake plus one food cell must fit.
        let cells = self.cell_count();
        if cells < 2 {
            return Err(ConfigError::GridTooSmall { cells, max_len: 1 });
        }

        if self.stall_factor == 0 {
            return Err(ConfigError::Validation(
                "grid.stall_factor must be at least 1".into(),
            ));
        }

        Ok(())
    }
}
