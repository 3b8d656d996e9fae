use serde::{Deserialize, Serialize};

use super::action::Heading;

/// A cell on the game grid, in the same units as the grid bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Move position by delta
    pub fn moved_by(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Move `steps` tiles of size `tile` in a heading
    pub fn stepped(&self, heading: Heading, tile: i32, steps: i32) -> Self {
        let (dx, dy) = heading.delta();
        self.moved_by(dx * tile * steps, dy * tile * steps)
    }
}

/// The snake in the game
#[derive(Debug, Clone, PartialEq)]
pub struct Snake {
    /// Body segments, with head at index 0
    pub body: Vec<Position>,
}

impl Snake {
    /// A one-cell snake
    pub fn new(head: Position) -> Self {
        Self { body: vec![head] }
    }

    /// Build a snake from explicit segments, head first
    ///
    /// # Panics
    ///
    /// Panics if `body` is empty.
    pub fn from_segments(body: Vec<Position>) -> Self {
        assert!(!body.is_empty(), "a snake has at least one segment");
        Self { body }
    }

    /// Get the head position
    pub fn head(&self) -> Position {
        self.body[0]
    }

    /// Get body segments (excluding head)
    pub fn body_segments(&self) -> &[Position] {
        &self.body[1..]
    }

    /// Check if position collides with snake body (excluding head)
    pub fn collides_with_body(&self, pos: Position) -> bool {
        self.body_segments().contains(&pos)
    }

    pub fn occupies(&self, pos: Position) -> bool {
        self.body.contains(&pos)
    }

    /// Put a new head in front of the current one
    pub fn push_head(&mut self, head: Position) {
        self.body.insert(0, head);
    }

    /// Drop the last segment
    pub fn drop_tail(&mut self) {
        if self.body.len() > 1 {
            self.body.pop();
        }
    }

    /// Get the length of the snake
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Check if the snake is empty (never true for a constructed snake)
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Complete state of one episode
///
/// Replaced wholesale on every reset.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeState {
    pub snake: Snake,
    pub food: Position,
    pub heading: Heading,
    /// Food eaten this episode
    pub score: u32,
    /// Ticks since reset
    pub frame: u32,
    /// Cleared on the tick that ends the episode
    pub is_alive: bool,
}

impl EpisodeState {
    /// Create a fresh episode state heading right
    pub fn new(snake: Snake, food: Position) -> Self {
        Self {
            snake,
            food,
            heading: Heading::Right,
            score: 0,
            frame: 0,
            is_alive: true,
        }
    }

    pub fn with_heading(mut self, heading: Heading) -> Self {
        self.heading = heading;
        self
    }

    pub fn head(&self) -> Position {
        self.snake.head()
    }
}
