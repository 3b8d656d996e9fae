use crate::error::ActionError;
use serde::{Deserialize, Serialize};

/// Absolute direction the snake is travelling in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Heading {
    Up,
    Down,
    Left,
    Right,
}

impl Heading {
    /// Clockwise cycle used to resolve relative turns
    pub const CLOCKWISE: [Heading; 4] = [Heading::Right, Heading::Down, Heading::Left, Heading::Up];

    fn cycle_index(self) -> usize {
        match self {
            Heading::Right => 0,
            Heading::Down => 1,
            Heading::Left => 2,
            Heading::Up => 3,
        }
    }

    /// Next heading in the clockwise cycle
    pub fn clockwise(self) -> Heading {
        Self::CLOCKWISE[(self.cycle_index() + 1) % 4]
    }

    /// Previous heading in the clockwise cycle
    pub fn counter_clockwise(self) -> Heading {
        Self::CLOCKWISE[(self.cycle_index() + 3) % 4]
    }

    pub fn opposite(self) -> Heading {
        Self::CLOCKWISE[(self.cycle_index() + 2) % 4]
    }

    /// Returns true if turning from self to other would be a 180-degree turn
    pub fn is_opposite(self, other: Heading) -> bool {
        self.opposite() == other
    }

    /// Unit delta (dx, dy) for one step; y grows downwards
    pub fn delta(self) -> (i32, i32) {
        match self {
            Heading::Up => (0, -1),
            Heading::Down => (0, 1),
            Heading::Left => (-1, 0),
            Heading::Right => (1, 0),
        }
    }
}

/// Relative turn chosen by the agent each tick
///
/// The action space is expressed relative to the current heading, so a
/// reversal cannot be encoded at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Turn {
    /// Keep the current heading
    Straight,
    /// Rotate one step clockwise
    Right,
    /// Rotate one step counter-clockwise
    Left,
}

impl Turn {
    pub const ALL: [Turn; 3] = [Turn::Straight, Turn::Right, Turn::Left];

    /// Number of distinct actions (width of the network output)
    pub const COUNT: usize = 3;

    /// Position of this action in Q-value vectors
    pub fn index(self) -> usize {
        match self {
            Turn::Straight => 0,
            Turn::Right => 1,
            Turn::Left => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Turn> {
        Self::ALL.get(index).copied()
    }

    /// Sparse one-hot encoding `[straight, right, left]`
    pub fn one_hot(self) -> [f32; 3] {
        let mut encoded = [0.0; 3];
        encoded[self.index()] = 1.0;
        encoded
    }

    /// Decode a one-hot vector; anything that is not exactly one 1 among zeros is rejected
    pub fn from_one_hot(encoded: &[f32]) -> Result<Turn, ActionError> {
        if encoded.len() != Self::COUNT {
            return Err(ActionError::InvalidOneHot(encoded.to_vec()));
        }
        let ones: Vec<usize> = encoded
            .iter()
            .enumerate()
            .filter(|(_, v)| **v == 1.0)
            .map(|(i, _)| i)
            .collect();
        let zeros = encoded.iter().filter(|&&v| v == 0.0).count();
        match ones.as_slice() {
            [index] if zeros == Self::COUNT - 1 => Ok(Self::ALL[*index]),
            _ => Err(ActionError::InvalidOneHot(encoded.to_vec())),
        }
    }

    /// Resolve this turn against a heading
    pub fn apply(self, heading: Heading) -> Heading {
        match self {
            Turn::Straight => heading,
            Turn::Right => heading.clockwise(),
            Turn::Left => heading.counter_clockwise(),
        }
    }
}

impl TryFrom<usize> for Turn {
    type Error = ActionError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Turn::from_index(index).ok_or(ActionError::InvalidIndex(index))
    }
}
