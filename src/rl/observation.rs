use crate::game::{GridEnvironment, Heading};

/// Observation vector fed to the Q-network
pub type Observation = Vec<f32>;

/// Length without the far-danger triple
pub const BASE_FEATURES: usize = 11;

/// Length with the far-danger triple
pub const FAR_DANGER_FEATURES: usize = 14;

/// Turns the environment state into a fixed-order 0/1 feature vector
///
/// Layout:
/// - danger straight, right, left (one tile ahead, via [`GridEnvironment::is_collision`])
/// - far danger straight, right, left (optional, from [`GridEnvironment::range_scan`])
/// - heading left, right, up, down
/// - food left, right, up, down of the head
///
/// The layout is fixed for the lifetime of a trained network; toggling
/// `far_danger` changes [`FeatureEncoder::len`] and invalidates saved weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureEncoder {
    far_danger: bool,
}

impl FeatureEncoder {
    pub fn new(far_danger: bool) -> Self {
        Self { far_danger }
    }

    pub fn far_danger(&self) -> bool {
        self.far_danger
    }

    /// Number of values produced by [`FeatureEncoder::encode`]
    pub fn len(&self) -> usize {
        if self.far_danger {
            FAR_DANGER_FEATURES
        } else {
            BASE_FEATURES
        }
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn encode(&self, env: &GridEnvironment) -> Observation {
        let mut features = Vec::with_capacity(self.len());

        let state = env.state();
        let head = state.head();
        let tile = env.config().tile_size;

        for heading in env.relative_headings() {
            features.push(flag(env.is_collision(Some(head.stepped(heading, tile, 1)))));
        }

        if self.far_danger {
            features.extend(env.range_scan().iter().map(|&v| f32::from(v)));
        }

        for heading in [Heading::Left, Heading::Right, Heading::Up, Heading::Down] {
            features.push(flag(state.heading == heading));
        }

        let food = state.food;
        features.push(flag(food.x < head.x));
        features.push(flag(food.x > head.x));
        features.push(flag(food.y < head.y));
        features.push(flag(food.y > head.y));

        features
    }
}

fn flag(value: bool) -> f32 {
    if value {
        1.0
    } else {
        0.0
    }
}
