use super::{
    action::{Heading, Turn},
    config::GridConfig,
    state::{EpisodeState, Position, Snake},
};
use crate::error::ConfigError;
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::debug;

/// Why an episode ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathCause {
    /// Head left the grid
    Wall,
    /// Head landed on another segment
    SelfCollision,
    /// Frame counter outran `stall_factor × length`
    Stalled,
}

/// What happened during one tick; exactly one per step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Tail dropped, length unchanged
    Moved,
    /// Food eaten, snake grew by one
    Ate,
    /// Episode over
    Died(DeathCause),
}

/// Result of a game step
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    /// Reward for this step (for RL training)
    pub reward: f32,
    /// Whether the episode has terminated
    pub terminal: bool,
    /// Score after the step
    pub score: u32,
    pub outcome: StepOutcome,
}

/// Deterministic snake simulation on a rectangular grid
///
/// Owns the episode state and its random source. Food placement is the only
/// consumer of randomness, so two environments built from the same config and
/// seed replay identically under the same turns.
pub struct GridEnvironment {
    config: GridConfig,
    state: EpisodeState,
    rng: StdRng,
}

impl GridEnvironment {
    /// Create an environment and start the first episode
    pub fn new(config: GridConfig, seed: Option<u64>) -> Result<Self, ConfigError> {
        config.validate()?;

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let start = config.start;
        let mut env = Self {
            state: EpisodeState::new(Snake::new(start), start),
            config,
            rng,
        };
        env.reset();
        Ok(env)
    }

    /// Start a new episode: 1-cell snake on the start cell heading right
    pub fn reset(&mut self) -> &EpisodeState {
        let start = self.config.start;
        self.state = EpisodeState::new(Snake::new(start), start);
        // A validated grid always has a free cell next to a 1-cell snake.
        if let Some(food) = self.place_food() {
            self.state.food = food;
        }
        &self.state
    }

    /// Advance one tick with a relative turn
    ///
    /// The turn is resolved against the current heading, the new head is
    /// prepended and the frame counter advances. The episode then ends if the
    /// head left the grid, landed on the body, or the frame counter exceeds
    /// `stall_factor × length`; otherwise the snake either eats (grows, new
    /// food) or drops its tail.
    ///
    /// # Arguments
    ///
    /// * `turn` - Straight, right (clockwise) or left (counter-clockwise)
    ///
    /// # Returns
    ///
    /// The reward, whether the episode is over, the score after the tick and
    /// which of the three outcomes happened. Stepping a finished episode
    /// changes nothing and reports reward 0.
    ///
    /// # Example
    ///
    /// ```rust
    /// use snake_dqn::game::{GridConfig, GridEnvironment, Position, StepOutcome, Turn};
    ///
    /// let config = GridConfig::new(3, 3, 1).with_start(Position::new(0, 0));
    /// let mut env = GridEnvironment::new(config, Some(0)).unwrap();
    /// env.set_food(Position::new(2, 0));
    ///
    /// assert_eq!(env.step(Turn::Straight).outcome, StepOutcome::Moved);
    /// let ate = env.step(Turn::Straight);
    /// assert_eq!((ate.reward, ate.score), (10.0, 1));
    /// assert!(env.step(Turn::Straight).terminal);
    /// ```
    pub fn step(&mut self, turn: Turn) -> StepResult {
        if !self.state.is_alive {
            return StepResult {
                reward: 0.0,
                terminal: true,
                score: self.state.score,
                outcome: StepOutcome::Died(self.death_cause().unwrap_or(DeathCause::Stalled)),
            };
        }

        let heading = turn.apply(self.state.heading);
        self.state.heading = heading;

        let new_head = self.state.head().stepped(heading, self.config.tile_size, 1);
        self.state.snake.push_head(new_head);
        self.state.frame += 1;

        // The illegal head stays on the snake so callers can see where it died.
        if let Some(cause) = self.death_cause() {
            self.state.is_alive = false;
            debug!(?cause, score = self.state.score, frame = self.state.frame, "episode ended");
            return StepResult {
                reward: self.config.death_penalty,
                terminal: true,
                score: self.state.score,
                outcome: StepOutcome::Died(cause),
            };
        }

        if new_head == self.state.food {
            self.state.score += 1;
            match self.place_food() {
                Some(food) => self.state.food = food,
                // Board full: every neighbour of the head is now fatal.
                None => debug!(length = self.state.snake.len(), "no free cell left for food"),
            }
            StepResult {
                reward: self.config.food_reward,
                terminal: false,
                score: self.state.score,
                outcome: StepOutcome::Ate,
            }
        } else {
            self.state.snake.drop_tail();
            StepResult {
                reward: self.config.step_reward,
                terminal: false,
                score: self.state.score,
                outcome: StepOutcome::Moved,
            }
        }
    }

    /// Absolute-heading control for keyboard-style collaborators
    ///
    /// A request to reverse is ignored. Returns the heading in effect afterwards.
    pub fn steer(&mut self, requested: Heading) -> Heading {
        if !self.state.heading.is_opposite(requested) {
            self.state.heading = requested;
        }
        self.state.heading
    }

    /// Draw a free cell uniformly at random
    ///
    /// Returns `None` only when the snake covers every cell.
    pub fn place_food(&mut self) -> Option<Position> {
        let cells = self.config.cell_count();
        if self.state.snake.len() >= cells {
            return None;
        }

        loop {
            let pos = self.config.cell_at(self.rng.gen_range(0..cells));
            if !self.state.snake.occupies(pos) {
                return Some(pos);
            }
        }
    }

    /// Out of bounds, or on the snake excluding its head
    ///
    /// Tests the current head when `pos` is `None`.
    pub fn is_collision(&self, pos: Option<Position>) -> bool {
        let pos = pos.unwrap_or_else(|| self.state.head());
        !self.config.contains(pos) || self.state.snake.collides_with_body(pos)
    }

    fn death_cause(&self) -> Option<DeathCause> {
        let head = self.state.head();
        if !self.config.contains(head) {
            return Some(DeathCause::Wall);
        }
        if self.state.snake.collides_with_body(head) {
            return Some(DeathCause::SelfCollision);
        }
        let limit = u64::from(self.config.stall_factor) * self.state.snake.len() as u64;
        if u64::from(self.state.frame) > limit {
            return Some(DeathCause::Stalled);
        }
        None
    }

    /// Headings for the straight, right and left rays of the current heading
    pub fn relative_headings(&self) -> [Heading; 3] {
        let heading = self.state.heading;
        [heading, heading.clockwise(), heading.counter_clockwise()]
    }

    /// Raw ray lengths `[straight, right, left]` from the head
    ///
    /// Each count starts at 1 and grows by one per free in-bounds cell until a
    /// body cell or the boundary is reached.
    pub fn range_counts(&self) -> [u32; 3] {
        let head = self.state.head();
        self.relative_headings().map(|heading| {
            let mut count = 1;
            let mut cell = head.stepped(heading, self.config.tile_size, 1);
            while self.config.contains(cell) && !self.state.snake.collides_with_body(cell) {
                count += 1;
                cell = cell.stepped(heading, self.config.tile_size, 1);
            }
            count
        })
    }

    /// Far-danger heuristic: 1 for the direction(s) tied for most open, else 0
    pub fn range_scan(&self) -> [u8; 3] {
        let counts = self.range_counts();
        let max = counts.iter().copied().max().unwrap_or(1).max(1);
        counts.map(|count| (count / max) as u8)
    }

    /// Read-only snapshot for renderers and other collaborators
    pub fn state(&self) -> &EpisodeState {
        &self.state
    }

    /// Replace the episode state (scenario setup, restoring snapshots)
    pub fn set_state(&mut self, state: EpisodeState) {
        self.state = state;
    }

    /// Move the food; the cell is not checked against the snake
    pub fn set_food(&mut self, food: Position) {
        self.state.food = food;
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn snake(&self) -> &Snake {
        &self.state.snake
    }

    pub fn food(&self) -> Position {
        self.state.food
    }

    pub fn heading(&self) -> Heading {
        self.state.heading
    }

    pub fn score(&self) -> u32 {
        self.state.score
    }

    /// Ticks since the last reset
    pub fn frame(&self) -> u32 {
        self.state.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn env_with(config: GridConfig, snake: Vec<Position>, heading: Heading) -> GridEnvironment {
        let mut env = GridEnvironment::new(config, Some(7)).unwrap();
        let food = env.food();
        env.set_state(EpisodeState::new(Snake::from_segments(snake), food).with_heading(heading));
        env
    }

    #[test]
    fn test_reset() {
        let mut env = GridEnvironment::new(GridConfig::default(), Some(1)).unwrap();
        let state = env.reset();

        assert!(state.is_alive);
        assert_eq!(state.score, 0);
        assert_eq!(state.frame, 0);
        assert_eq!(state.heading, Heading::Right);
        assert_eq!(state.snake.body, vec![Position::new(600, 200)]);
        assert_ne!(state.food, Position::new(600, 200));
    }

    #[test]
    fn test_reset_twice_is_fresh() {
        let mut env = GridEnvironment::new(GridConfig::small(), Some(3)).unwrap();
        for _ in 0..5 {
            env.step(Turn::Straight);
        }
        env.set_food(env.state().head());

        for _ in 0..2 {
            let state = env.reset().clone();
            assert_eq!(state.score, 0);
            assert_eq!(state.frame, 0);
            assert_eq!(state.snake.len(), 1);
            assert!(state.is_alive);
        }
    }

    #[test]
    fn test_basic_movement() {
        let mut env = GridEnvironment::new(GridConfig::small(), Some(2)).unwrap();
        env.set_food(Position::new(0, 0));
        let initial_head = env.state().head();

        let result = env.step(Turn::Straight);

        assert!(!result.terminal);
        assert_eq!(result.outcome, StepOutcome::Moved);
        assert_eq!(result.reward, 0.0);
        assert_eq!(env.frame(), 1);
        assert_eq!(env.state().head(), initial_head.moved_by(1, 0));
        assert_eq!(env.snake().len(), 1);
    }

    #[test]
    fn test_turns_resolve_against_heading() {
        let mut env = GridEnvironment::new(GridConfig::small(), Some(2)).unwrap();
        env.set_food(Position::new(0, 0));
        let start = env.state().head();

        env.step(Turn::Right);
        assert_eq!(env.heading(), Heading::Down);
        assert_eq!(env.state().head(), start.moved_by(0, 1));

        env.step(Turn::Left);
        assert_eq!(env.heading(), Heading::Right);
        assert_eq!(env.state().head(), start.moved_by(1, 1));
    }

    #[test]
    fn test_food_consumption() {
        let mut env = GridEnvironment::new(GridConfig::small(), Some(4)).unwrap();

        // Place food directly in front of snake
        let head = env.state().head();
        env.set_food(head.moved_by(1, 0));

        let result = env.step(Turn::Straight);

        assert_eq!(result.outcome, StepOutcome::Ate);
        assert_eq!(result.reward, 10.0);
        assert_eq!(result.score, 1);
        assert_eq!(env.snake().len(), 2);
        assert!(!env.snake().occupies(env.food()));
    }

    #[test]
    fn test_wall_collision() {
        let config = GridConfig::new(10, 10, 1);
        let mut env = env_with(config, vec![Position::new(9, 5)], Heading::Right);

        let result = env.step(Turn::Straight);

        assert!(result.terminal);
        assert_eq!(result.reward, -10.0);
        assert_eq!(result.score, 0);
        assert_eq!(result.outcome, StepOutcome::Died(DeathCause::Wall));
        assert!(!env.state().is_alive);
        // Illegal head is kept for inspection
        assert_eq!(env.state().head(), Position::new(10, 5));
        assert!(env.is_collision(None));
    }

    #[test]
    fn test_self_collision_closed_loop() {
        // 2x2 loop: head (1,1) came from (0,1); turning left heads up into (1,0)
        let config = GridConfig::new(5, 5, 1);
        let mut env = env_with(
            config,
            vec![
                Position::new(1, 1),
                Position::new(0, 1),
                Position::new(0, 0),
                Position::new(1, 0),
            ],
            Heading::Right,
        );
        env.set_food(Position::new(4, 4));

        let result = env.step(Turn::Left);

        assert!(result.terminal);
        assert_eq!(result.reward, -10.0);
        assert_eq!(result.outcome, StepOutcome::Died(DeathCause::SelfCollision));
        assert_eq!(env.state().head(), Position::new(1, 0));
    }

    #[test]
    fn test_stall_guard() {
        let mut config = GridConfig::new(4, 4, 1);
        config.stall_factor = 2;
        let mut env = env_with(config, vec![Position::new(0, 0)], Heading::Right);
        env.set_food(Position::new(3, 3));

        // Circle in the top-left 2x2 block. The limit is checked after the new
        // head is prepended, so it is 2 × 2: frame 4 survives, frame 5 stalls.
        let turns = [Turn::Straight, Turn::Right, Turn::Right, Turn::Right, Turn::Right];
        let results: Vec<StepResult> = turns.iter().map(|&t| env.step(t)).collect();

        for result in &results[..4] {
            assert_eq!(result.outcome, StepOutcome::Moved);
        }
        assert_eq!(env.frame(), 5);
        assert_eq!(results[4].outcome, StepOutcome::Died(DeathCause::Stalled));
        assert_eq!(results[4].reward, -10.0);
        assert!(results[4].terminal);
    }

    #[test]
    fn test_terminated_episode_no_update() {
        let config = GridConfig::new(10, 10, 1);
        let mut env = env_with(config, vec![Position::new(9, 5)], Heading::Right);
        env.step(Turn::Straight);
        let frame_before = env.frame();
        let snake_before = env.snake().clone();

        let result = env.step(Turn::Straight);

        assert!(result.terminal);
        assert_eq!(result.reward, 0.0);
        assert_eq!(env.frame(), frame_before);
        assert_eq!(env.snake(), &snake_before);
    }

    #[test]
    fn test_exactly_one_outcome_per_tick() {
        let mut env = GridEnvironment::new(GridConfig::new(6, 6, 1), Some(11)).unwrap();
        let mut rng = StdRng::seed_from_u64(5);

        for _ in 0..2000 {
            let before = env.snake().len();
            let score_before = env.score();
            let turn = Turn::ALL[rng.gen_range(0..3)];
            let result = env.step(turn);
            let after = env.snake().len();

            match result.outcome {
                StepOutcome::Ate => {
                    assert!(!result.terminal);
                    assert_eq!(after, before + 1);
                    assert_eq!(result.score, score_before + 1);
                }
                StepOutcome::Moved => {
                    assert!(!result.terminal);
                    assert_eq!(after, before);
                }
                StepOutcome::Died(_) => {
                    assert!(result.terminal);
                    assert_eq!(result.score, score_before);
                    env.reset();
                    continue;
                }
            }

            // Until death, segments are pairwise distinct
            let unique: HashSet<_> = env.snake().body.iter().collect();
            assert_eq!(unique.len(), env.snake().len());
        }
    }

    #[test]
    fn test_place_food_avoids_snake() {
        let config = GridConfig::new(4, 4, 10);
        let body: Vec<Position> = (0..12).map(|i| config.cell_at(i)).collect();
        let mut env = env_with(config, body, Heading::Right);

        for _ in 0..500 {
            let food = env.place_food().unwrap();
            assert!(!env.snake().occupies(food));
            assert!(env.config().contains(food));
            assert_eq!(food.x % 10, 0);
            assert_eq!(food.y % 10, 0);
        }
    }

    #[test]
    fn test_place_food_on_full_board() {
        let config = GridConfig::new(2, 1, 1).with_start(Position::new(0, 0));
        let mut env = env_with(
            config,
            vec![Position::new(1, 0), Position::new(0, 0)],
            Heading::Right,
        );
        assert_eq!(env.place_food(), None);
    }

    #[test]
    fn test_is_collision_probe() {
        let config = GridConfig::new(5, 5, 1);
        let env = env_with(
            config,
            vec![Position::new(2, 2), Position::new(1, 2), Position::new(1, 3)],
            Heading::Right,
        );

        assert!(!env.is_collision(None));
        assert!(!env.is_collision(Some(Position::new(3, 2))));
        assert!(env.is_collision(Some(Position::new(1, 2))));
        assert!(env.is_collision(Some(Position::new(5, 2))));
        assert!(env.is_collision(Some(Position::new(2, -1))));
    }

    #[test]
    fn test_range_scan_open_board() {
        // Head at (1, 2) heading right on a 5x5 grid: straight has 3 free cells,
        // right (down) 2, left (up) 2.
        let config = GridConfig::new(5, 5, 1);
        let env = env_with(config, vec![Position::new(1, 2)], Heading::Right);

        assert_eq!(env.range_counts(), [4, 3, 3]);
        assert_eq!(env.range_scan(), [1, 0, 0]);
    }

    #[test]
    fn test_range_scan_body_blocks_ray() {
        let config = GridConfig::new(5, 5, 1);
        let env = env_with(
            config,
            vec![
                Position::new(2, 2),
                Position::new(2, 3),
                Position::new(3, 3),
                Position::new(3, 2),
            ],
            Heading::Up,
        );

        // Up: (2,1), (2,0) free. Right: (3,2) is body. Left: (1,2), (0,2) free.
        assert_eq!(env.range_counts(), [3, 1, 3]);
        assert_eq!(env.range_scan(), [1, 0, 1]);
    }

    #[test]
    fn test_range_scan_properties() {
        let mut env = GridEnvironment::new(GridConfig::new(8, 8, 1), Some(21)).unwrap();
        let mut rng = StdRng::seed_from_u64(9);

        for _ in 0..1000 {
            let counts = env.range_counts();
            let scan = env.range_scan();
            assert!(counts.iter().all(|&c| c >= 1));
            assert!(scan.iter().all(|&v| v <= 1));
            assert!(scan.contains(&1));

            let result = env.step(Turn::ALL[rng.gen_range(0..3)]);
            if result.terminal {
                env.reset();
            }
        }
    }

    #[test]
    fn test_steer_rejects_reversal() {
        let mut env = GridEnvironment::new(GridConfig::small(), Some(1)).unwrap();
        assert_eq!(env.heading(), Heading::Right);

        // Try to turn 180 degrees (should be ignored)
        assert_eq!(env.steer(Heading::Left), Heading::Right);
        assert_eq!(env.steer(Heading::Up), Heading::Up);
        assert_eq!(env.steer(Heading::Down), Heading::Up);
        assert_eq!(env.steer(Heading::Left), Heading::Left);
    }

    #[test]
    fn test_seeded_environments_agree() {
        let mut a = GridEnvironment::new(GridConfig::new(6, 6, 1), Some(99)).unwrap();
        let mut b = GridEnvironment::new(GridConfig::new(6, 6, 1), Some(99)).unwrap();

        for i in 0..300 {
            let turn = Turn::ALL[i % 3];
            assert_eq!(a.step(turn), b.step(turn));
            assert_eq!(a.state(), b.state());
            if a.state().is_alive {
                continue;
            }
            a.reset();
            b.reset();
        }
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = GridConfig::new(1, 1, 1).with_start(Position::new(0, 0));
        assert!(GridEnvironment::new(config, None).is_err());
    }
}
