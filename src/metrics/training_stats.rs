//! Training statistics for the Q-learning loop
//!
//! Tracks the record score, the all-time mean score and rolling windows over
//! recent episodes and losses.

use std::collections::VecDeque;

/// Episode and loss statistics with rolling averages
///
/// # Example
///
/// ```rust
/// use snake_dqn::metrics::TrainingStats;
///
/// let mut stats = TrainingStats::new(100);
///
/// assert!(stats.record_episode(10.0, 42, 1));
/// assert!(!stats.record_episode(-10.0, 7, 0));
/// stats.record_loss(3.5);
///
/// assert_eq!(stats.high_score(), 1);
/// assert!((stats.mean_score() - 0.5).abs() < 1e-9);
/// println!("{}", stats.format_summary());
/// ```
#[derive(Debug, Clone)]
pub struct TrainingStats {
    /// Episode rewards (rolling window)
    episode_rewards: VecDeque<f32>,

    /// Episode lengths in ticks (rolling window)
    episode_lengths: VecDeque<usize>,

    /// Episode scores (rolling window)
    episode_scores: VecDeque<u32>,

    /// Long-memory losses (rolling window)
    losses: VecDeque<f32>,

    /// Best score seen so far
    high_score: u32,

    /// Sum of every episode's score, for the all-time mean
    total_score: u64,

    total_episodes: usize,
    total_steps: usize,
    window_size: usize,
}

impl TrainingStats {
    /// Create a tracker keeping the last `window_size` values per series
    pub fn new(window_size: usize) -> Self {
        let window_size = window_size.max(1);
        Self {
            episode_rewards: VecDeque::with_capacity(window_size),
            episode_lengths: VecDeque::with_capacity(window_size),
            episode_scores: VecDeque::with_capacity(window_size),
            losses: VecDeque::with_capacity(window_size),
            high_score: 0,
            total_score: 0,
            total_episodes: 0,
            total_steps: 0,
            window_size,
        }
    }

    /// Start from a previously reached record, e.g. when resuming a model
    pub fn with_high_score(mut self, high_score: u32) -> Self {
        self.high_score = high_score;
        self
    }

    /// Record a finished episode
    ///
    /// Returns `true` when `score` beats the previous record.
    pub fn record_episode(&mut self, reward: f32, length: usize, score: u32) -> bool {
        Self::push_deque(&mut self.episode_rewards, reward, self.window_size);
        Self::push_deque(&mut self.episode_lengths, length, self.window_size);
        Self::push_deque(&mut self.episode_scores, score, self.window_size);
        self.total_episodes += 1;
        self.total_steps += length;
        self.total_score += u64::from(score);

        if score > self.high_score {
            self.high_score = score;
            true
        } else {
            false
        }
    }

    /// Record the loss of a training update
    pub fn record_loss(&mut self, loss: f32) {
        Self::push_deque(&mut self.losses, loss, self.window_size);
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    /// Mean score over every episode recorded so far
    pub fn mean_score(&self) -> f64 {
        if self.total_episodes == 0 {
            0.0
        } else {
            self.total_score as f64 / self.total_episodes as f64
        }
    }

    /// Mean score over the rolling window
    pub fn recent_mean_score(&self) -> f32 {
        let sum: u32 = self.episode_scores.iter().sum();
        if self.episode_scores.is_empty() {
            0.0
        } else {
            sum as f32 / self.episode_scores.len() as f32
        }
    }

    pub fn mean_episode_reward(&self) -> f32 {
        Self::mean(&self.episode_rewards)
    }

    pub fn mean_episode_length(&self) -> f32 {
        let sum: usize = self.episode_lengths.iter().sum();
        if self.episode_lengths.is_empty() {
            0.0
        } else {
            sum as f32 / self.episode_lengths.len() as f32
        }
    }

    pub fn mean_loss(&self) -> f32 {
        Self::mean(&self.losses)
    }

    pub fn total_episodes(&self) -> usize {
        self.total_episodes
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// One-line summary of the current statistics
    pub fn format_summary(&self) -> String {
        format!(
            "Episodes: {} | Steps: {} | Record: {} | Mean: {:.2} | Recent: {:.2} | Reward: {:.2} | Len: {:.1} | Loss: {:.4}",
            self.total_episodes,
            self.total_steps,
            self.high_score,
            self.mean_score(),
            self.recent_mean_score(),
            self.mean_episode_reward(),
            self.mean_episode_length(),
            self.mean_loss(),
        )
    }

    fn mean(deque: &VecDeque<f32>) -> f32 {
        if deque.is_empty() {
            0.0
        } else {
            deque.iter().sum::<f32>() / deque.len() as f32
        }
    }

    fn push_deque<T>(deque: &mut VecDeque<T>, value: T, window_size: usize) {
        if deque.len() >= window_size {
            deque.pop_front();
        }
        deque.push_back(value);
    }
}
