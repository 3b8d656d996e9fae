//! One-step bootstrapped Q-value update
//!
//! For every transition the target row is the current prediction with only
//! the taken action's entry replaced by
//!
//! ```text
//! r                          if terminal
//! r + γ · max_a' Q(s', a')   otherwise
//! ```
//!
//! and one Adam step is taken on the mean squared error between prediction and
//! target over the whole `[batch, 3]` matrix. The bootstrap uses the same
//! parameters that are being updated; there is no frozen target network.
//! Targets are built outside the autodiff graph, so the update is
//! semi-gradient.

use burn::{
    module::AutodiffModule,
    optim::{adaptor::OptimizerAdaptor, Adam, AdamConfig, GradientsParams, Optimizer},
    tensor::{backend::AutodiffBackend, ElementConversion, Tensor, TensorData},
};
use tracing::debug;

use super::buffer::Transition;
use super::network::{batch_tensor, QNetwork};
use crate::game::Turn;

/// Applies the Q-learning update rule with an Adam optimizer
pub struct QTrainer<B: AutodiffBackend> {
    optim: OptimizerAdaptor<Adam, QNetwork<B>, B>,
    learning_rate: f64,
    gamma: f32,
    updates: usize,
}

impl<B: AutodiffBackend> QTrainer<B> {
    pub fn new(learning_rate: f64, gamma: f32) -> Self {
        Self {
            optim: AdamConfig::new().init(),
            learning_rate,
            gamma,
            updates: 0,
        }
    }

    /// Perform one gradient step on a batch of transitions
    ///
    /// # Arguments
    ///
    /// * `network` - Network to update; consumed and handed back
    /// * `batch` - Transitions to learn from (one for a short update)
    /// * `device` - Device the tensors are built on
    ///
    /// # Returns
    ///
    /// The updated network and the loss before the step, or `None` for an
    /// empty batch (network returned untouched).
    ///
    /// # Example
    ///
    /// ```rust
    /// use snake_dqn::game::Turn;
    /// use snake_dqn::rl::{default_device, QNetworkConfig, QTrainer, TrainingBackend, Transition};
    ///
    /// let device = default_device();
    /// let network = QNetworkConfig::new(11, 8).init::<TrainingBackend>(&device);
    /// let mut trainer = QTrainer::new(1e-3, 0.9);
    ///
    /// let death = Transition::new(vec![0.0; 11], Turn::Left, -10.0, vec![0.0; 11], true);
    /// let (_network, loss) = trainer.train_step(network, &[&death], &device);
    /// assert!(loss.is_some());
    /// ```
    pub fn train_step(
        &mut self,
        network: QNetwork<B>,
        batch: &[&Transition],
        device: &B::Device,
    ) -> (QNetwork<B>, Option<f32>) {
        if batch.is_empty() {
            return (network, None);
        }

        let observations: Vec<&[f32]> = batch.iter().map(|t| t.observation.as_slice()).collect();
        let next_observations: Vec<&[f32]> = batch
            .iter()
            .map(|t| t.next_observation.as_slice())
            .collect();

        // Bootstrap values from the current parameters, outside the graph.
        let next_q = network.valid().q_values_batch(&next_observations, device);

        let predictions = network.forward(batch_tensor::<B>(&observations, device));
        let flat: Vec<f32> = predictions
            .clone()
            .into_data()
            .to_vec()
            .expect("Failed to convert predictions to vec");

        let targets = bootstrap_targets(&flat, &next_q, batch, self.gamma);
        let targets: Tensor<B, 2> = Tensor::from_data(
            TensorData::new(targets, [batch.len(), Turn::COUNT]),
            device,
        );

        let diff = predictions - targets;
        let loss = (diff.clone() * diff).mean();
        let loss_value = loss.clone().into_scalar().elem::<f32>();

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &network);
        let network = self.optim.step(self.learning_rate, network, grads);

        self.updates += 1;
        debug!(batch = batch.len(), loss = loss_value, "q update");

        (network, Some(loss_value))
    }

    pub fn gamma(&self) -> f32 {
        self.gamma
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Number of gradient steps taken so far
    pub fn updates(&self) -> usize {
        self.updates
    }
}

/// Build the flattened `[batch, 3]` target matrix
///
/// `predictions` is the flattened prediction matrix; `next_q` holds one row of
/// next-state Q-values per transition.
pub fn bootstrap_targets(
    predictions: &[f32],
    next_q: &[Vec<f32>],
    batch: &[&Transition],
    gamma: f32,
) -> Vec<f32> {
    let mut targets = predictions.to_vec();
    for (i, transition) in batch.iter().enumerate() {
        let q_new = if transition.terminal {
            transition.reward
        } else {
            let best_next = next_q[i].iter().copied().fold(f32::NEG_INFINITY, f32::max);
            transition.reward + gamma * best_next
        };
        targets[i * Turn::COUNT + transition.action.index()] = q_new;
    }
    targets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rl::network::QNetworkConfig;
    use burn::backend::ndarray::{NdArray, NdArrayDevice};
    use burn::backend::Autodiff;

    type TestBackend = Autodiff<NdArray<f32>>;

    fn transition(action: Turn, reward: f32, terminal: bool) -> Transition {
        let mut observation = vec![0.0; 11];
        observation[4] = 1.0;
        let mut next_observation = vec![0.0; 11];
        next_observation[5] = 1.0;
        Transition::new(observation, action, reward, next_observation, terminal)
    }

    #[test]
    fn test_bootstrap_targets_only_touch_taken_action() {
        let a = transition(Turn::Right, 10.0, false);
        let b = transition(Turn::Left, -10.0, true);
        let batch = vec![&a, &b];

        let predictions = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let next_q = vec![vec![0.5, 2.0, -1.0], vec![100.0, 100.0, 100.0]];

        let targets = bootstrap_targets(&predictions, &next_q, &batch, 0.9);

        // Row 0: index 1 becomes 10 + 0.9 * 2.0
        assert_eq!(targets[0], 1.0);
        assert!((targets[1] - 11.8).abs() < 1e-6);
        assert_eq!(targets[2], 3.0);
        // Row 1: terminal, index 2 becomes the raw reward
        assert_eq!(&targets[3..6], &[4.0, 5.0, -10.0]);
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let device = NdArrayDevice::default();
        let network = QNetworkConfig::new(11, 8).init::<TestBackend>(&device);
        let mut trainer = QTrainer::new(1e-3, 0.9);

        let (_network, loss) = trainer.train_step(network, &[], &device);
        assert!(loss.is_none());
        assert_eq!(trainer.updates(), 0);
    }

    #[test]
    fn test_terminal_value_is_learned() {
        let device = NdArrayDevice::default();
        let mut network = QNetworkConfig::new(11, 32).init::<TestBackend>(&device);
        let mut trainer = QTrainer::new(1e-2, 0.9);

        let sample = transition(Turn::Straight, 10.0, true);
        let mut first_loss = None;
        let mut last_loss = 0.0;
        for _ in 0..500 {
            let (updated, loss) = trainer.train_step(network, &[&sample], &device);
            network = updated;
            let loss = loss.unwrap();
            first_loss.get_or_insert(loss);
            last_loss = loss;
        }

        assert!(last_loss < first_loss.unwrap());
        let q = network.valid().q_values(&sample.observation, &device);
        assert!((q[0] - 10.0).abs() < 1.0, "Q(straight) = {}", q[0]);
        assert_eq!(trainer.updates(), 500);
    }

    #[test]
    fn test_batch_update_returns_finite_loss() {
        let device = NdArrayDevice::default();
        let network = QNetworkConfig::new(11, 16).init::<TestBackend>(&device);
        let mut trainer = QTrainer::new(1e-3, 0.9);

        let items: Vec<Transition> = (0..32)
            .map(|i| transition(Turn::ALL[i % 3], (i % 5) as f32, i % 7 == 0))
            .collect();
        let batch: Vec<&Transition> = items.iter().collect();

        let (_network, loss) = trainer.train_step(network, &batch, &device);
        assert!(loss.unwrap().is_finite());
    }
}
