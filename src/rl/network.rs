//! Q-value network for the snake agent
//!
//! # Architecture
//!
//! ```text
//! Input: [batch, 11 | 14]
//!   ↓ Linear(input → hidden) + ReLU
//!   ↓ Linear(hidden → 3)
//! Output: [batch, 3]   Q(straight), Q(right), Q(left)
//! ```
//!
//! # Example
//!
//! ```rust
//! use snake_dqn::rl::QNetworkConfig;
//! use burn::backend::ndarray::NdArrayDevice;
//! use burn::backend::NdArray;
//! use burn::tensor::Tensor;
//!
//! type Backend = NdArray<f32>;
//!
//! let device = NdArrayDevice::default();
//! let network = QNetworkConfig::new(11, 64).init::<Backend>(&device);
//!
//! let observation = Tensor::zeros([4, 11], &device);
//! assert_eq!(network.forward(observation).dims(), [4, 3]);
//! ```

use burn::{
    module::Module,
    nn::{Linear, LinearConfig},
    tensor::{activation::relu, backend::Backend, Tensor, TensorData},
};
use serde::{Deserialize, Serialize};

use crate::game::Turn;

/// Shape of the Q-network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QNetworkConfig {
    /// Observation length (11, or 14 with far-danger features)
    pub input_size: usize,

    /// Width of the hidden layer
    pub hidden_size: usize,

    /// One output per relative turn
    pub num_actions: usize,
}

impl QNetworkConfig {
    pub fn new(input_size: usize, hidden_size: usize) -> Self {
        Self {
            input_size,
            hidden_size,
            num_actions: Turn::COUNT,
        }
    }

    /// Initialize the network from this configuration
    pub fn init<B: Backend>(&self, device: &B::Device) -> QNetwork<B> {
        QNetwork {
            hidden: LinearConfig::new(self.input_size, self.hidden_size).init(device),
            output: LinearConfig::new(self.hidden_size, self.num_actions).init(device),
        }
    }
}

/// Feed-forward Q-value approximator
#[derive(Module, Debug)]
pub struct QNetwork<B: Backend> {
    hidden: Linear<B>,
    output: Linear<B>,
}

impl<B: Backend> QNetwork<B> {
    /// Forward pass: `[batch, input]` → `[batch, 3]`
    pub fn forward(&self, observation: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = relu(self.hidden.forward(observation));
        self.output.forward(x)
    }

    /// Number of inputs the first layer expects
    pub fn input_size(&self) -> usize {
        self.hidden.weight.dims()[0]
    }

    /// Q-values for a single observation
    pub fn q_values(&self, observation: &[f32], device: &B::Device) -> Vec<f32> {
        let q = self.q_values_batch(&[observation], device);
        q.into_iter().next().unwrap_or_default()
    }

    /// Q-values for a batch of observations, one row per observation
    pub fn q_values_batch(&self, observations: &[&[f32]], device: &B::Device) -> Vec<Vec<f32>> {
        if observations.is_empty() {
            return Vec::new();
        }
        let output = self.forward(batch_tensor(observations, device));
        let [_, actions] = output.dims();
        let flat: Vec<f32> = output
            .into_data()
            .to_vec()
            .expect("Failed to convert Q-values to vec");
        flat.chunks(actions).map(<[f32]>::to_vec).collect()
    }
}

/// Stack observations of equal length into a `[batch, len]` tensor
pub fn batch_tensor<B: Backend>(observations: &[&[f32]], device: &B::Device) -> Tensor<B, 2> {
    let width = observations.first().map_or(0, |o| o.len());
    let data: Vec<f32> = observations.iter().flat_map(|o| o.iter().copied()).collect();
    Tensor::from_data(TensorData::new(data, [observations.len(), width]), device)
}

/// Index of the largest value; ties resolve to the lowest index
pub fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}
