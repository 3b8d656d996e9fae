pub mod train;

pub use train::{EpisodeSummary, TrainMode, TrainingReport};
