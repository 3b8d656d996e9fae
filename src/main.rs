use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use snake_dqn::config::AppConfig;
use snake_dqn::modes::TrainMode;
use snake_dqn::rl::{default_device, TrainingBackend};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "snake_dqn")]
#[command(version, about = "Snake that teaches itself with deep Q-learning")]
struct Cli {
    /// TOML configuration file; defaults are used when it does not exist
    #[arg(long, default_value = "snake_dqn.toml")]
    config: PathBuf,

    /// Stop after this many games (trains until interrupted otherwise)
    #[arg(long)]
    episodes: Option<usize>,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Adam learning rate
    #[arg(long)]
    learning_rate: Option<f64>,

    /// Where the model is saved on every new record
    #[arg(long)]
    model_path: Option<PathBuf>,

    /// Continue training from a saved model
    #[arg(long)]
    resume: Option<PathBuf>,

    /// Drop the three far-danger features from the observation
    #[arg(long, default_value_t = false)]
    no_far_danger: bool,
}

impl Cli {
    fn apply(self, config: &mut AppConfig) {
        if let Some(episodes) = self.episodes {
            config.training.max_episodes = Some(episodes);
        }
        if let Some(seed) = self.seed {
            config.training.seed = Some(seed);
        }
        if let Some(lr) = self.learning_rate {
            config.agent.learning_rate = lr;
        }
        if let Some(path) = self.model_path {
            config.training.model_path = path;
        }
        if let Some(path) = self.resume {
            config.training.resume_from = Some(path);
        }
        if self.no_far_danger {
            config.agent.far_danger = false;
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    cli.apply(&mut config);

    let mut train_mode = TrainMode::<TrainingBackend>::new(config, default_device())?;
    let report = train_mode.run();

    println!(
        "Trained {} games: record {}, mean score {:.2}",
        report.episodes, report.high_score, report.mean_score
    );

    Ok(())
}
