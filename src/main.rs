use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;

use mnist_mlp::{
    Metadata, Model, ModelConfig, ModelStore, Paths, PredictConfig, TrainConfig, Training, argmax,
    mnist,
};

#[derive(Parser)]
#[command(name = "mnist-mlp")]
#[command(about = "Train and query a from-scratch MNIST MLP", long_about = None)]
#[command(version)]
struct Cli {
    /// Logging level
    #[arg(short, long, value_enum, default_value_t = Verbosity::Info, global = true)]
    verbosity: Verbosity,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a new model on gzip IDX files found under `$DATA_PATH/raw`
    Train {
        #[arg(long, default_value = mnist::TRAIN_IMAGES)]
        train_images: PathBuf,
        #[arg(long, default_value = mnist::TRAIN_LABELS)]
        train_labels: PathBuf,
        #[arg(long, default_value = mnist::TEST_IMAGES)]
        test_images: PathBuf,
        #[arg(long, default_value = mnist::TEST_LABELS)]
        test_labels: PathBuf,

        #[arg(long, default_value_t = TrainConfig::default().epochs)]
        epochs: usize,
        #[arg(long, default_value_t = TrainConfig::default().learning_rate)]
        learning_rate: f32,
        /// Hidden units; defaults to `$HIDDEN_SIZE` or 100
        #[arg(long)]
        hidden_size: Option<usize>,
        /// Seed for weight init and dropout masks
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Store the trained model under this name in `$MODELS_PATH`
        #[arg(long)]
        save: Option<String>,
    },

    /// Print raw scores and predicted labels for a gzip IDX image file
    Predict {
        /// Model name in `$MODELS_PATH`
        #[arg(long)]
        model: String,
        /// Image file; relative paths resolve under `$DATA_PATH/raw`
        #[arg(long)]
        images: PathBuf,
        /// Disable dropout while predicting
        #[arg(long)]
        no_dropout: bool,
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },

    /// Print package, dataset and model metadata
    Metadata,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Verbosity {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<Verbosity> for LevelFilter {
    fn from(v: Verbosity) -> Self {
        match v {
            Verbosity::Trace => LevelFilter::TRACE,
            Verbosity::Debug => LevelFilter::DEBUG,
            Verbosity::Info => LevelFilter::INFO,
            Verbosity::Warn => LevelFilter::WARN,
            Verbosity::Error => LevelFilter::ERROR,
        }
    }
}

#[derive(Serialize)]
struct Prediction {
    label: usize,
    scores: Vec<f32>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(LevelFilter::from(cli.verbosity));
    tracing_subscriber::registry().with(layer).init();

    let paths = Paths::from_env();
    match cli.command {
        Commands::Train {
            train_images,
            train_labels,
            test_images,
            test_labels,
            epochs,
            learning_rate,
            hidden_size,
            seed,
            save,
        } => {
            let mut model_cfg = ModelConfig::from_env()?;
            if let Some(hidden_size) = hidden_size {
                model_cfg.hidden_size = hidden_size;
            }
            let raw = paths.raw_data_dir();
            let load = |images: &Path, labels: &Path| {
                mnist::load_dataset(raw.join(images), raw.join(labels), model_cfg.num_labels)
                    .with_context(|| {
                        format!(
                            "loading {} / {} from {}",
                            images.display(),
                            labels.display(),
                            raw.display()
                        )
                    })
            };
            let training = Training::new(
                load(&train_images, &train_labels)?,
                load(&test_images, &test_labels)?,
            )?;

            let mut rng = StdRng::seed_from_u64(seed);
            let mut model = Model::new_with_rng(&model_cfg, &mut rng)?;
            let cfg = TrainConfig {
                epochs,
                learning_rate,
            };
            let report = training.train(&mut model, &cfg, &mut rng)?;

            if let Some(name) = save {
                let path = ModelStore::new(&paths.models_path).save(&name, &model)?;
                info!(path = %path.display(), "model saved");
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Predict {
            model,
            images,
            no_dropout,
            seed,
        } => {
            let store = ModelStore::new(&paths.models_path);
            let model = store
                .load(&model)
                .with_context(|| format!("loading model {model:?}"))?;
            let images = paths.raw_data_dir().join(images);
            let inputs = mnist::read_images(&images)
                .with_context(|| format!("reading {}", images.display()))?;

            let cfg = PredictConfig {
                training_mode: !no_dropout,
            };
            let mut rng = StdRng::seed_from_u64(seed);
            let predictions: Vec<Prediction> = model
                .predict(&inputs, &cfg, &mut rng)?
                .into_iter()
                .map(|scores| Prediction {
                    label: argmax(&scores),
                    scores,
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&predictions)?);
        }
        Commands::Metadata => {
            let metadata = Metadata::collect(&paths)?;
            println!("{}", serde_json::to_string_pretty(&metadata)?);
        }
    }

    Ok(())
}
