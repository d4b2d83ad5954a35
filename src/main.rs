use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

use ferrite_metrics::callbacks::{Callback, ScalarLogger, ScoreCallback};
use ferrite_metrics::data::load_mnist;
use ferrite_metrics::{evaluate, fit, FitConfig, ModelSpec, RunConfig};

/// Trains a convnet on MNIST and exports a per-epoch Jaccard score as
/// TensorBoard scalars.
#[derive(Parser)]
#[command(name = "ferrite-metrics", version, about)]
struct Cli {
    /// JSON run config; CLI flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory with the uncompressed MNIST IDX files.
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Root directory for event files.
    #[arg(long)]
    log_dir: Option<PathBuf>,
    #[arg(long)]
    epochs: Option<usize>,
    #[arg(long)]
    batch_size: Option<usize>,
    #[arg(long)]
    learning_rate: Option<f64>,
    /// Use only the first N training samples.
    #[arg(long)]
    train_limit: Option<usize>,
    /// Use only the first N test samples.
    #[arg(long)]
    test_limit: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
    /// ModelSpec JSON to build instead of the default convnet.
    #[arg(long)]
    model: Option<PathBuf>,
    /// Save the trained model to this path.
    #[arg(long)]
    save: Option<PathBuf>,
}

impl Cli {
    /// Loads the config file (or defaults) and applies CLI overrides.
    fn run_config(&self) -> anyhow::Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => RunConfig::default(),
        };
        if let Some(ref d) = self.data_dir {
            config.data_dir = d.clone();
        }
        if let Some(ref d) = self.log_dir {
            config.log_dir = d.clone();
        }
        if let Some(n) = self.epochs {
            config.epochs = n;
        }
        if let Some(n) = self.batch_size {
            config.batch_size = n;
        }
        if let Some(lr) = self.learning_rate {
            config.optimizer = config.optimizer.with_learning_rate(lr);
        }
        if self.train_limit.is_some() {
            config.train_limit = self.train_limit;
        }
        if self.test_limit.is_some() {
            config.test_limit = self.test_limit;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.model.is_some() {
            config.model = self.model.clone();
        }
        if self.save.is_some() {
            config.save_model = self.save.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = cli.run_config()?;

    // ── Data ─────────────────────────────────────────────────────────────
    let (mut train, mut test) = load_mnist(&config.data_dir, config.num_classes).with_context(|| {
        format!(
            "loading MNIST from {} (expects the four uncompressed IDX files)",
            config.data_dir.display()
        )
    })?;
    if let Some(n) = config.train_limit {
        train.truncate(n);
    }
    if let Some(n) = config.test_limit {
        test.truncate(n);
    }

    let input_shape = train
        .input_shape()
        .context("training set is empty")?;
    println!("x_train shape: ({}, {:?})", train.len(), input_shape);
    println!("{} train samples", train.len());
    println!("{} test samples", test.len());

    let y_train = train.one_hot()?;

    // ── Model ────────────────────────────────────────────────────────────
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let spec = match &config.model {
        Some(path) => ModelSpec::load_json(path)
            .with_context(|| format!("loading model spec {}", path.display()))?,
        None => ModelSpec::mnist_convnet(config.num_classes),
    };
    let mut model = spec.build(&mut rng)?;
    println!("{}", model.summary()?);

    // ── Training ─────────────────────────────────────────────────────────
    let mut jaccard = ScoreCallback::jaccard(
        &model.name,
        test.images.clone(),
        test.labels.clone(),
        &config.log_dir,
    )?;
    let mut scalars = ScalarLogger::create(&config.log_dir)?;
    let mut optimizer = config.optimizer.build();

    let fit_config = FitConfig::new(config.epochs, config.batch_size)
        .validation_split(config.validation_split)
        .seed(config.seed);

    let history = {
        let mut callbacks: Vec<&mut dyn Callback> = vec![&mut jaccard, &mut scalars];
        fit(
            &mut model,
            optimizer.as_mut(),
            &train.images,
            &y_train,
            &fit_config,
            &mut callbacks,
        )?
    };

    let (test_loss, test_accuracy) = evaluate(&model, &test.images, &test.one_hot()?)?;
    println!("Test loss: {:.4}", test_loss);
    println!("Test accuracy: {:.4}", test_accuracy);
    if let Some(last) = history.last() {
        println!(
            "Final jaccard_score after {} epochs: {:.4}",
            last.epoch,
            jaccard.last_value()
        );
    }

    if let Some(ref path) = config.save_model {
        model.save_json(path)?;
        println!("Model saved to {}", path.display());
    }

    println!(
        "Scalars written to {}. View them with: board --logdir {}",
        config.log_dir.display(),
        config.log_dir.display()
    );
    Ok(())
}
