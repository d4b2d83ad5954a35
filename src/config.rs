//! JSON run configuration for the training binary.
//!
//! Every field has a default, so a config file only needs the values it
//! changes. CLI flags are applied on top by the binary.

use std::path::{Path, PathBuf};

use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};
use crate::data::mnist::NUM_CLASSES;
use crate::optim::OptimizerSpec;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Directory holding the four uncompressed MNIST IDX files.
    pub data_dir: PathBuf,
    /// Root directory for event files; the score callback writes into
    /// `<log_dir>/<model name>`.
    pub log_dir: PathBuf,
    /// Width of the output layer and of the one-hot targets. Dataset labels
    /// at or above it are rejected on load.
    pub num_classes: usize,
    pub epochs: usize,
    pub batch_size: usize,
    pub validation_split: f64,
    pub optimizer: OptimizerSpec,
    /// Seeds weight init, shuffling, and dropout. `None` draws from entropy.
    pub seed: Option<u64>,
    /// Use only the first N training samples.
    pub train_limit: Option<usize>,
    /// Use only the first N test samples.
    pub test_limit: Option<usize>,
    /// `ModelSpec` JSON; the MNIST convnet preset when absent.
    pub model: Option<PathBuf>,
    /// Where to save the trained model, if anywhere.
    pub save_model: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            data_dir: PathBuf::from("data/mnist"),
            log_dir: PathBuf::from("logs"),
            num_classes: NUM_CLASSES,
            epochs: 15,
            batch_size: 128,
            validation_split: 0.1,
            optimizer: OptimizerSpec::default(),
            seed: None,
            train_limit: None,
            test_limit: None,
            model: None,
            save_model: None,
        }
    }
}

impl RunConfig {
    /// Reads and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<RunConfig> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config: RunConfig = serde_json::from_str(&json)?;
        config.validate()?;
        tracing::info!(path = %path.display(), "loaded run config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_classes < 2 {
            return Err(Error::config("num_classes must be at least 2"));
        }
        if self.epochs == 0 {
            return Err(Error::config("epochs must be at least 1"));
        }
        if self.batch_size == 0 {
            return Err(Error::config("batch_size must be at least 1"));
        }
        if !(0.0..1.0).contains(&self.validation_split) {
            return Err(Error::config(format!(
                "validation_split must be in [0, 1), got {}",
                self.validation_split
            )));
        }
        if self.optimizer.learning_rate() <= 0.0 {
            return Err(Error::config("learning_rate must be positive"));
        }
        Ok(())
    }
}
