use std::sync::mpsc;
use std::sync::{Arc, atomic::AtomicBool};

use crate::error::{Error, Result};
use crate::train::epoch_logs::EpochLogs;

/// Configuration for a `fit` run.
///
/// # Fields
/// - `epochs`          : total number of full passes over the training data
/// - `batch_size`      : samples per mini-batch; gradients are averaged per batch
/// - `validation_split`: fraction in `[0, 1)` held out from the **end** of
///                        the data, before shuffling, for validation
/// - `shuffle`         : reshuffle training samples every epoch
/// - `seed`            : seeds shuffling and dropout; `None` draws from entropy
/// - `progress_tx`     : optional channel; one `EpochLogs` is sent per
///                        completed epoch. If the receiver is dropped the run
///                        stops early.
/// - `stop_flag`       : optional atomic flag; when set from another thread
///                        the run stops after the current epoch.
pub struct FitConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub validation_split: f64,
    pub shuffle: bool,
    pub seed: Option<u64>,
    pub progress_tx: Option<mpsc::Sender<EpochLogs>>,
    pub stop_flag: Option<Arc<AtomicBool>>,
}

impl FitConfig {
    /// Shuffled run with no validation split, progress channel, or stop flag.
    pub fn new(epochs: usize, batch_size: usize) -> Self {
        FitConfig {
            epochs,
            batch_size,
            validation_split: 0.0,
            shuffle: true,
            seed: None,
            progress_tx: None,
            stop_flag: None,
        }
    }

    pub fn validation_split(mut self, fraction: f64) -> Self {
        self.validation_split = fraction;
        self
    }

    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::config("batch_size must be at least 1"));
        }
        if !(0.0..1.0).contains(&self.validation_split) {
            return Err(Error::config(format!(
                "validation_split must be in [0, 1), got {}",
                self.validation_split
            )));
        }
        Ok(())
    }

    /// Index where the validation tail begins for `n` samples:
    /// `floor(n * (1 - validation_split))`.
    pub fn split_index(&self, n: usize) -> usize {
        let at = (n as f64 * (1.0 - self.validation_split)).floor() as usize;
        at.min(n)
    }
}
