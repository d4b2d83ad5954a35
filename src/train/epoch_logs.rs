use serde::{Serialize, Deserialize};

/// Per-epoch training statistics produced by `fit`.
///
/// Passed to every callback's `on_epoch_end` and, when a `progress_tx`
/// channel is configured in `FitConfig`, sent once per completed epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochLogs {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Total epochs requested for this run.
    pub total_epochs: usize,
    /// Mean training cross-entropy over all samples in this epoch.
    pub loss: f64,
    /// Training accuracy as a fraction in [0, 1].
    pub accuracy: f64,
    /// Mean validation loss, if a validation split was held out.
    pub val_loss: Option<f64>,
    pub val_accuracy: Option<f64>,
    /// Wall-clock duration of this epoch (training and validation) in milliseconds.
    pub elapsed_ms: u64,
}

/// Every epoch's logs from one `fit` call, in order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct History {
    pub epochs: Vec<EpochLogs>,
}

impl History {
    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    pub fn last(&self) -> Option<&EpochLogs> {
        self.epochs.last()
    }

    /// Training loss per epoch.
    pub fn losses(&self) -> Vec<f64> {
        self.epochs.iter().map(|e| e.loss).collect()
    }
}
