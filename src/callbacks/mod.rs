//! Hooks invoked by `fit` around epochs and batches.

pub mod scalars;
pub mod score;

pub use scalars::ScalarLogger;
pub use score::{ScoreCallback, ScoreFn};

use crate::error::Result;
use crate::network::sequential::Sequential;
use crate::train::epoch_logs::{EpochLogs, History};

/// A training hook. Every method defaults to a no-op; an error returned from
/// any of them aborts `fit`.
pub trait Callback: Send {
    fn on_train_begin(&mut self, _model: &Sequential) -> Result<()> {
        Ok(())
    }

    fn on_train_end(&mut self, _model: &Sequential, _history: &History) -> Result<()> {
        Ok(())
    }

    /// `epoch` is 1-based.
    fn on_epoch_begin(&mut self, _model: &Sequential, _epoch: usize) -> Result<()> {
        Ok(())
    }

    fn on_epoch_end(&mut self, _model: &Sequential, _logs: &EpochLogs) -> Result<()> {
        Ok(())
    }

    /// `loss` is the mean loss over the batch that was just applied.
    fn on_train_batch_end(&mut self, _batch: usize, _loss: f64) -> Result<()> {
        Ok(())
    }

    fn should_stop(&self) -> bool {
        false
    }
}
