use std::path::Path;

use crate::callbacks::Callback;
use crate::error::{Error, Result};
use crate::math::tensor::Tensor;
use crate::metrics::{argmax_rows, jaccard_per_class, Mean};
use crate::network::sequential::Sequential;
use crate::summary::writer::SummaryWriter;
use crate::train::epoch_logs::EpochLogs;

/// Scores `(y_true, y_pred)` class labels, returning one value per class.
pub type ScoreFn = Box<dyn Fn(&[usize], &[usize]) -> Result<Vec<f64>> + Send>;

/// Scores the model on a held-out set at the end of every epoch and exports
/// the mean of the per-class scores as a scalar event.
///
/// The step written with each value comes from the callback's own counter,
/// which starts at 0 and is incremented before each write, so a run logs
/// steps 1, 2, 3, ... regardless of how `fit` numbers its epochs.
pub struct ScoreCallback {
    x_test: Vec<Tensor>,
    y_test: Vec<usize>,
    metric: Mean,
    epoch: i64,
    writer: SummaryWriter,
    score_fn: ScoreFn,
}

impl ScoreCallback {
    /// Creates the callback and opens a fresh event file in `<log_dir>/<name>`.
    ///
    /// `metric_name` is both the running mean's name and the exported tag.
    pub fn new(
        metric_name: &str,
        name: &str,
        x_test: Vec<Tensor>,
        y_test: Vec<usize>,
        log_dir: impl AsRef<Path>,
        score_fn: ScoreFn,
    ) -> Result<ScoreCallback> {
        if name.is_empty() {
            return Err(Error::config("callback run name must not be empty"));
        }
        if x_test.is_empty() {
            return Err(Error::config("held-out set is empty"));
        }
        if x_test.len() != y_test.len() {
            return Err(Error::shape(format!(
                "held-out set has {} inputs but {} labels",
                x_test.len(),
                y_test.len()
            )));
        }
        let writer = SummaryWriter::create(log_dir.as_ref().join(name))?;
        Ok(ScoreCallback {
            x_test,
            y_test,
            metric: Mean::new(metric_name),
            epoch: 0,
            writer,
            score_fn,
        })
    }

    /// Per-class Jaccard similarity averaged into the `jaccard_score` tag.
    pub fn jaccard(
        name: &str,
        x_test: Vec<Tensor>,
        y_test: Vec<usize>,
        log_dir: impl AsRef<Path>,
    ) -> Result<ScoreCallback> {
        let score_fn: ScoreFn = Box::new(|y_true: &[usize], y_pred: &[usize]| {
            Ok(jaccard_per_class(y_true, y_pred, None)?.scores)
        });
        ScoreCallback::new("jaccard_score", name, x_test, y_test, log_dir, score_fn)
    }

    /// Number of epochs scored so far.
    pub fn epoch(&self) -> i64 {
        self.epoch
    }

    /// Most recently exported value (0.0 before the first epoch).
    pub fn last_value(&self) -> f64 {
        self.metric.result()
    }

    pub fn metric_name(&self) -> &str {
        self.metric.name()
    }

    pub fn event_file(&self) -> &Path {
        self.writer.path()
    }
}

impl Callback for ScoreCallback {
    fn on_epoch_end(&mut self, model: &Sequential, _logs: &EpochLogs) -> Result<()> {
        self.epoch += 1;
        self.metric.reset_state();

        let predictions = model.predict(&self.x_test)?;
        let y_pred = argmax_rows(&predictions);
        let values = (self.score_fn)(&self.y_test, &y_pred)?;
        self.metric.update_state(&values);

        let value = self.metric.result();
        self.writer.scalar(self.metric.name(), value, self.epoch)?;
        self.writer.flush()?;

        tracing::info!(tag = self.metric.name(), step = self.epoch, value, "exported score");
        Ok(())
    }
}
