use std::path::{Path, PathBuf};

use crate::callbacks::Callback;
use crate::error::Result;
use crate::network::sequential::Sequential;
use crate::summary::writer::SummaryWriter;
use crate::train::epoch_logs::EpochLogs;

/// Exports `fit`'s own epoch metrics as `epoch_loss` / `epoch_accuracy`
/// under `<log_dir>/train`, and the validation pair under
/// `<log_dir>/validation` once validation logs appear.
pub struct ScalarLogger {
    log_dir: PathBuf,
    train: SummaryWriter,
    validation: Option<SummaryWriter>,
}

impl ScalarLogger {
    pub fn create(log_dir: impl AsRef<Path>) -> Result<ScalarLogger> {
        let log_dir = log_dir.as_ref().to_path_buf();
        let train = SummaryWriter::create(log_dir.join("train"))?;
        Ok(ScalarLogger { log_dir, train, validation: None })
    }
}

impl Callback for ScalarLogger {
    fn on_epoch_end(&mut self, _model: &Sequential, logs: &EpochLogs) -> Result<()> {
        let step = logs.epoch as i64;
        self.train.scalar("epoch_loss", logs.loss, step)?;
        self.train.scalar("epoch_accuracy", logs.accuracy, step)?;
        self.train.flush()?;

        if logs.val_loss.is_none() && logs.val_accuracy.is_none() {
            return Ok(());
        }
        if self.validation.is_none() {
            self.validation = Some(SummaryWriter::create(self.log_dir.join("validation"))?);
        }
        if let Some(writer) = self.validation.as_mut() {
            if let Some(loss) = logs.val_loss {
                writer.scalar("epoch_loss", loss, step)?;
            }
            if let Some(acc) = logs.val_accuracy {
                writer.scalar("epoch_accuracy", acc, step)?;
            }
            writer.flush()?;
        }
        Ok(())
    }
}
