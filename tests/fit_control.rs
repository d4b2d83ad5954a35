use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};

use rand::rngs::StdRng;
use rand::SeedableRng;

use ferrite_metrics::callbacks::Callback;
use ferrite_metrics::data::toy::bars;
use ferrite_metrics::data::Dataset;
use ferrite_metrics::{
    fit, ActivationFunction, Adam, EpochLogs, Error, FitConfig, History, LayerSpec, ModelSpec, Sequential,
};

fn setup() -> anyhow::Result<(Sequential, Dataset)> {
    let mut rng = StdRng::seed_from_u64(9);
    let data = bars(20, 4, &mut rng)?;
    let spec = ModelSpec {
        name: "dense".to_string(),
        input_shape: vec![1, 4, 4],
        layers: vec![
            LayerSpec::Flatten,
            LayerSpec::Dense { units: 2, activation: ActivationFunction::Softmax },
        ],
    };
    Ok((spec.build(&mut rng)?, data))
}

/// Records every hook in call order.
#[derive(Default)]
struct Recorder {
    events: Vec<String>,
    stop_after: Option<usize>,
    fail_at: Option<usize>,
}

impl Callback for Recorder {
    fn on_train_begin(&mut self, _model: &Sequential) -> ferrite_metrics::Result<()> {
        self.events.push("train_begin".into());
        Ok(())
    }

    fn on_epoch_begin(&mut self, _model: &Sequential, epoch: usize) -> ferrite_metrics::Result<()> {
        self.events.push(format!("epoch_begin {epoch}"));
        Ok(())
    }

    fn on_epoch_end(&mut self, _model: &Sequential, logs: &EpochLogs) -> ferrite_metrics::Result<()> {
        if self.fail_at == Some(logs.epoch) {
            return Err(Error::Metric("scoring failed".into()));
        }
        self.events.push(format!("epoch_end {}", logs.epoch));
        Ok(())
    }

    fn on_train_end(&mut self, _model: &Sequential, history: &History) -> ferrite_metrics::Result<()> {
        self.events.push(format!("train_end {}", history.len()));
        Ok(())
    }

    fn should_stop(&self) -> bool {
        match self.stop_after {
            Some(n) => self.events.iter().filter(|e| e.starts_with("epoch_end")).count() >= n,
            None => false,
        }
    }
}

#[test]
fn hooks_run_in_order() -> anyhow::Result<()> {
    let (mut model, data) = setup()?;
    let mut rec = Recorder::default();
    let mut callbacks: Vec<&mut dyn Callback> = vec![&mut rec];
    fit(&mut model, &mut Adam::new(0.01), &data.images, &data.one_hot()?, &FitConfig::new(2, 4), &mut callbacks)?;
    drop(callbacks);
    assert_eq!(
        rec.events,
        vec!["train_begin", "epoch_begin 1", "epoch_end 1", "epoch_begin 2", "epoch_end 2", "train_end 2"]
    );
    Ok(())
}

#[test]
fn callback_can_stop_training() -> anyhow::Result<()> {
    let (mut model, data) = setup()?;
    let mut rec = Recorder { stop_after: Some(2), ..Recorder::default() };
    let mut callbacks: Vec<&mut dyn Callback> = vec![&mut rec];
    let history = fit(&mut model, &mut Adam::new(0.01), &data.images, &data.one_hot()?, &FitConfig::new(10, 4), &mut callbacks)?;
    assert_eq!(history.len(), 2);
    Ok(())
}

#[test]
fn callback_errors_abort_fit() -> anyhow::Result<()> {
    let (mut model, data) = setup()?;
    let mut rec = Recorder { fail_at: Some(2), ..Recorder::default() };
    let mut callbacks: Vec<&mut dyn Callback> = vec![&mut rec];
    let result = fit(&mut model, &mut Adam::new(0.01), &data.images, &data.one_hot()?, &FitConfig::new(5, 4), &mut callbacks);
    assert!(matches!(result, Err(Error::Metric(_))));
    Ok(())
}

#[test]
fn stop_flag_set_before_start_runs_no_epochs() -> anyhow::Result<()> {
    let (mut model, data) = setup()?;
    let mut config = FitConfig::new(5, 4);
    config.stop_flag = Some(Arc::new(AtomicBool::new(true)));
    let history = fit(&mut model, &mut Adam::new(0.01), &data.images, &data.one_hot()?, &config, &mut [])?;
    assert!(history.is_empty());
    Ok(())
}

#[test]
fn progress_channel_receives_each_epoch() -> anyhow::Result<()> {
    let (mut model, data) = setup()?;
    let (tx, rx) = mpsc::channel();
    let mut config = FitConfig::new(3, 4).validation_split(0.2);
    config.progress_tx = Some(tx);
    fit(&mut model, &mut Adam::new(0.01), &data.images, &data.one_hot()?, &config, &mut [])?;
    drop(config);

    let received: Vec<EpochLogs> = rx.iter().collect();
    assert_eq!(received.iter().map(|l| l.epoch).collect::<Vec<_>>(), vec![1, 2, 3]);
    assert!(received.iter().all(|l| l.total_epochs == 3 && l.val_loss.is_some()));
    Ok(())
}

#[test]
fn dropped_receiver_stops_after_first_epoch() -> anyhow::Result<()> {
    let (mut model, data) = setup()?;
    let (tx, rx) = mpsc::channel();
    drop(rx);
    let mut config = FitConfig::new(4, 4);
    config.progress_tx = Some(tx);
    let history = fit(&mut model, &mut Adam::new(0.01), &data.images, &data.one_hot()?, &config, &mut [])?;
    assert_eq!(history.len(), 1);
    Ok(())
}

/// Sets a shared stop flag once `at` epochs have finished.
struct FlagSetter {
    flag: Arc<AtomicBool>,
    at: usize,
}

impl Callback for FlagSetter {
    fn on_epoch_end(&mut self, _model: &Sequential, logs: &EpochLogs) -> ferrite_metrics::Result<()> {
        if logs.epoch == self.at {
            self.flag.store(true, Ordering::Relaxed);
        }
        Ok(())
    }
}

#[test]
fn flag_set_mid_run_is_honoured() -> anyhow::Result<()> {
    let (mut model, data) = setup()?;
    let flag = Arc::new(AtomicBool::new(false));
    let mut config = FitConfig::new(50, 4);
    config.stop_flag = Some(flag.clone());
    let mut setter = FlagSetter { flag, at: 3 };
    let mut callbacks: Vec<&mut dyn Callback> = vec![&mut setter];
    let history = fit(&mut model, &mut Adam::new(0.01), &data.images, &data.one_hot()?, &config, &mut callbacks)?;
    assert_eq!(history.len(), 3);
    Ok(())
}
