use std::sync::atomic::Ordering;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::callbacks::Callback;
use crate::error::{Error, Result};
use crate::loss::cross_entropy::CrossEntropyLoss;
use crate::math::tensor::{argmax, Tensor};
use crate::network::sequential::Sequential;
use crate::optim::Optimizer;
use crate::train::epoch_logs::{EpochLogs, History};
use crate::train::fit_config::FitConfig;

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Trains `model` on `(inputs, targets)` for `config.epochs` epochs and
/// returns the per-epoch history.
///
/// # Arguments
/// - `model`    : modified in place
/// - `optimizer`: applies one update per mini-batch from batch-averaged gradients
/// - `inputs`   : one tensor per sample, each shaped like `model.input_shape`
/// - `targets`  : one-hot rows, same length as `inputs`
/// - `config`   : hyperparameters, optional progress channel, optional stop flag
/// - `callbacks`: invoked in order at every hook
///
/// The last `config.validation_split` fraction of the samples is held out
/// before any shuffling and evaluated after every epoch.
///
/// # Early termination
/// The loop breaks after the current epoch if:
/// - the `progress_tx` receiver has been dropped, **or**
/// - `config.stop_flag` is set, **or**
/// - any callback's `should_stop` returns `true`.
///
/// A callback error aborts the run and is returned unchanged.
pub fn fit(
    model: &mut Sequential,
    optimizer: &mut dyn Optimizer,
    inputs: &[Tensor],
    targets: &[Vec<f64>],
    config: &FitConfig,
    callbacks: &mut [&mut dyn Callback],
) -> Result<History> {
    config.validate()?;
    if inputs.len() != targets.len() {
        return Err(Error::shape(format!(
            "{} inputs but {} targets",
            inputs.len(),
            targets.len()
        )));
    }
    let split_at = config.split_index(inputs.len());
    let (train_x, val_x) = inputs.split_at(split_at);
    let (train_y, val_y) = targets.split_at(split_at);
    if train_x.is_empty() {
        return Err(Error::config("no training samples left after the validation split"));
    }
    if config.validation_split > 0.0 && val_x.is_empty() {
        return Err(Error::config(format!(
            "validation_split {} of {} samples leaves no validation samples",
            config.validation_split,
            inputs.len()
        )));
    }

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    tracing::info!(
        model = %model.name,
        optimizer = optimizer.name(),
        train = train_x.len(),
        validation = val_x.len(),
        epochs = config.epochs,
        batch_size = config.batch_size,
        "starting training"
    );

    for cb in callbacks.iter_mut() {
        cb.on_train_begin(model)?;
    }

    let mut history = History::default();

    for epoch in 1..=config.epochs {
        if stop_requested(config) {
            tracing::info!(epoch, "stop flag set; ending training");
            break;
        }

        for cb in callbacks.iter_mut() {
            cb.on_epoch_begin(model, epoch)?;
        }

        let t_start = Instant::now();

        // ── One full pass over the training data ───────────────────────────
        let (loss, accuracy) = run_one_epoch(
            model,
            optimizer,
            train_x,
            train_y,
            config,
            &mut rng,
            callbacks,
        )?;

        // ── Validation ────────────────────────────────────────────────────
        let (val_loss, val_accuracy) = if val_x.is_empty() {
            (None, None)
        } else {
            let (l, a) = evaluate(model, val_x, val_y)?;
            (Some(l), Some(a))
        };

        let logs = EpochLogs {
            epoch,
            total_epochs: config.epochs,
            loss,
            accuracy,
            val_loss,
            val_accuracy,
            elapsed_ms: t_start.elapsed().as_millis() as u64,
        };

        tracing::info!(
            epoch,
            total = config.epochs,
            loss = logs.loss,
            accuracy = logs.accuracy,
            val_loss = ?logs.val_loss,
            val_accuracy = ?logs.val_accuracy,
            elapsed_ms = logs.elapsed_ms,
            "epoch finished"
        );

        for cb in callbacks.iter_mut() {
            cb.on_epoch_end(model, &logs)?;
        }
        history.epochs.push(logs.clone());

        // ── Emit progress ─────────────────────────────────────────────────
        if let Some(ref tx) = config.progress_tx {
            if tx.send(logs).is_err() {
                tracing::info!(epoch, "progress receiver dropped; ending training");
                break;
            }
        }

        if stop_requested(config) {
            break;
        }
        if callbacks.iter().any(|cb| cb.should_stop()) {
            tracing::info!(epoch, "callback requested stop");
            break;
        }
    }

    for cb in callbacks.iter_mut() {
        cb.on_train_end(model, &history)?;
    }

    Ok(history)
}

/// Mean cross-entropy loss and accuracy of `model` over a labelled set, in
/// inference mode. An empty set yields `(0.0, 0.0)`.
pub fn evaluate(model: &Sequential, inputs: &[Tensor], targets: &[Vec<f64>]) -> Result<(f64, f64)> {
    if inputs.len() != targets.len() {
        return Err(Error::shape(format!(
            "{} inputs but {} targets",
            inputs.len(),
            targets.len()
        )));
    }
    let n = inputs.len();
    if n == 0 {
        return Ok((0.0, 0.0));
    }
    let mut total_loss = 0.0;
    let mut correct = 0usize;
    for (input, target) in inputs.iter().zip(targets) {
        let output = model.infer(input)?;
        total_loss += CrossEntropyLoss::loss(&output.data, target)?;
        if argmax(&output.data) == argmax(target) {
            correct += 1;
        }
    }
    Ok((total_loss / n as f64, correct as f64 / n as f64))
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn stop_requested(config: &FitConfig) -> bool {
    config
        .stop_flag
        .as_ref()
        .map(|flag| flag.load(Ordering::Relaxed))
        .unwrap_or(false)
}

/// Runs one full epoch of mini-batch updates over the training data.
/// Returns the mean loss and the accuracy over all samples, measured on the
/// training-mode outputs.
fn run_one_epoch(
    model: &mut Sequential,
    optimizer: &mut dyn Optimizer,
    inputs: &[Tensor],
    targets: &[Vec<f64>],
    config: &FitConfig,
    rng: &mut StdRng,
    callbacks: &mut [&mut dyn Callback],
) -> Result<(f64, f64)> {
    let n = inputs.len();
    let mut total_loss = 0.0;
    let mut correct = 0usize;

    let mut indices: Vec<usize> = (0..n).collect();
    if config.shuffle {
        indices.shuffle(rng);
    }

    model.zero_grad();

    for (batch, chunk) in indices.chunks(config.batch_size).enumerate() {
        let mut batch_loss = 0.0;

        // Accumulate gradients over the mini-batch.
        for &idx in chunk {
            let target = &targets[idx];
            let output = model.forward(&inputs[idx], rng)?;

            batch_loss += CrossEntropyLoss::loss(&output.data, target)?;
            if argmax(&output.data) == argmax(target) {
                correct += 1;
            }

            let delta = CrossEntropyLoss::derivative(&output.data, target)?;
            let len = delta.len();
            model.backward(Tensor::from_vec(&[len], delta)?)?;
        }

        // Average and apply.
        let inv_batch = 1.0 / chunk.len() as f64;
        let mut params = model.parameters();
        for p in params.iter_mut() {
            p.grad.scale(inv_batch);
        }
        optimizer.step(&mut params);
        drop(params);
        model.zero_grad();

        total_loss += batch_loss;
        let mean_batch_loss = batch_loss * inv_batch;
        for cb in callbacks.iter_mut() {
            cb.on_train_batch_end(batch, mean_batch_loss)?;
        }
    }

    Ok((total_loss / n as f64, correct as f64 / n as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use crate::layers::{Dense, Flatten, Layer};
    use crate::optim::Adam;
    use rand::rngs::StdRng;

    /// Two linearly separable classes on a flattened 1×2×2 input.
    fn toy_set() -> (Vec<Tensor>, Vec<Vec<f64>>) {
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        for i in 0..40 {
            let class = i % 2;
            let v = if class == 0 { [1.0, 1.0, 0.0, 0.0] } else { [0.0, 0.0, 1.0, 1.0] };
            xs.push(Tensor::from_vec(&[1, 2, 2], v.to_vec()).unwrap());
            let mut t = vec![0.0; 2];
            t[class] = 1.0;
            ys.push(t);
        }
        (xs, ys)
    }

    fn toy_model() -> Sequential {
        let mut rng = StdRng::seed_from_u64(7);
        Sequential::new(
            "toy",
            vec![1, 2, 2],
            vec![
                Layer::Flatten(Flatten::new()),
                Layer::Dense(Dense::new(2, 4, ActivationFunction::Softmax, &mut rng)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn loss_decreases_on_separable_data() {
        let (xs, ys) = toy_set();
        let mut model = toy_model();
        let mut opt = Adam::new(0.05);
        let config = FitConfig::new(20, 8).seed(Some(1));
        let history = fit(&mut model, &mut opt, &xs, &ys, &config, &mut []).unwrap();
        assert_eq!(history.len(), 20);
        let losses = history.losses();
        assert!(losses[19] < losses[0]);
        assert_eq!(history.last().unwrap().accuracy, 1.0);
    }

    #[test]
    fn validation_split_is_reported() {
        let (xs, ys) = toy_set();
        let mut model = toy_model();
        let mut opt = Adam::new(0.01);
        let config = FitConfig::new(2, 8).validation_split(0.25).seed(Some(1));
        let history = fit(&mut model, &mut opt, &xs, &ys, &config, &mut []).unwrap();
        assert!(history.epochs.iter().all(|e| e.val_loss.is_some() && e.val_accuracy.is_some()));
        assert_eq!(history.epochs[0].epoch, 1);
        assert_eq!(history.epochs[1].total_epochs, 2);
    }

    #[test]
    fn mismatched_targets_are_rejected() {
        let (xs, ys) = toy_set();
        let mut model = toy_model();
        let mut opt = Adam::new(0.01);
        let config = FitConfig::new(1, 8);
        assert!(fit(&mut model, &mut opt, &xs, &ys[..3], &config, &mut []).is_err());
    }

    #[test]
    fn split_leaving_either_side_empty_is_rejected() {
        let (xs, ys) = toy_set();
        let mut model = toy_model();
        let mut opt = Adam::new(0.01);

        let tiny = FitConfig::new(1, 8).validation_split(1e-20);
        let err = fit(&mut model, &mut opt, &xs, &ys, &tiny, &mut []).unwrap_err();
        assert!(err.to_string().contains("no validation samples"));

        let half = FitConfig::new(1, 8).validation_split(0.5);
        assert!(fit(&mut model, &mut opt, &xs[..1], &ys[..1], &half, &mut []).is_err());

        // 7 samples at 0.1 still keep one for validation.
        let small = FitConfig::new(1, 8).validation_split(0.1).seed(Some(1));
        let history = fit(&mut model, &mut opt, &xs[..7], &ys[..7], &small, &mut []).unwrap();
        assert!(history.epochs[0].val_loss.is_some());
    }

    #[test]
    fn evaluate_empty_set_is_zero() {
        let model = toy_model();
        assert_eq!(evaluate(&model, &[], &[]).unwrap(), (0.0, 0.0));
    }
}
