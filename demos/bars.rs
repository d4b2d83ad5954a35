/// End-to-end run on the synthetic bars dataset: no downloads needed.
///
/// Architecture: Conv2D(4, 3×3, ReLU) → MaxPool(2×2) → Flatten → Dense(2, Softmax)
/// Loss:         CrossEntropyLoss
/// Optimizer:    Adam, lr = 0.01
/// Callbacks:    per-epoch Jaccard score on a held-out set, plus loss/accuracy curves
///
/// Run with:
///   cargo run --example bars --release
/// Then inspect the curves:
///   cargo run --bin board -- --logdir logs/bars

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

use ferrite_metrics::callbacks::{Callback, ScalarLogger, ScoreCallback};
use ferrite_metrics::data::toy::bars;
use ferrite_metrics::{fit, ActivationFunction, Adam, FitConfig, LayerSpec, ModelSpec};

const IMAGE_SIZE: usize = 8;
const EPOCHS: usize = 10;
const LOG_DIR: &str = "logs/bars";

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut rng = StdRng::seed_from_u64(42);
    let train = bars(400, IMAGE_SIZE, &mut rng)?;
    let test = bars(100, IMAGE_SIZE, &mut rng)?;
    println!("{} train samples", train.len());
    println!("{} test samples", test.len());

    let spec = ModelSpec {
        name: "bars_convnet".to_string(),
        input_shape: vec![1, IMAGE_SIZE, IMAGE_SIZE],
        layers: vec![
            LayerSpec::Conv2d { filters: 4, kernel_size: [3, 3], activation: ActivationFunction::ReLU },
            LayerSpec::MaxPool2d { pool_size: [2, 2] },
            LayerSpec::Flatten,
            LayerSpec::Dense { units: 2, activation: ActivationFunction::Softmax },
        ],
    };
    let mut model = spec.build(&mut rng)?;
    println!("{}", model.summary()?);

    let mut jaccard = ScoreCallback::jaccard(&model.name, test.images.clone(), test.labels.clone(), LOG_DIR)?;
    let mut scalars = ScalarLogger::create(LOG_DIR)?;
    let mut optimizer = Adam::new(0.01);
    let config = FitConfig::new(EPOCHS, 16).validation_split(0.1).seed(Some(42));

    let history = {
        let mut callbacks: Vec<&mut dyn Callback> = vec![&mut jaccard, &mut scalars];
        fit(&mut model, &mut optimizer, &train.images, &train.one_hot()?, &config, &mut callbacks)?
    };

    println!();
    println!("{:>6}  {:>10}  {:>10}  {:>10}", "epoch", "loss", "accuracy", "val_acc");
    for e in &history.epochs {
        println!(
            "{:>6}  {:>10.4}  {:>10.4}  {:>10.4}",
            e.epoch,
            e.loss,
            e.accuracy,
            e.val_accuracy.unwrap_or(0.0)
        );
    }
    println!();
    println!("Final jaccard_score: {:.4}", jaccard.last_value());
    println!("Event files written under {}", LOG_DIR);
    Ok(())
}
