use rand::rngs::StdRng;
use rand::SeedableRng;

use ferrite_metrics::callbacks::{Callback, ScalarLogger, ScoreCallback};
use ferrite_metrics::data::toy::bars;
use ferrite_metrics::summary::{discover_runs, read_scalars};
use ferrite_metrics::{fit, ActivationFunction, Adam, FitConfig, LayerSpec, ModelSpec};

fn small_convnet() -> ModelSpec {
    ModelSpec {
        name: "sequential".to_string(),
        input_shape: vec![1, 6, 6],
        layers: vec![
            LayerSpec::Conv2d { filters: 2, kernel_size: [3, 3], activation: ActivationFunction::ReLU },
            LayerSpec::MaxPool2d { pool_size: [2, 2] },
            LayerSpec::Flatten,
            LayerSpec::Dropout { rate: 0.5 },
            LayerSpec::Dense { units: 2, activation: ActivationFunction::Softmax },
        ],
    }
}

#[test]
fn exports_one_jaccard_point_per_epoch() -> anyhow::Result<()> {
    let logs = tempfile::tempdir()?;
    let mut rng = StdRng::seed_from_u64(11);
    let train = bars(40, 6, &mut rng)?;
    let test = bars(12, 6, &mut rng)?;
    let mut model = small_convnet().build(&mut rng)?;

    let mut jaccard = ScoreCallback::jaccard(&model.name, test.images.clone(), test.labels.clone(), logs.path())?;
    let mut scalars = ScalarLogger::create(logs.path())?;
    let mut optimizer = Adam::new(0.01);
    let config = FitConfig::new(3, 8).validation_split(0.1).seed(Some(5));

    let history = {
        let mut callbacks: Vec<&mut dyn Callback> = vec![&mut jaccard, &mut scalars];
        fit(&mut model, &mut optimizer, &train.images, &train.one_hot()?, &config, &mut callbacks)?
    };
    assert_eq!(history.len(), 3);
    assert_eq!(jaccard.epoch(), 3);

    let series = read_scalars(&logs.path().join("sequential"))?;
    assert_eq!(series.len(), 1);
    let points = &series["jaccard_score"];
    assert_eq!(points.iter().map(|p| p.step).collect::<Vec<_>>(), vec![1, 2, 3]);
    for p in points {
        assert!((0.0..=1.0).contains(&p.value), "jaccard out of range: {}", p.value);
    }
    assert!((points[2].value - jaccard.last_value()).abs() < 1e-6);

    let runs = discover_runs(logs.path())?;
    assert_eq!(runs, vec!["sequential", "train", "validation"]);
    let train_series = read_scalars(&logs.path().join("train"))?;
    assert_eq!(train_series["epoch_loss"].len(), 3);
    Ok(())
}

#[test]
fn two_runs_in_one_log_dir_do_not_clobber() -> anyhow::Result<()> {
    let logs = tempfile::tempdir()?;
    let mut rng = StdRng::seed_from_u64(2);
    let train = bars(16, 6, &mut rng)?;
    let test = bars(6, 6, &mut rng)?;

    for _ in 0..2 {
        let mut model = small_convnet().build(&mut rng)?;
        let mut cb = ScoreCallback::jaccard(&model.name, test.images.clone(), test.labels.clone(), logs.path())?;
        let mut optimizer = Adam::new(0.01);
        let mut callbacks: Vec<&mut dyn Callback> = vec![&mut cb];
        fit(&mut model, &mut optimizer, &train.images, &train.one_hot()?, &FitConfig::new(2, 8), &mut callbacks)?;
    }

    let points = &read_scalars(&logs.path().join("sequential"))?["jaccard_score"];
    assert_eq!(points.iter().map(|p| p.step).collect::<Vec<_>>(), vec![1, 2, 1, 2]);
    Ok(())
}
