use rand::rngs::StdRng;
use rand::SeedableRng;

use ferrite_metrics::{ModelSpec, Sequential, Tensor};

#[test]
fn mnist_convnet_matches_reference_shapes_and_counts() -> anyhow::Result<()> {
    let model = ModelSpec::mnist_convnet(10).build(&mut StdRng::seed_from_u64(0))?;

    assert_eq!(model.name, "sequential");
    assert_eq!(
        model.layer_shapes()?,
        vec![
            vec![32, 26, 26],
            vec![32, 13, 13],
            vec![64, 11, 11],
            vec![64, 5, 5],
            vec![1600],
            vec![1600],
            vec![10],
        ]
    );
    let counts: Vec<usize> = model.layers.iter().map(|l| l.param_count()).collect();
    assert_eq!(counts, vec![320, 0, 18496, 0, 0, 0, 16010]);
    assert_eq!(model.param_count(), 34_826);

    let summary = model.summary()?;
    assert!(summary.contains("Model: \"sequential\""));
    assert!(summary.contains("conv2d_1 (Conv2D)"));
    assert!(summary.contains("(None, 64, 11, 11)"));
    assert!(summary.contains("Total params: 34,826"));
    Ok(())
}

#[test]
fn saved_model_predicts_identically_after_reload() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("model.json");
    let model = ModelSpec::mnist_convnet(10).build(&mut StdRng::seed_from_u64(4))?;
    model.save_json(&path)?;
    let loaded = Sequential::load_json(&path)?;

    let input = Tensor::from_vec(&[1, 28, 28], (0..784).map(|i| (i % 17) as f64 / 17.0).collect())?;
    let a = model.infer(&input)?;
    let b = loaded.infer(&input)?;
    assert_eq!(a.shape, vec![10]);
    assert!((a.data.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    for (x, y) in a.data.iter().zip(b.data.iter()) {
        assert!((x - y).abs() < 1e-12);
    }
    Ok(())
}

#[test]
fn model_spec_round_trips_through_json() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("spec.json");
    let spec = ModelSpec::mnist_convnet(3);
    spec.save_json(&path)?;
    assert_eq!(ModelSpec::load_json(&path)?, spec);
    Ok(())
}
