use std::path::Path;

use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{Error, Result};
use crate::layers::{Conv2d, Dense, Dropout, Flatten, Layer, MaxPool2d};
use crate::network::sequential::Sequential;

/// Describes one layer of a `ModelSpec`.
///
/// Input sizes are not stored; they are inferred from the previous layer's
/// output when a `ModelSpec` is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerSpec {
    Conv2d {
        filters: usize,
        kernel_size: [usize; 2],
        activation: ActivationFunction,
    },
    MaxPool2d {
        pool_size: [usize; 2],
    },
    Flatten,
    Dropout {
        rate: f64,
    },
    Dense {
        units: usize,
        activation: ActivationFunction,
    },
}

/// A serializable description of a model architecture, independent of any
/// trained weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Model name; also names the callback's log subdirectory.
    #[serde(default = "default_model_name")]
    pub name: String,
    /// Per-sample input shape, channels first.
    pub input_shape: Vec<usize>,
    /// Ordered list of layers (input → output).
    pub layers: Vec<LayerSpec>,
}

fn default_model_name() -> String {
    "sequential".to_string()
}

impl ModelSpec {
    /// The MNIST convnet: two conv/pool stages, dropout, softmax head.
    pub fn mnist_convnet(num_classes: usize) -> ModelSpec {
        ModelSpec {
            name: default_model_name(),
            input_shape: vec![1, 28, 28],
            layers: vec![
                LayerSpec::Conv2d { filters: 32, kernel_size: [3, 3], activation: ActivationFunction::ReLU },
                LayerSpec::MaxPool2d { pool_size: [2, 2] },
                LayerSpec::Conv2d { filters: 64, kernel_size: [3, 3], activation: ActivationFunction::ReLU },
                LayerSpec::MaxPool2d { pool_size: [2, 2] },
                LayerSpec::Flatten,
                LayerSpec::Dropout { rate: 0.5 },
                LayerSpec::Dense { units: num_classes, activation: ActivationFunction::Softmax },
            ],
        }
    }

    /// Instantiates every layer with freshly initialized weights.
    pub fn build<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Sequential> {
        let mut shape = self.input_shape.clone();
        let mut layers = Vec::with_capacity(self.layers.len());

        for spec in &self.layers {
            let layer = match spec {
                LayerSpec::Conv2d { filters, kernel_size, activation } => {
                    let in_channels = match shape.as_slice() {
                        [c, _, _] => *c,
                        _ => {
                            return Err(Error::shape(format!(
                                "Conv2D needs a [channels, height, width] input, got {:?}",
                                shape
                            )))
                        }
                    };
                    Layer::Conv2d(Conv2d::new(
                        in_channels,
                        *filters,
                        (kernel_size[0], kernel_size[1]),
                        *activation,
                        rng,
                    ))
                }
                LayerSpec::MaxPool2d { pool_size } => {
                    Layer::MaxPool2d(MaxPool2d::new((pool_size[0], pool_size[1])))
                }
                LayerSpec::Flatten => Layer::Flatten(Flatten::new()),
                LayerSpec::Dropout { rate } => Layer::Dropout(Dropout::new(*rate)?),
                LayerSpec::Dense { units, activation } => {
                    let input_size = match shape.as_slice() {
                        [n] => *n,
                        _ => {
                            return Err(Error::shape(format!(
                                "Dense needs a flat input, got {:?}; add a Flatten layer first",
                                shape
                            )))
                        }
                    };
                    Layer::Dense(Dense::new(*units, input_size, *activation, rng))
                }
            };
            shape = layer.output_shape(&shape)?;
            layers.push(layer);
        }

        Sequential::new(self.name.clone(), self.input_shape.clone(), layers)
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<ModelSpec> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn dense_without_flatten_is_rejected() {
        let spec = ModelSpec {
            name: "bad".into(),
            input_shape: vec![1, 8, 8],
            layers: vec![LayerSpec::Dense { units: 2, activation: ActivationFunction::Softmax }],
        };
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(spec.build(&mut rng), Err(Error::Shape(_))));
    }

    #[test]
    fn parses_from_json() {
        let json = r#"{
            "input_shape": [1, 8, 8],
            "layers": [
                {"type": "conv2d", "filters": 4, "kernel_size": [3, 3], "activation": "relu"},
                {"type": "max_pool2d", "pool_size": [2, 2]},
                {"type": "flatten"},
                {"type": "dropout", "rate": 0.25},
                {"type": "dense", "units": 2, "activation": "softmax"}
            ]
        }"#;
        let spec: ModelSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.name, "sequential");
        let mut rng = StdRng::seed_from_u64(0);
        let model = spec.build(&mut rng).unwrap();
        assert_eq!(model.output_shape().unwrap(), vec![2]);
        // conv: 4*1*3*3 + 4, dense: 4*3*3*2 + 2
        assert_eq!(model.param_count(), 40 + 74);
    }
}
