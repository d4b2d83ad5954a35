pub mod error;
pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod loss;
pub mod optim;
pub mod train;
pub mod callbacks;
pub mod metrics;
pub mod summary;
pub mod data;
pub mod config;

// Convenience re-exports
pub use error::{Error, Result};
pub use math::tensor::Tensor;
pub use activation::activation::ActivationFunction;
pub use layers::Layer;
pub use network::{LayerSpec, ModelSpec, Sequential};
pub use loss::cross_entropy::CrossEntropyLoss;
pub use optim::{Adam, Optimizer, OptimizerSpec, Sgd};
pub use train::{evaluate, fit, EpochLogs, FitConfig, History};
pub use callbacks::{Callback, ScalarLogger, ScoreCallback};
pub use metrics::{jaccard_per_class, jaccard_score, Average, Mean};
pub use summary::SummaryWriter;
pub use data::Dataset;
pub use config::RunConfig;
