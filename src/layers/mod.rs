pub mod conv2d;
pub mod dense;
pub mod dropout;
pub mod flatten;
pub mod pooling;

use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::error::Result;
use crate::math::tensor::Tensor;

pub use conv2d::Conv2d;
pub use dense::Dense;
pub use dropout::Dropout;
pub use flatten::Flatten;
pub use pooling::MaxPool2d;

/// A trainable tensor paired with its accumulated gradient.
pub struct Param<'a> {
    pub value: &'a mut Tensor,
    pub grad: &'a mut Tensor,
}

/// One layer of a `Sequential` model.
///
/// `forward` caches what `backward` needs for a single sample; `infer` is the
/// side-effect-free path used for prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Layer {
    Conv2d(Conv2d),
    MaxPool2d(MaxPool2d),
    Flatten(Flatten),
    Dropout(Dropout),
    Dense(Dense),
}

impl Layer {
    /// Display name used by the model summary.
    pub fn kind(&self) -> &'static str {
        match self {
            Layer::Conv2d(_) => "Conv2D",
            Layer::MaxPool2d(_) => "MaxPooling2D",
            Layer::Flatten(_) => "Flatten",
            Layer::Dropout(_) => "Dropout",
            Layer::Dense(_) => "Dense",
        }
    }

    /// Base of the auto-generated layer name (`conv2d`, `conv2d_1`, ...).
    pub fn base_name(&self) -> &'static str {
        match self {
            Layer::Conv2d(_) => "conv2d",
            Layer::MaxPool2d(_) => "max_pooling2d",
            Layer::Flatten(_) => "flatten",
            Layer::Dropout(_) => "dropout",
            Layer::Dense(_) => "dense",
        }
    }

    pub fn output_shape(&self, input: &[usize]) -> Result<Vec<usize>> {
        match self {
            Layer::Conv2d(l) => l.output_shape(input),
            Layer::MaxPool2d(l) => l.output_shape(input),
            Layer::Flatten(l) => l.output_shape(input),
            Layer::Dropout(_) => Ok(input.to_vec()),
            Layer::Dense(l) => l.output_shape(input),
        }
    }

    pub fn infer(&self, input: &Tensor) -> Result<Tensor> {
        match self {
            Layer::Conv2d(l) => l.infer(input),
            Layer::MaxPool2d(l) => l.infer(input),
            Layer::Flatten(l) => l.infer(input),
            Layer::Dropout(l) => l.infer(input),
            Layer::Dense(l) => l.infer(input),
        }
    }

    pub fn forward<R: Rng + ?Sized>(&mut self, input: &Tensor, rng: &mut R) -> Result<Tensor> {
        match self {
            Layer::Conv2d(l) => l.forward(input),
            Layer::MaxPool2d(l) => l.forward(input),
            Layer::Flatten(l) => l.forward(input),
            Layer::Dropout(l) => l.forward(input, rng),
            Layer::Dense(l) => l.forward(input),
        }
    }

    pub fn backward(&mut self, grad_out: &Tensor) -> Result<Tensor> {
        match self {
            Layer::Conv2d(l) => l.backward(grad_out),
            Layer::MaxPool2d(l) => l.backward(grad_out),
            Layer::Flatten(l) => l.backward(grad_out),
            Layer::Dropout(l) => l.backward(grad_out),
            Layer::Dense(l) => l.backward(grad_out),
        }
    }

    pub fn parameters(&mut self) -> Vec<Param<'_>> {
        match self {
            Layer::Conv2d(l) => l.parameters(),
            Layer::Dense(l) => l.parameters(),
            _ => Vec::new(),
        }
    }

    pub fn param_count(&self) -> usize {
        match self {
            Layer::Conv2d(l) => l.param_count(),
            Layer::Dense(l) => l.param_count(),
            _ => 0,
        }
    }
}

/// Gradient buffers are skipped when a model is serialized; reshape them
/// to match their parameter before use.
pub(crate) fn ensure_grad(grad: &mut Tensor, like: &Tensor) {
    if grad.shape != like.shape {
        *grad = Tensor::zeros(&like.shape);
    }
}
