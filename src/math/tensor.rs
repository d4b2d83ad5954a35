use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};

/// Dense row-major tensor of `f64` values.
///
/// Image tensors use the channels-first layout `[channels, height, width]`;
/// dense weights are `[inputs, units]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    pub shape: Vec<usize>,
    pub data: Vec<f64>,
}

impl Tensor {
    pub fn zeros(shape: &[usize]) -> Tensor {
        Tensor {
            shape: shape.to_vec(),
            data: vec![0.0; shape.iter().product()],
        }
    }

    /// Wraps `data` in a tensor of the given shape.
    ///
    /// Fails if `data.len()` differs from the product of `shape`.
    pub fn from_vec(shape: &[usize], data: Vec<f64>) -> Result<Tensor> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(Error::shape(format!(
                "shape {:?} holds {} values, got {}",
                shape, expected, data.len()
            )));
        }
        Ok(Tensor { shape: shape.to_vec(), data })
    }

    /// Glorot (Xavier) uniform initialization: samples from
    /// U(-limit, limit) with `limit = sqrt(6 / (fan_in + fan_out))`.
    ///
    /// Default kernel initializer for both convolution and dense layers.
    pub fn glorot_uniform<R: Rng + ?Sized>(
        shape: &[usize],
        fan_in: usize,
        fan_out: usize,
        rng: &mut R,
    ) -> Tensor {
        let limit = (6.0 / (fan_in + fan_out) as f64).sqrt();
        let n: usize = shape.iter().product();
        let data = (0..n).map(|_| rng.gen_range(-limit..limit)).collect();
        Tensor { shape: shape.to_vec(), data }
    }

    pub fn numel(&self) -> usize {
        self.data.len()
    }

    /// Returns the same data viewed under a new shape.
    pub fn reshape(self, shape: &[usize]) -> Result<Tensor> {
        Tensor::from_vec(shape, self.data)
    }

    pub fn map<F>(&self, functor: F) -> Tensor
    where
        F: Fn(f64) -> f64,
    {
        Tensor {
            shape: self.shape.clone(),
            data: self.data.iter().map(|&x| functor(x)).collect(),
        }
    }

    pub fn scale(&mut self, factor: f64) {
        for x in &mut self.data {
            *x *= factor;
        }
    }

    pub fn fill(&mut self, value: f64) {
        for x in &mut self.data {
            *x = value;
        }
    }
}

impl Default for Tensor {
    fn default() -> Self {
        Tensor { shape: vec![0], data: vec![] }
    }
}

/// Index of the maximum element in a slice.
///
/// Ties resolve to the first maximum; an empty slice yields 0.
pub fn argmax(v: &[f64]) -> usize {
    let mut best = 0;
    for (i, &x) in v.iter().enumerate() {
        if x > v[best] {
            best = i;
        }
    }
    best
}
