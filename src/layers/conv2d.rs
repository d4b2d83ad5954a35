use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{Error, Result};
use crate::layers::{ensure_grad, Param};
use crate::math::tensor::Tensor;

/// 2-D convolution with `valid` padding and stride 1.
///
/// Input is `[in_channels, height, width]`, output is
/// `[filters, height - kh + 1, width - kw + 1]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conv2d {
    pub filters: usize,
    pub in_channels: usize,
    pub kernel_size: (usize, usize),
    pub activation: ActivationFunction,
    /// `[filters, in_channels, kh, kw]`
    pub weights: Tensor,
    /// `[filters]`
    pub biases: Tensor,
    #[serde(skip)]
    weights_grad: Tensor,
    #[serde(skip)]
    biases_grad: Tensor,
    #[serde(skip)]
    input: Option<Tensor>,
    #[serde(skip)]
    pre_activation: Option<Tensor>,
}

impl Conv2d {
    pub fn new<R: Rng + ?Sized>(
        in_channels: usize,
        filters: usize,
        kernel_size: (usize, usize),
        activation: ActivationFunction,
        rng: &mut R,
    ) -> Conv2d {
        let (kh, kw) = kernel_size;
        let shape = [filters, in_channels, kh, kw];
        let weights = Tensor::glorot_uniform(&shape, in_channels * kh * kw, filters * kh * kw, rng);
        Conv2d {
            filters,
            in_channels,
            kernel_size,
            activation,
            weights_grad: Tensor::zeros(&shape),
            biases_grad: Tensor::zeros(&[filters]),
            weights,
            biases: Tensor::zeros(&[filters]),
            input: None,
            pre_activation: None,
        }
    }

    pub fn output_shape(&self, input: &[usize]) -> Result<Vec<usize>> {
        let (kh, kw) = self.kernel_size;
        match input {
            [c, h, w] if *c == self.in_channels && *h >= kh && *w >= kw => {
                Ok(vec![self.filters, h - kh + 1, w - kw + 1])
            }
            _ => Err(Error::shape(format!(
                "Conv2D expects [{}, >={}, >={}], got {:?}",
                self.in_channels, kh, kw, input
            ))),
        }
    }

    /// Pre-activation output `z = W * x + b`.
    fn convolve(&self, input: &Tensor) -> Result<Tensor> {
        let out_shape = self.output_shape(&input.shape)?;
        let (c, h, w) = (input.shape[0], input.shape[1], input.shape[2]);
        let (kh, kw) = self.kernel_size;
        let (oh, ow) = (out_shape[1], out_shape[2]);

        let mut z = Tensor::zeros(&out_shape);
        for f in 0..self.filters {
            let bias = self.biases.data[f];
            for oy in 0..oh {
                for ox in 0..ow {
                    let mut sum = bias;
                    for ch in 0..c {
                        for ky in 0..kh {
                            let in_row = (ch * h + oy + ky) * w + ox;
                            let w_row = ((f * c + ch) * kh + ky) * kw;
                            for kx in 0..kw {
                                sum += input.data[in_row + kx] * self.weights.data[w_row + kx];
                            }
                        }
                    }
                    z.data[(f * oh + oy) * ow + ox] = sum;
                }
            }
        }
        Ok(z)
    }

    pub fn infer(&self, input: &Tensor) -> Result<Tensor> {
        let z = self.convolve(input)?;
        Ok(z.map(|x| self.activation.function(x)))
    }

    pub fn forward(&mut self, input: &Tensor) -> Result<Tensor> {
        let z = self.convolve(input)?;
        let a = z.map(|x| self.activation.function(x));
        self.input = Some(input.clone());
        self.pre_activation = Some(z);
        Ok(a)
    }

    /// Accumulates kernel and bias gradients for the cached sample and
    /// returns the gradient with respect to the layer input.
    pub fn backward(&mut self, grad_out: &Tensor) -> Result<Tensor> {
        let (input, z) = match (self.input.take(), self.pre_activation.take()) {
            (Some(input), Some(z)) => (input, z),
            _ => return Err(Error::shape("Conv2D backward called before forward")),
        };
        if grad_out.shape != z.shape {
            return Err(Error::shape(format!(
                "Conv2D gradient {:?} does not match output {:?}",
                grad_out.shape, z.shape
            )));
        }
        ensure_grad(&mut self.weights_grad, &self.weights);
        ensure_grad(&mut self.biases_grad, &self.biases);

        let (c, h, w) = (input.shape[0], input.shape[1], input.shape[2]);
        let (kh, kw) = self.kernel_size;
        let (oh, ow) = (z.shape[1], z.shape[2]);

        let mut grad_in = Tensor::zeros(&input.shape);
        for f in 0..self.filters {
            for oy in 0..oh {
                for ox in 0..ow {
                    let o = (f * oh + oy) * ow + ox;
                    let delta = grad_out.data[o] * self.activation.derivative(z.data[o]);
                    if delta == 0.0 {
                        continue;
                    }
                    self.biases_grad.data[f] += delta;
                    for ch in 0..c {
                        for ky in 0..kh {
                            let in_row = (ch * h + oy + ky) * w + ox;
                            let w_row = ((f * c + ch) * kh + ky) * kw;
                            for kx in 0..kw {
                                self.weights_grad.data[w_row + kx] += delta * input.data[in_row + kx];
                                grad_in.data[in_row + kx] += delta * self.weights.data[w_row + kx];
                            }
                        }
                    }
                }
            }
        }
        Ok(grad_in)
    }

    pub fn parameters(&mut self) -> Vec<Param<'_>> {
        ensure_grad(&mut self.weights_grad, &self.weights);
        ensure_grad(&mut self.biases_grad, &self.biases);
        vec![
            Param { value: &mut self.weights, grad: &mut self.weights_grad },
            Param { value: &mut self.biases, grad: &mut self.biases_grad },
        ]
    }

    pub fn param_count(&self) -> usize {
        self.weights.numel() + self.biases.numel()
    }
}
