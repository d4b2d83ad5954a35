use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{Error, Result};
use crate::layers::{ensure_grad, Param};
use crate::math::tensor::Tensor;

/// Fully connected layer over a flat input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dense {
    pub units: usize,
    pub input_size: usize,
    pub activation: ActivationFunction,
    /// `[input_size, units]`
    pub weights: Tensor,
    /// `[units]`
    pub biases: Tensor,
    #[serde(skip)]
    weights_grad: Tensor,
    #[serde(skip)]
    biases_grad: Tensor,
    #[serde(skip)]
    input: Option<Tensor>,
    #[serde(skip)]
    pre_activation: Option<Vec<f64>>,
}

impl Dense {
    pub fn new<R: Rng + ?Sized>(
        units: usize,
        input_size: usize,
        activation: ActivationFunction,
        rng: &mut R,
    ) -> Dense {
        let shape = [input_size, units];
        Dense {
            units,
            input_size,
            activation,
            weights: Tensor::glorot_uniform(&shape, input_size, units, rng),
            biases: Tensor::zeros(&[units]),
            weights_grad: Tensor::zeros(&shape),
            biases_grad: Tensor::zeros(&[units]),
            input: None,
            pre_activation: None,
        }
    }

    pub fn output_shape(&self, input: &[usize]) -> Result<Vec<usize>> {
        if input != [self.input_size] {
            return Err(Error::shape(format!(
                "Dense expects [{}], got {:?}",
                self.input_size, input
            )));
        }
        Ok(vec![self.units])
    }

    /// Pre-activation `z = x W + b`.
    fn linear(&self, input: &Tensor) -> Result<Vec<f64>> {
        self.output_shape(&input.shape)?;
        let mut z = self.biases.data.clone();
        for (i, &x) in input.data.iter().enumerate() {
            if x == 0.0 {
                continue;
            }
            let row = &self.weights.data[i * self.units..(i + 1) * self.units];
            for (zj, wij) in z.iter_mut().zip(row.iter()) {
                *zj += x * wij;
            }
        }
        Ok(z)
    }

    pub fn infer(&self, input: &Tensor) -> Result<Tensor> {
        let z = self.linear(input)?;
        Tensor::from_vec(&[self.units], self.activation.apply(&z))
    }

    pub fn forward(&mut self, input: &Tensor) -> Result<Tensor> {
        let z = self.linear(input)?;
        let a = Tensor::from_vec(&[self.units], self.activation.apply(&z))?;
        self.input = Some(input.clone());
        self.pre_activation = Some(z);
        Ok(a)
    }

    /// `grad_out` is dL/da for this layer. For a softmax output it must be the
    /// combined softmax + cross-entropy gradient.
    pub fn backward(&mut self, grad_out: &Tensor) -> Result<Tensor> {
        let (input, z) = match (self.input.take(), self.pre_activation.take()) {
            (Some(input), Some(z)) => (input, z),
            _ => return Err(Error::shape("Dense backward called before forward")),
        };
        if grad_out.shape != [self.units] {
            return Err(Error::shape(format!(
                "Dense gradient {:?} does not match [{}]",
                grad_out.shape, self.units
            )));
        }
        ensure_grad(&mut self.weights_grad, &self.weights);
        ensure_grad(&mut self.biases_grad, &self.biases);

        // δ = error ⊙ σ'(z)
        let delta: Vec<f64> = grad_out.data.iter().zip(z.iter())
            .map(|(g, &zj)| g * self.activation.derivative(zj))
            .collect();

        let mut grad_in = Tensor::zeros(&[self.input_size]);
        for (i, &x) in input.data.iter().enumerate() {
            let row = i * self.units;
            let mut acc = 0.0;
            for (j, &d) in delta.iter().enumerate() {
                self.weights_grad.data[row + j] += x * d;
                acc += self.weights.data[row + j] * d;
            }
            grad_in.data[i] = acc;
        }
        for (b, d) in self.biases_grad.data.iter_mut().zip(delta.iter()) {
            *b += d;
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

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn forward_is_affine_then_activation() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut dense = Dense::new(2, 3, ActivationFunction::ReLU, &mut rng);
        dense.weights = Tensor::from_vec(&[3, 2], vec![1.0, -1.0, 0.5, 2.0, 0.0, 1.0]).unwrap();
        dense.biases = Tensor::from_vec(&[2], vec![0.5, -10.0]).unwrap();
        let x = Tensor::from_vec(&[3], vec![1.0, 2.0, 3.0]).unwrap();
        let out = dense.forward(&x).unwrap();
        // z = [1 + 1 + 0 + 0.5, -1 + 4 + 3 - 10] = [2.5, -4]
        assert_eq!(out.data, vec![2.5, 0.0]);

        let grad_in = dense.backward(&Tensor::from_vec(&[2], vec![1.0, 1.0]).unwrap()).unwrap();
        // Second unit is inactive, so only column 0 contributes.
        assert_eq!(grad_in.data, vec![1.0, 0.5, 0.0]);
        assert_eq!(dense.weights_grad.data, vec![1.0, 0.0, 2.0, 0.0, 3.0, 0.0]);
        assert_eq!(dense.biases_grad.data, vec![1.0, 0.0]);
    }

    #[test]
    fn rejects_wrong_input_size() {
        let mut rng = StdRng::seed_from_u64(5);
        let dense = Dense::new(10, 1600, ActivationFunction::Softmax, &mut rng);
        assert_eq!(dense.param_count(), 16010);
        assert!(dense.infer(&Tensor::zeros(&[1599])).is_err());
    }
}
