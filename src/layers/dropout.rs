use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};
use crate::math::tensor::Tensor;

/// Inverted dropout: during training each unit is zeroed with probability
/// `rate` and survivors are scaled by `1 / (1 - rate)`, so inference is the
/// identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dropout {
    pub rate: f64,
    #[serde(skip)]
    mask: Option<Vec<f64>>,
}

impl Dropout {
    /// `rate` must lie in `[0, 1)`.
    pub fn new(rate: f64) -> Result<Dropout> {
        if !(0.0..1.0).contains(&rate) {
            return Err(Error::config(format!("dropout rate must be in [0, 1), got {}", rate)));
        }
        Ok(Dropout { rate, mask: None })
    }

    pub fn infer(&self, input: &Tensor) -> Result<Tensor> {
        Ok(input.clone())
    }

    pub fn forward<R: Rng + ?Sized>(&mut self, input: &Tensor, rng: &mut R) -> Result<Tensor> {
        let keep_scale = 1.0 / (1.0 - self.rate);
        let mask: Vec<f64> = (0..input.numel())
            .map(|_| if rng.gen::<f64>() < self.rate { 0.0 } else { keep_scale })
            .collect();
        let mut out = input.clone();
        for (x, m) in out.data.iter_mut().zip(mask.iter()) {
            *x *= m;
        }
        self.mask = Some(mask);
        Ok(out)
    }

    pub fn backward(&mut self, grad_out: &Tensor) -> Result<Tensor> {
        let mask = self
            .mask
            .take()
            .ok_or_else(|| Error::shape("Dropout backward called before forward"))?;
        if mask.len() != grad_out.numel() {
            return Err(Error::shape("Dropout gradient does not match its mask"));
        }
        let mut grad_in = grad_out.clone();
        for (g, m) in grad_in.data.iter_mut().zip(mask.iter()) {
            *g *= m;
        }
        Ok(grad_in)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn rejects_rate_outside_unit_interval() {
        assert!(Dropout::new(1.0).is_err());
        assert!(Dropout::new(-0.1).is_err());
        assert!(Dropout::new(0.5).is_ok());
    }

    #[test]
    fn training_mask_scales_survivors_and_gradient() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut drop = Dropout::new(0.5).unwrap();
        let input = Tensor::from_vec(&[1000], vec![1.0; 1000]).unwrap();
        let out = drop.forward(&input, &mut rng).unwrap();
        assert!(out.data.iter().all(|&x| x == 0.0 || x == 2.0));
        let kept = out.data.iter().filter(|&&x| x > 0.0).count();
        assert!(kept > 400 && kept < 600);

        let grad = drop.backward(&input).unwrap();
        assert_eq!(grad.data, out.data);
        assert_eq!(drop.infer(&input).unwrap(), input);
    }
}
