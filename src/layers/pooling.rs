use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};
use crate::math::tensor::Tensor;

/// Non-overlapping 2-D max pooling (stride equals the pool size).
///
/// Trailing rows/columns that do not fill a whole window are dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaxPool2d {
    pub pool_size: (usize, usize),
    /// Input shape plus, for each output cell, the flat input index that won.
    #[serde(skip)]
    cache: Option<(Vec<usize>, Vec<usize>)>,
}

impl MaxPool2d {
    pub fn new(pool_size: (usize, usize)) -> MaxPool2d {
        MaxPool2d { pool_size, cache: None }
    }

    pub fn output_shape(&self, input: &[usize]) -> Result<Vec<usize>> {
        let (ph, pw) = self.pool_size;
        match input {
            [c, h, w] if ph > 0 && pw > 0 && *h >= ph && *w >= pw => Ok(vec![*c, h / ph, w / pw]),
            _ => Err(Error::shape(format!(
                "MaxPooling2D({}x{}) cannot pool input {:?}",
                ph, pw, input
            ))),
        }
    }

    fn pool(&self, input: &Tensor) -> Result<(Tensor, Vec<usize>)> {
        let out_shape = self.output_shape(&input.shape)?;
        let (h, w) = (input.shape[1], input.shape[2]);
        let (ph, pw) = self.pool_size;
        let (c, oh, ow) = (out_shape[0], out_shape[1], out_shape[2]);

        let mut out = Tensor::zeros(&out_shape);
        let mut winners = vec![0usize; out.numel()];
        for ch in 0..c {
            for oy in 0..oh {
                for ox in 0..ow {
                    let mut best_idx = (ch * h + oy * ph) * w + ox * pw;
                    for py in 0..ph {
                        for px in 0..pw {
                            let idx = (ch * h + oy * ph + py) * w + ox * pw + px;
                            if input.data[idx] > input.data[best_idx] {
                                best_idx = idx;
                            }
                        }
                    }
                    let o = (ch * oh + oy) * ow + ox;
                    out.data[o] = input.data[best_idx];
                    winners[o] = best_idx;
                }
            }
        }
        Ok((out, winners))
    }

    pub fn infer(&self, input: &Tensor) -> Result<Tensor> {
        self.pool(input).map(|(out, _)| out)
    }

    pub fn forward(&mut self, input: &Tensor) -> Result<Tensor> {
        let (out, winners) = self.pool(input)?;
        self.cache = Some((input.shape.clone(), winners));
        Ok(out)
    }

    /// Routes each output gradient back to the input cell that produced the max.
    pub fn backward(&mut self, grad_out: &Tensor) -> Result<Tensor> {
        let (input_shape, winners) = self
            .cache
            .take()
            .ok_or_else(|| Error::shape("MaxPooling2D backward called before forward"))?;
        if grad_out.numel() != winners.len() {
            return Err(Error::shape(format!(
                "MaxPooling2D gradient has {} values, expected {}",
                grad_out.numel(),
                winners.len()
            )));
        }
        let mut grad_in = Tensor::zeros(&input_shape);
        for (g, &idx) in grad_out.data.iter().zip(winners.iter()) {
            grad_in.data[idx] += g;
        }
        Ok(grad_in)
    }
}
