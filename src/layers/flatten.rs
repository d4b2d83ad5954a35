use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};
use crate::math::tensor::Tensor;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Flatten {
    #[serde(skip)]
    input_shape: Option<Vec<usize>>,
}

impl Flatten {
    pub fn new() -> Flatten {
        Flatten::default()
    }

    pub fn output_shape(&self, input: &[usize]) -> Result<Vec<usize>> {
        if input.is_empty() {
            return Err(Error::shape("Flatten needs a non-scalar input"));
        }
        Ok(vec![input.iter().product()])
    }

    pub fn infer(&self, input: &Tensor) -> Result<Tensor> {
        let shape = self.output_shape(&input.shape)?;
        input.clone().reshape(&shape)
    }

    pub fn forward(&mut self, input: &Tensor) -> Result<Tensor> {
        let out = self.infer(input)?;
        self.input_shape = Some(input.shape.clone());
        Ok(out)
    }

    pub fn backward(&mut self, grad_out: &Tensor) -> Result<Tensor> {
        let shape = self
            .input_shape
            .take()
            .ok_or_else(|| Error::shape("Flatten backward called before forward"))?;
        grad_out.clone().reshape(&shape)
    }
}
