use crate::layers::Param;
use crate::optim::Optimizer;

pub struct Sgd {
    pub learning_rate: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Sgd {
        Sgd { learning_rate }
    }
}

impl Optimizer for Sgd {
    /// value -= lr * grad
    fn step(&mut self, params: &mut [Param<'_>]) {
        for p in params.iter_mut() {
            for (w, g) in p.value.data.iter_mut().zip(p.grad.data.iter()) {
                *w -= self.learning_rate * g;
            }
        }
    }

    fn name(&self) -> &'static str {
        "sgd"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::tensor::Tensor;

    #[test]
    fn step_moves_against_gradient() {
        let mut value = Tensor::from_vec(&[2], vec![1.0, -1.0]).unwrap();
        let mut grad = Tensor::from_vec(&[2], vec![0.5, -2.0]).unwrap();
        let mut sgd = Sgd::new(0.1);
        sgd.step(&mut [Param { value: &mut value, grad: &mut grad }]);
        assert!((value.data[0] - 0.95).abs() < 1e-12);
        assert!((value.data[1] + 0.8).abs() < 1e-12);
    }
}
