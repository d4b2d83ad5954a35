use crate::layers::Param;
use crate::optim::Optimizer;

/// Adam with bias-corrected step size.
///
/// Moment buffers are matched to parameters by position, so the same model
/// must be passed to every `step`.
pub struct Adam {
    pub learning_rate: f64,
    pub beta_1: f64,
    pub beta_2: f64,
    pub epsilon: f64,
    iterations: u64,
    moments: Vec<(Vec<f64>, Vec<f64>)>,
}

impl Adam {
    pub fn new(learning_rate: f64) -> Adam {
        Adam {
            learning_rate,
            beta_1: 0.9,
            beta_2: 0.999,
            epsilon: 1e-7,
            iterations: 0,
            moments: Vec::new(),
        }
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    fn sync_moments(&mut self, params: &[Param<'_>]) {
        let stale = self.moments.len() != params.len()
            || self.moments.iter().zip(params.iter()).any(|((m, _), p)| m.len() != p.value.numel());
        if stale {
            self.moments = params
                .iter()
                .map(|p| (vec![0.0; p.value.numel()], vec![0.0; p.value.numel()]))
                .collect();
            self.iterations = 0;
        }
    }
}

impl Default for Adam {
    fn default() -> Self {
        Adam::new(0.001)
    }
}

impl Optimizer for Adam {
    fn step(&mut self, params: &mut [Param<'_>]) {
        self.sync_moments(params);
        self.iterations += 1;
        let t = self.iterations as i32;
        let alpha = self.learning_rate * (1.0 - self.beta_2.powi(t)).sqrt() / (1.0 - self.beta_1.powi(t));

        for (p, (m, v)) in params.iter_mut().zip(self.moments.iter_mut()) {
            for i in 0..p.value.data.len() {
                let g = p.grad.data[i];
                m[i] += (g - m[i]) * (1.0 - self.beta_1);
                v[i] += (g * g - v[i]) * (1.0 - self.beta_2);
                p.value.data[i] -= alpha * m[i] / (v[i].sqrt() + self.epsilon);
            }
        }
    }

    fn name(&self) -> &'static str {
        "adam"
    }
}
