use serde::{Serialize, Deserialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationFunction {
    Identity,
    #[serde(rename = "relu")]
    ReLU,
    /// Vector-valued; applied over a whole output vector by `apply()`.
    Softmax,
}

impl ActivationFunction {
    /// Element-wise activation. `Softmax` has no element-wise form and
    /// passes values through; use `apply()` for it.
    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::ReLU => if x > 0.0 { x } else { 0.0 },
            ActivationFunction::Identity | ActivationFunction::Softmax => x,
        }
    }

    /// Element-wise derivative at the pre-activation value `x`.
    ///
    /// `Softmax` returns 1.0: it is always paired with cross-entropy, whose
    /// derivative is already the combined gradient `predicted - expected`.
    pub fn derivative(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::ReLU => if x > 0.0 { 1.0 } else { 0.0 },
            ActivationFunction::Identity | ActivationFunction::Softmax => 1.0,
        }
    }

    /// Applies the activation to a full vector of pre-activations.
    pub fn apply(&self, z: &[f64]) -> Vec<f64> {
        match self {
            ActivationFunction::Softmax => softmax(z),
            _ => z.iter().map(|&x| self.function(x)).collect(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ActivationFunction::Identity => "identity",
            ActivationFunction::ReLU => "relu",
            ActivationFunction::Softmax => "softmax",
        }
    }
}

/// Max-shifted softmax so large logits do not overflow `exp`.
fn softmax(z: &[f64]) -> Vec<f64> {
    let max = z.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = z.iter().map(|&x| (x - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}
