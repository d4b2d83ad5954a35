pub mod adam;
pub mod sgd;

use serde::{Serialize, Deserialize};

use crate::layers::Param;

pub use adam::Adam;
pub use sgd::Sgd;

/// Applies one update to every parameter from its (batch-averaged) gradient.
pub trait Optimizer {
    fn step(&mut self, params: &mut [Param<'_>]);

    fn name(&self) -> &'static str;
}

/// Serializable optimizer choice, as written in a run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum OptimizerSpec {
    Adam {
        #[serde(default = "default_adam_lr")]
        learning_rate: f64,
    },
    Sgd {
        #[serde(default = "default_sgd_lr")]
        learning_rate: f64,
    },
}

fn default_adam_lr() -> f64 {
    0.001
}

fn default_sgd_lr() -> f64 {
    0.01
}

impl Default for OptimizerSpec {
    fn default() -> Self {
        OptimizerSpec::Adam { learning_rate: default_adam_lr() }
    }
}

impl OptimizerSpec {
    pub fn build(&self) -> Box<dyn Optimizer> {
        match *self {
            OptimizerSpec::Adam { learning_rate } => Box::new(Adam::new(learning_rate)),
            OptimizerSpec::Sgd { learning_rate } => Box::new(Sgd::new(learning_rate)),
        }
    }

    pub fn learning_rate(&self) -> f64 {
        match *self {
            OptimizerSpec::Adam { learning_rate } | OptimizerSpec::Sgd { learning_rate } => learning_rate,
        }
    }

    pub fn with_learning_rate(&self, learning_rate: f64) -> OptimizerSpec {
        match self {
            OptimizerSpec::Adam { .. } => OptimizerSpec::Adam { learning_rate },
            OptimizerSpec::Sgd { .. } => OptimizerSpec::Sgd { learning_rate },
        }
    }
}
