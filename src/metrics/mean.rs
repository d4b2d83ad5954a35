use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};

/// Named running mean over every value fed to it since the last reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mean {
    name: String,
    total: f64,
    count: f64,
}

impl Mean {
    pub fn new(name: impl Into<String>) -> Mean {
        Mean { name: name.into(), total: 0.0, count: 0.0 }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds every value with weight 1.
    pub fn update_state(&mut self, values: &[f64]) {
        self.total += values.iter().sum::<f64>();
        self.count += values.len() as f64;
    }

    pub fn update_state_weighted(&mut self, values: &[f64], weights: &[f64]) -> Result<()> {
        if values.len() != weights.len() {
            return Err(Error::metric(format!(
                "{} values but {} weights",
                values.len(),
                weights.len()
            )));
        }
        for (v, w) in values.iter().zip(weights.iter()) {
            self.total += v * w;
            self.count += w;
        }
        Ok(())
    }

    /// Current mean; 0.0 before any update.
    pub fn result(&self) -> f64 {
        if self.count == 0.0 {
            0.0
        } else {
            self.total / self.count
        }
    }

    pub fn reset_state(&mut self) {
        self.total = 0.0;
        self.count = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_until_reset() {
        let mut m = Mean::new("jaccard_score");
        assert_eq!(m.result(), 0.0);
        m.update_state(&[1.0, 0.5]);
        m.update_state(&[0.0]);
        assert!((m.result() - 0.5).abs() < 1e-12);
        m.reset_state();
        assert_eq!(m.result(), 0.0);
        assert_eq!(m.name(), "jaccard_score");
    }

    #[test]
    fn weighted_update() {
        let mut m = Mean::new("w");
        m.update_state_weighted(&[1.0, 4.0], &[3.0, 1.0]).unwrap();
        assert!((m.result() - 7.0 / 4.0).abs() < 1e-12);
        assert!(m.update_state_weighted(&[1.0], &[]).is_err());
    }
}
