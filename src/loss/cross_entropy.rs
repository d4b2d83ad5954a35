use crate::error::{Error, Result};

/// Categorical cross-entropy over one-hot targets, paired with a Softmax
/// output layer.
pub struct CrossEntropyLoss;

/// Keeps `ln` finite when a predicted probability underflows to zero.
const EPS: f64 = 1e-12;

impl CrossEntropyLoss {
    /// L = -sum(expected[i] * ln(predicted[i] + eps))
    pub fn loss(predicted: &[f64], expected: &[f64]) -> Result<f64> {
        check_lengths(predicted, expected)?;
        Ok(predicted.iter().zip(expected.iter())
            .map(|(p, e)| -e * (p + EPS).ln())
            .sum())
    }

    /// Gradient with respect to the softmax logits: `predicted - expected`.
    ///
    /// The Softmax activation's own derivative is 1.0, so this delta passes
    /// through the output layer unchanged.
    pub fn derivative(predicted: &[f64], expected: &[f64]) -> Result<Vec<f64>> {
        check_lengths(predicted, expected)?;
        Ok(predicted.iter().zip(expected.iter())
            .map(|(p, e)| p - e)
            .collect())
    }
}

fn check_lengths(predicted: &[f64], expected: &[f64]) -> Result<()> {
    if predicted.len() != expected.len() {
        return Err(Error::shape(format!(
            "prediction has {} classes but target has {}",
            predicted.len(),
            expected.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loss_is_negative_log_of_true_class() {
        let loss = CrossEntropyLoss::loss(&[0.25, 0.5, 0.25], &[0.0, 1.0, 0.0]).unwrap();
        assert!((loss - 2.0_f64.ln()).abs() < 1e-9);
        assert!(CrossEntropyLoss::loss(&[0.0, 1.0], &[1.0, 0.0]).unwrap().is_finite());
    }

    #[test]
    fn derivative_is_prediction_minus_target() {
        let d = CrossEntropyLoss::derivative(&[0.2, 0.8], &[0.0, 1.0]).unwrap();
        assert!((d[0] - 0.2).abs() < 1e-12 && (d[1] + 0.2).abs() < 1e-12);
        assert!(CrossEntropyLoss::derivative(&[0.2], &[0.0, 1.0]).is_err());
    }
}
