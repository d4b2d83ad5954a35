use crate::error::{Error, Result};
use crate::math::tensor::argmax;

/// Class index of the highest probability in each row.
pub fn argmax_rows(predictions: &[Vec<f64>]) -> Vec<usize> {
    predictions.iter().map(|row| argmax(row)).collect()
}

/// Fraction of positions where `y_true` and `y_pred` agree.
pub fn accuracy_score(y_true: &[usize], y_pred: &[usize]) -> Result<f64> {
    if y_true.len() != y_pred.len() {
        return Err(Error::metric(format!(
            "y_true has {} samples but y_pred has {}",
            y_true.len(),
            y_pred.len()
        )));
    }
    if y_true.is_empty() {
        return Err(Error::metric("cannot score an empty label set"));
    }
    let correct = y_true.iter().zip(y_pred.iter()).filter(|(t, p)| t == p).count();
    Ok(correct as f64 / y_true.len() as f64)
}

/// Converts class indices into one-hot rows of length `num_classes`.
pub fn to_categorical(labels: &[usize], num_classes: usize) -> Result<Vec<Vec<f64>>> {
    labels
        .iter()
        .enumerate()
        .map(|(i, &class)| {
            if class >= num_classes {
                return Err(Error::metric(format!(
                    "label at index {} is {}, out of range for {} classes",
                    i, class, num_classes
                )));
            }
            let mut one_hot = vec![0.0; num_classes];
            one_hot[class] = 1.0;
            Ok(one_hot)
        })
        .collect()
}
