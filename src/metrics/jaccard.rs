//! Jaccard similarity (intersection over union) for class-label vectors.
//!
//! For a label `l`, with `tp` the samples labelled `l` in both inputs:
//!
//! ```text
//! J(l) = tp / (|true == l| + |pred == l| - tp)
//! ```
//!
//! A label with an empty union scores 0.0.

use std::collections::BTreeSet;

use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};

/// How per-label scores are reduced to one number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Average {
    /// Pool true positives and unions over all labels, then divide.
    Micro,
    /// Unweighted mean of per-label scores.
    Macro,
    /// Mean of per-label scores weighted by each label's true support.
    Weighted,
    /// Score of `pos_label` only; the inputs must hold at most two labels.
    Binary { pos_label: usize },
}

/// Per-label scores, in the order of `labels`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerClassScores {
    pub labels: Vec<usize>,
    pub scores: Vec<f64>,
}

impl PerClassScores {
    pub fn get(&self, label: usize) -> Option<f64> {
        self.labels.iter().position(|&l| l == label).map(|i| self.scores[i])
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Counts {
    tp: usize,
    true_sum: usize,
    pred_sum: usize,
}

impl Counts {
    fn union(&self) -> usize {
        self.true_sum + self.pred_sum - self.tp
    }
}

/// Sorted set of labels appearing in either input.
pub fn unique_labels(y_true: &[usize], y_pred: &[usize]) -> Vec<usize> {
    y_true.iter().chain(y_pred.iter()).copied().collect::<BTreeSet<_>>().into_iter().collect()
}

fn check_inputs(y_true: &[usize], y_pred: &[usize]) -> Result<()> {
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
    Ok(())
}

fn count(y_true: &[usize], y_pred: &[usize], labels: &[usize]) -> Vec<Counts> {
    labels
        .iter()
        .map(|&l| {
            let mut c = Counts::default();
            for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
                let (is_t, is_p) = (t == l, p == l);
                c.true_sum += is_t as usize;
                c.pred_sum += is_p as usize;
                c.tp += (is_t && is_p) as usize;
            }
            c
        })
        .collect()
}

fn ratio(tp: usize, union: usize, label: Option<usize>) -> f64 {
    if union == 0 {
        match label {
            Some(l) => tracing::warn!(label = l, "jaccard: label has no true or predicted samples, scoring 0.0"),
            None => tracing::warn!("jaccard: empty union, scoring 0.0"),
        }
        return 0.0;
    }
    tp as f64 / union as f64
}

/// Jaccard score of every label.
///
/// `labels` defaults to the sorted union of labels in `y_true` and `y_pred`;
/// when given, labels absent from both inputs score 0.0.
pub fn jaccard_per_class(
    y_true: &[usize],
    y_pred: &[usize],
    labels: Option<&[usize]>,
) -> Result<PerClassScores> {
    check_inputs(y_true, y_pred)?;
    let labels = match labels {
        Some(l) => l.to_vec(),
        None => unique_labels(y_true, y_pred),
    };
    let scores = count(y_true, y_pred, &labels)
        .iter()
        .zip(labels.iter())
        .map(|(c, &l)| ratio(c.tp, c.union(), Some(l)))
        .collect();
    Ok(PerClassScores { labels, scores })
}

/// Jaccard score reduced with `average`.
pub fn jaccard_score(y_true: &[usize], y_pred: &[usize], average: Average) -> Result<f64> {
    check_inputs(y_true, y_pred)?;
    let present = unique_labels(y_true, y_pred);

    match average {
        Average::Binary { pos_label } => {
            if present.len() > 2 {
                return Err(Error::metric(format!(
                    "binary average needs at most two labels, found {}",
                    present.len()
                )));
            }
            if present.len() == 2 && !present.contains(&pos_label) {
                return Err(Error::metric(format!(
                    "pos_label {} is not one of the labels {:?}",
                    pos_label, present
                )));
            }
            let c = count(y_true, y_pred, &[pos_label])[0];
            Ok(ratio(c.tp, c.union(), Some(pos_label)))
        }
        Average::Micro => {
            let counts = count(y_true, y_pred, &present);
            let tp: usize = counts.iter().map(|c| c.tp).sum();
            let union: usize = counts.iter().map(|c| c.union()).sum();
            Ok(ratio(tp, union, None))
        }
        Average::Macro => {
            let per_class = jaccard_per_class(y_true, y_pred, Some(&present))?;
            Ok(per_class.scores.iter().sum::<f64>() / per_class.scores.len() as f64)
        }
        Average::Weighted => {
            let counts = count(y_true, y_pred, &present);
            let support: usize = counts.iter().map(|c| c.true_sum).sum();
            if support == 0 {
                return Ok(0.0);
            }
            let weighted: f64 = counts
                .iter()
                .map(|c| ratio(c.tp, c.union(), None) * c.true_sum as f64)
                .sum();
            Ok(weighted / support as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // y_true = [0, 1, 2, 0, 1, 2], y_pred = [0, 2, 1, 0, 0, 1]
    //   label 0: tp 2, true 2, pred 3 -> 2/3
    //   label 1: tp 0, true 2, pred 2 -> 0
    //   label 2: tp 0, true 2, pred 1 -> 0
    const Y_TRUE: [usize; 6] = [0, 1, 2, 0, 1, 2];
    const Y_PRED: [usize; 6] = [0, 2, 1, 0, 0, 1];

    #[test]
    fn per_class_matches_hand_count() {
        let s = jaccard_per_class(&Y_TRUE, &Y_PRED, None).unwrap();
        assert_eq!(s.labels, vec![0, 1, 2]);
        assert!((s.scores[0] - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(s.scores[1], 0.0);
        assert_eq!(s.scores[2], 0.0);
    }

    #[test]
    fn per_class_is_symmetric_in_its_arguments() {
        let a = jaccard_per_class(&Y_TRUE, &Y_PRED, None).unwrap();
        let b = jaccard_per_class(&Y_PRED, &Y_TRUE, None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn averages() {
        let macro_avg = jaccard_score(&Y_TRUE, &Y_PRED, Average::Macro).unwrap();
        assert!((macro_avg - 2.0 / 9.0).abs() < 1e-12);
        // tp 2, unions 3 + 4 + 3
        let micro = jaccard_score(&Y_TRUE, &Y_PRED, Average::Micro).unwrap();
        assert!((micro - 0.2).abs() < 1e-12);
        let weighted = jaccard_score(&Y_TRUE, &Y_PRED, Average::Weighted).unwrap();
        assert!((weighted - 2.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn binary_scores_positive_label() {
        let y_true = [0, 1, 1, 1, 0];
        let y_pred = [1, 1, 1, 0, 0];
        // label 1: tp 2, true 3, pred 3 -> 2/4
        let s = jaccard_score(&y_true, &y_pred, Average::Binary { pos_label: 1 }).unwrap();
        assert!((s - 0.5).abs() < 1e-12);
        assert!(jaccard_score(&Y_TRUE, &Y_PRED, Average::Binary { pos_label: 1 }).is_err());
        assert!(jaccard_score(&y_true, &y_pred, Average::Binary { pos_label: 7 }).is_err());
    }

    #[test]
    fn explicit_labels_include_absent_classes() {
        let s = jaccard_per_class(&[0, 1], &[0, 1], Some(&[0, 1, 5])).unwrap();
        assert_eq!(s.scores, vec![1.0, 1.0, 0.0]);
        assert_eq!(s.get(5), Some(0.0));
        assert_eq!(s.get(9), None);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(jaccard_per_class(&[0, 1], &[0], None).is_err());
        assert!(jaccard_per_class(&[], &[], None).is_err());
    }
}
