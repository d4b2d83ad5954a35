//! Classification metrics computed outside the training graph.

pub mod classification;
pub mod jaccard;
pub mod mean;

pub use classification::{accuracy_score, argmax_rows, to_categorical};
pub use jaccard::{jaccard_per_class, jaccard_score, unique_labels, Average, PerClassScores};
pub use mean::Mean;
