use std::path::Path;

use crate::data::dataset::Dataset;
use crate::data::idx::{parse_idx_images, parse_idx_labels};
use crate::error::{Error, Result};

/// Digit classes in the standard dataset.
pub const NUM_CLASSES: usize = 10;

pub const TRAIN_IMAGES: &str = "train-images-idx3-ubyte";
pub const TRAIN_LABELS: &str = "train-labels-idx1-ubyte";
pub const TEST_IMAGES: &str = "t10k-images-idx3-ubyte";
pub const TEST_LABELS: &str = "t10k-labels-idx1-ubyte";

/// Loads one split from an image/label file pair. Labels must be below
/// `num_classes`.
pub fn load_split(images_path: &Path, labels_path: &Path, num_classes: usize) -> Result<Dataset> {
    let image_bytes = std::fs::read(images_path).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("cannot read '{}': {}", images_path.display(), e),
        ))
    })?;
    let label_bytes = std::fs::read(labels_path).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("cannot read '{}': {}", labels_path.display(), e),
        ))
    })?;
    let images = parse_idx_images(&image_bytes)?;
    let labels = parse_idx_labels(&label_bytes)?;
    Dataset::from_idx(&images, &labels, num_classes)
}

/// Loads the `(train, test)` splits from the four standard MNIST files in
/// `dir` (uncompressed), one-hot encoded over `num_classes`.
pub fn load_mnist(dir: &Path, num_classes: usize) -> Result<(Dataset, Dataset)> {
    let train = load_split(&dir.join(TRAIN_IMAGES), &dir.join(TRAIN_LABELS), num_classes)?;
    let test = load_split(&dir.join(TEST_IMAGES), &dir.join(TEST_LABELS), num_classes)?;
    tracing::debug!(train = train.len(), test = test.len(), dir = %dir.display(), "loaded MNIST");
    Ok((train, test))
}
