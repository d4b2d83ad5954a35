use crate::data::idx::IdxImages;
use crate::error::{Error, Result};
use crate::math::tensor::Tensor;
use crate::metrics::to_categorical;

/// Labelled images, one tensor per sample.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub images: Vec<Tensor>,
    pub labels: Vec<usize>,
    pub num_classes: usize,
}

impl Dataset {
    /// Fails if lengths differ, shapes are mixed, or a label is out of range.
    pub fn new(images: Vec<Tensor>, labels: Vec<usize>, num_classes: usize) -> Result<Dataset> {
        if images.len() != labels.len() {
            return Err(Error::shape(format!(
                "{} images but {} labels",
                images.len(),
                labels.len()
            )));
        }
        if let Some(first) = images.first() {
            if let Some(i) = images.iter().position(|t| t.shape != first.shape) {
                return Err(Error::shape(format!(
                    "image {} has shape {:?}, expected {:?}",
                    i, images[i].shape, first.shape
                )));
            }
        }
        if let Some(i) = labels.iter().position(|&l| l >= num_classes) {
            return Err(Error::shape(format!(
                "label at index {} is {}, out of range for {} classes",
                i, labels[i], num_classes
            )));
        }
        Ok(Dataset { images, labels, num_classes })
    }

    /// Scales pixels to `[0, 1]` and adds a leading channel axis, so every
    /// image becomes a `[1, rows, cols]` tensor.
    pub fn from_idx(images: &IdxImages, labels: &[u8], num_classes: usize) -> Result<Dataset> {
        if images.count != labels.len() {
            return Err(Error::Idx(format!(
                "image file declares {} items but label file declares {}",
                images.count,
                labels.len()
            )));
        }
        let shape = [1, images.rows, images.cols];
        let tensors = (0..images.count)
            .map(|i| {
                let data = images.image(i).iter().map(|&px| px as f64 / 255.0).collect();
                Tensor::from_vec(&shape, data)
            })
            .collect::<Result<Vec<_>>>()?;
        let labels = labels.iter().map(|&l| l as usize).collect();
        Dataset::new(tensors, labels, num_classes)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Keeps the first `n` samples.
    pub fn truncate(&mut self, n: usize) {
        self.images.truncate(n);
        self.labels.truncate(n);
    }

    /// Per-sample shape, or `None` for an empty dataset.
    pub fn input_shape(&self) -> Option<Vec<usize>> {
        self.images.first().map(|t| t.shape.clone())
    }

    /// Labels as one-hot rows.
    pub fn one_hot(&self) -> Result<Vec<Vec<f64>>> {
        to_categorical(&self.labels, self.num_classes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::idx::parse_idx_images;
    use crate::data::idx::tests::image_file;

    #[test]
    fn from_idx_normalizes_and_adds_channel_axis() {
        let images = parse_idx_images(&image_file(2, 1, 2, &[0, 255, 51, 102])).unwrap();
        let ds = Dataset::from_idx(&images, &[3, 1], 10).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.input_shape(), Some(vec![1, 1, 2]));
        assert_eq!(ds.images[0].data, vec![0.0, 1.0]);
        assert!((ds.images[1].data[0] - 0.2).abs() < 1e-12);
        assert_eq!(ds.one_hot().unwrap()[0][3], 1.0);
    }

    #[test]
    fn rejects_inconsistent_samples() {
        let a = Tensor::zeros(&[1, 2, 2]);
        let b = Tensor::zeros(&[1, 3, 2]);
        assert!(Dataset::new(vec![a.clone(), b], vec![0, 1], 2).is_err());
        assert!(Dataset::new(vec![a.clone()], vec![2], 2).is_err());
        assert!(Dataset::new(vec![a], vec![], 2).is_err());
    }
}
