use rand::Rng;

use crate::data::dataset::Dataset;
use crate::error::Result;
use crate::math::tensor::Tensor;

/// Synthetic two-class image set: class 0 images hold one bright
/// horizontal bar, class 1 images one bright vertical bar, over uniform
/// background noise in `[0, 0.3)`. Images are `[1, size, size]`.
///
/// Classes alternate, so any prefix is balanced.
pub fn bars<R: Rng + ?Sized>(n: usize, size: usize, rng: &mut R) -> Result<Dataset> {
    let mut images = Vec::with_capacity(n);
    let mut labels = Vec::with_capacity(n);
    for i in 0..n {
        let label = i % 2;
        let line = rng.gen_range(0..size);
        let data = (0..size * size)
            .map(|idx| {
                let (row, col) = (idx / size, idx % size);
                let on_bar = if label == 0 { row == line } else { col == line };
                if on_bar { 1.0 } else { rng.gen_range(0.0..0.3) }
            })
            .collect();
        images.push(Tensor::from_vec(&[1, size, size], data)?);
        labels.push(label);
    }
    Dataset::new(images, labels, 2)
}
