use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;

use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};
use crate::layers::{Layer, Param};
use crate::math::tensor::Tensor;

/// A linear stack of layers processing one sample at a time.
///
/// Shapes are validated once at construction: every layer's input shape must
/// be the previous layer's output shape, starting from `input_shape`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sequential {
    pub name: String,
    /// Per-sample input shape, channels first (e.g. `[1, 28, 28]`).
    pub input_shape: Vec<usize>,
    pub layers: Vec<Layer>,
}

impl Sequential {
    pub fn new(name: impl Into<String>, input_shape: Vec<usize>, layers: Vec<Layer>) -> Result<Sequential> {
        if layers.is_empty() {
            return Err(Error::config("a model needs at least one layer"));
        }
        let model = Sequential { name: name.into(), input_shape, layers };
        model.layer_shapes()?;
        Ok(model)
    }

    /// Output shape of each layer, in order.
    pub fn layer_shapes(&self) -> Result<Vec<Vec<usize>>> {
        let mut shapes = Vec::with_capacity(self.layers.len());
        let mut current = self.input_shape.clone();
        for layer in &self.layers {
            current = layer.output_shape(&current)?;
            shapes.push(current.clone());
        }
        Ok(shapes)
    }

    pub fn output_shape(&self) -> Result<Vec<usize>> {
        self.layer_shapes()?
            .pop()
            .ok_or_else(|| Error::config("a model needs at least one layer"))
    }

    fn check_input(&self, input: &Tensor) -> Result<()> {
        if input.shape != self.input_shape {
            return Err(Error::shape(format!(
                "model '{}' expects input {:?}, got {:?}",
                self.name, self.input_shape, input.shape
            )));
        }
        Ok(())
    }

    /// Training-mode forward pass; every layer caches its activations for
    /// the following `backward`.
    pub fn forward<R: Rng + ?Sized>(&mut self, input: &Tensor, rng: &mut R) -> Result<Tensor> {
        self.check_input(input)?;
        let mut current = input.clone();
        for layer in &mut self.layers {
            current = layer.forward(&current, rng)?;
        }
        Ok(current)
    }

    /// Backpropagates `grad` (dL/d output) and accumulates parameter gradients.
    pub fn backward(&mut self, grad: Tensor) -> Result<()> {
        let mut delta = grad;
        for layer in self.layers.iter_mut().rev() {
            delta = layer.backward(&delta)?;
        }
        Ok(())
    }

    /// Inference-mode forward pass (dropout disabled, nothing cached).
    pub fn infer(&self, input: &Tensor) -> Result<Tensor> {
        self.check_input(input)?;
        let mut current = input.clone();
        for layer in &self.layers {
            current = layer.infer(&current)?;
        }
        Ok(current)
    }

    /// Runs inference over every input and returns the output vectors
    /// (class probabilities for a softmax head).
    pub fn predict(&self, inputs: &[Tensor]) -> Result<Vec<Vec<f64>>> {
        inputs.iter().map(|x| self.infer(x).map(|t| t.data)).collect()
    }

    pub fn parameters(&mut self) -> Vec<Param<'_>> {
        self.layers.iter_mut().flat_map(|l| l.parameters()).collect()
    }

    pub fn zero_grad(&mut self) {
        for p in self.parameters() {
            p.grad.fill(0.0);
        }
    }

    pub fn param_count(&self) -> usize {
        self.layers.iter().map(|l| l.param_count()).sum()
    }

    /// Human-readable table of layers, output shapes and parameter counts.
    pub fn summary(&self) -> Result<String> {
        let shapes = self.layer_shapes()?;
        let rule = "─".repeat(64);
        let mut out = String::new();
        let _ = writeln!(out, "Model: \"{}\"", self.name);
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "{:<30}{:<22}{:>12}", "Layer (type)", "Output Shape", "Param #");
        let _ = writeln!(out, "{}", "═".repeat(64));

        let mut seen: HashMap<&str, usize> = HashMap::new();
        for (layer, shape) in self.layers.iter().zip(shapes.iter()) {
            let count = seen.entry(layer.base_name()).or_insert(0);
            let name = if *count == 0 {
                layer.base_name().to_string()
            } else {
                format!("{}_{}", layer.base_name(), count)
            };
            *count += 1;

            let dims: Vec<String> = shape.iter().map(|d| d.to_string()).collect();
            let _ = writeln!(
                out,
                "{:<30}{:<22}{:>12}",
                format!("{} ({})", name, layer.kind()),
                format!("(None, {})", dims.join(", ")),
                group_thousands(layer.param_count()),
            );
        }

        let total = self.param_count();
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "Total params: {}", group_thousands(total));
        let _ = writeln!(out, "Trainable params: {}", group_thousands(total));
        let _ = writeln!(out, "Non-trainable params: 0");
        Ok(out)
    }

    /// Serializes the model (architecture and weights) to pretty JSON.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Loads a model written by `save_json`, re-validating its shapes.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Sequential> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let model: Sequential = serde_json::from_reader(reader)?;
        Sequential::new(model.name, model.input_shape, model.layers)
    }
}

fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thousands_are_grouped() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(320), "320");
        assert_eq!(group_thousands(34826), "34,826");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }
}
