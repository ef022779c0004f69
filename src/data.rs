//! Contiguous sample storage.
//!
//! `Inputs` holds flattened images (X) and `Dataset` pairs them with one-hot labels (Y).
//! Both are row-major so the evaluation pass can hand the whole buffer to a single
//! matrix multiply.

use crate::{Error, Result};

/// A collection of input samples (X).
///
/// Stored as a contiguous buffer with row-major layout:
/// - `inputs.len() == len * input_dim`
#[derive(Debug, Clone, PartialEq)]
pub struct Inputs {
    inputs: Vec<f32>,
    len: usize,
    input_dim: usize,
}

impl Inputs {
    /// Build inputs from a flat buffer with shape `(len, input_dim)`.
    pub fn from_flat(inputs: Vec<f32>, input_dim: usize) -> Result<Self> {
        if input_dim == 0 {
            return Err(Error::InvalidData("input_dim must be > 0".to_owned()));
        }
        if !inputs.len().is_multiple_of(input_dim) {
            return Err(Error::InvalidData(format!(
                "inputs length {} is not divisible by input_dim {}",
                inputs.len(),
                input_dim
            )));
        }

        let len = inputs.len() / input_dim;
        Ok(Self {
            inputs,
            len,
            input_dim,
        })
    }

    /// Build inputs from per-sample rows (copied into contiguous storage).
    pub fn from_rows(rows: &[Vec<f32>]) -> Result<Self> {
        let input_dim = rows.first().map_or(0, Vec::len);
        if input_dim == 0 {
            return Err(Error::InvalidData(
                "inputs must have at least one non-empty row".to_owned(),
            ));
        }

        let mut flat = Vec::with_capacity(rows.len() * input_dim);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != input_dim {
                return Err(Error::InvalidData(format!(
                    "input row {i} has len {}, expected {input_dim}",
                    row.len()
                )));
            }
            flat.extend_from_slice(row);
        }

        Self::from_flat(flat, input_dim)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    /// The whole `(len, input_dim)` buffer.
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.inputs
    }

    /// Returns the `idx`-th input row.
    ///
    /// Panics if `idx >= len`.
    #[inline]
    pub fn input(&self, idx: usize) -> &[f32] {
        let start = idx * self.input_dim;
        &self.inputs[start..start + self.input_dim]
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &[f32]> + '_ {
        self.inputs.chunks_exact(self.input_dim)
    }
}

/// A supervised dataset: inputs (X) and one-hot targets (Y).
///
/// Every target row must be one-hot: exactly one `1.0`, the rest `0.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    inputs: Inputs,
    targets: Vec<f32>,
    target_dim: usize,
}

impl Dataset {
    /// Pair `inputs` with a flat `(len, target_dim)` one-hot target buffer.
    pub fn new(inputs: Inputs, targets: Vec<f32>, target_dim: usize) -> Result<Self> {
        if target_dim == 0 {
            return Err(Error::InvalidData("target_dim must be > 0".to_owned()));
        }
        if targets.len() != inputs.len() * target_dim {
            return Err(Error::InvalidData(format!(
                "targets length {} does not match len * target_dim ({} * {})",
                targets.len(),
                inputs.len(),
                target_dim
            )));
        }
        for (i, row) in targets.chunks_exact(target_dim).enumerate() {
            if !is_one_hot(row) {
                return Err(Error::InvalidData(format!(
                    "target row {i} is not one-hot: {row:?}"
                )));
            }
        }

        Ok(Self {
            inputs,
            targets,
            target_dim,
        })
    }

    /// Build a dataset from flat buffers.
    pub fn from_flat(
        inputs: Vec<f32>,
        targets: Vec<f32>,
        input_dim: usize,
        target_dim: usize,
    ) -> Result<Self> {
        Self::new(Inputs::from_flat(inputs, input_dim)?, targets, target_dim)
    }

    /// Build a dataset from inputs and class indices, one-hot encoding the labels.
    pub fn from_labels(inputs: Inputs, labels: &[u8], num_labels: usize) -> Result<Self> {
        if labels.len() != inputs.len() {
            return Err(Error::InvalidData(format!(
                "inputs/labels length mismatch: {} vs {}",
                inputs.len(),
                labels.len()
            )));
        }
        let targets = one_hot(labels, num_labels)?;
        Self::new(inputs, targets, num_labels)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    #[inline]
    pub fn input_dim(&self) -> usize {
        self.inputs.input_dim()
    }

    #[inline]
    pub fn target_dim(&self) -> usize {
        self.target_dim
    }

    #[inline]
    pub fn inputs(&self) -> &Inputs {
        &self.inputs
    }

    /// The whole `(len, target_dim)` target buffer.
    #[inline]
    pub fn targets(&self) -> &[f32] {
        &self.targets
    }

    #[inline]
    pub fn input(&self, idx: usize) -> &[f32] {
        self.inputs.input(idx)
    }

    #[inline]
    pub fn target(&self, idx: usize) -> &[f32] {
        let start = idx * self.target_dim;
        &self.targets[start..start + self.target_dim]
    }

    /// `(input, target)` pairs in storage order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&[f32], &[f32])> + '_ {
        self.inputs
            .iter()
            .zip(self.targets.chunks_exact(self.target_dim))
    }
}

/// One-hot encode class indices into a flat `(labels.len(), num_labels)` buffer.
pub fn one_hot(labels: &[u8], num_labels: usize) -> Result<Vec<f32>> {
    if num_labels == 0 {
        return Err(Error::InvalidData("num_labels must be > 0".to_owned()));
    }

    let mut out = vec![0.0_f32; labels.len() * num_labels];
    for (i, &label) in labels.iter().enumerate() {
        let class = usize::from(label);
        if class >= num_labels {
            return Err(Error::InvalidData(format!(
                "label {label} at index {i} is out of range for {num_labels} classes"
            )));
        }
        out[i * num_labels + class] = 1.0;
    }
    Ok(out)
}

fn is_one_hot(row: &[f32]) -> bool {
    let mut ones = 0;
    for &v in row {
        if v == 1.0 {
            ones += 1;
        } else if v != 0.0 {
            return false;
        }
    }
    ones == 1
}
