//! Weight store for the two-layer network.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{Error, ModelConfig, Result};

/// One-hidden-layer network parameters.
///
/// - `w1`: row-major `(image_pixels, hidden_size)`
/// - `w2`: row-major `(hidden_size, num_labels)`
///
/// There are no biases. Shapes are fixed at construction: mutable access only hands
/// out slices, so callers can change values but never lengths.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    hidden_size: usize,
    image_pixels: usize,
    num_labels: usize,
    w1: Vec<f32>,
    w2: Vec<f32>,
}

impl Model {
    pub fn new_with_seed(cfg: &ModelConfig, seed: u64) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::new_with_rng(cfg, &mut rng)
    }

    /// Initialize both matrices with `0.2 * U(0, 1) - 0.1`.
    ///
    /// `w1` is drawn first, then `w2`, in row-major order.
    pub fn new_with_rng<R: Rng + ?Sized>(cfg: &ModelConfig, rng: &mut R) -> Result<Self> {
        cfg.validate()?;

        let mut init = |len: usize| -> Vec<f32> {
            (0..len)
                .map(|_| 0.2 * rng.random::<f32>() - 0.1)
                .collect()
        };
        let w1 = init(cfg.image_pixels * cfg.hidden_size);
        let w2 = init(cfg.hidden_size * cfg.num_labels);

        Ok(Self {
            hidden_size: cfg.hidden_size,
            image_pixels: cfg.image_pixels,
            num_labels: cfg.num_labels,
            w1,
            w2,
        })
    }

    /// Build a model from explicit weights.
    pub fn from_weights(
        hidden_size: usize,
        image_pixels: usize,
        num_labels: usize,
        w1: Vec<f32>,
        w2: Vec<f32>,
    ) -> Result<Self> {
        ModelConfig {
            hidden_size,
            image_pixels,
            num_labels,
        }
        .validate()?;

        if w1.len() != image_pixels * hidden_size {
            return Err(Error::InvalidShape(format!(
                "w1 length {} does not match image_pixels * hidden_size ({image_pixels} * {hidden_size})",
                w1.len()
            )));
        }
        if w2.len() != hidden_size * num_labels {
            return Err(Error::InvalidShape(format!(
                "w2 length {} does not match hidden_size * num_labels ({hidden_size} * {num_labels})",
                w2.len()
            )));
        }

        Ok(Self {
            hidden_size,
            image_pixels,
            num_labels,
            w1,
            w2,
        })
    }

    /// All-zero weights; mostly useful for tests and fixed-point checks.
    pub fn zeros(cfg: &ModelConfig) -> Result<Self> {
        cfg.validate()?;
        Self::from_weights(
            cfg.hidden_size,
            cfg.image_pixels,
            cfg.num_labels,
            vec![0.0; cfg.image_pixels * cfg.hidden_size],
            vec![0.0; cfg.hidden_size * cfg.num_labels],
        )
    }

    #[inline]
    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    #[inline]
    pub fn image_pixels(&self) -> usize {
        self.image_pixels
    }

    #[inline]
    pub fn num_labels(&self) -> usize {
        self.num_labels
    }

    pub fn config(&self) -> ModelConfig {
        ModelConfig {
            hidden_size: self.hidden_size,
            image_pixels: self.image_pixels,
            num_labels: self.num_labels,
        }
    }

    #[inline]
    pub fn w1(&self) -> &[f32] {
        &self.w1
    }

    #[inline]
    pub fn w1_mut(&mut self) -> &mut [f32] {
        &mut self.w1
    }

    #[inline]
    pub fn w2(&self) -> &[f32] {
        &self.w2
    }

    #[inline]
    pub fn w2_mut(&mut self) -> &mut [f32] {
        &mut self.w2
    }

    /// Split borrow used by the weight update.
    #[inline]
    pub(crate) fn weights_mut(&mut self) -> (&mut [f32], &mut [f32]) {
        (&mut self.w1, &mut self.w2)
    }
}
