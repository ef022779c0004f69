use rand::Rng;

use crate::Model;
use crate::activation::{DROPOUT_SCALE, relu, relu_grad_from_output, sample_mask};
use crate::matmul::{add_scaled_outer, matmul};

/// Activations produced by one forward pass.
///
/// Immutable once built; `Model::backward` and `Model::apply_update` only read it.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardData<'a> {
    dropout_mask: Vec<f32>,
    layer_0: &'a [f32],
    layer_1: Vec<f32>,
    layer_2: Vec<f32>,
}

impl<'a> ForwardData<'a> {
    /// 0/1 per hidden unit. All ones when dropout was not applied.
    #[inline]
    pub fn dropout_mask(&self) -> &[f32] {
        &self.dropout_mask
    }

    /// The input the pass was run on.
    #[inline]
    pub fn layer_0(&self) -> &'a [f32] {
        self.layer_0
    }

    /// Hidden activations after ReLU and dropout.
    #[inline]
    pub fn layer_1(&self) -> &[f32] {
        &self.layer_1
    }

    /// Raw output scores (no softmax).
    #[inline]
    pub fn layer_2(&self) -> &[f32] {
        &self.layer_2
    }

    #[inline]
    pub fn output(&self) -> &[f32] {
        &self.layer_2
    }

    pub fn into_output(self) -> Vec<f32> {
        self.layer_2
    }
}

/// Per-layer error signals for one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct BackpropData {
    delta_1: Vec<f32>,
    delta_2: Vec<f32>,
}

impl BackpropData {
    /// Hidden-layer error signal.
    #[inline]
    pub fn delta_1(&self) -> &[f32] {
        &self.delta_1
    }

    /// Output-layer error signal, `label - output`.
    #[inline]
    pub fn delta_2(&self) -> &[f32] {
        &self.delta_2
    }
}

impl Model {
    /// Forward pass for a single sample with dropout active.
    ///
    /// Computes:
    /// - `hidden = relu(input * W1)`
    /// - `layer_1 = hidden * mask * 2` with a fresh 0/1 mask drawn from `rng`
    /// - `layer_2 = layer_1 * W2`
    ///
    /// Panics if `input.len() != self.image_pixels()`.
    pub fn forward<'a, R: Rng + ?Sized>(&self, input: &'a [f32], rng: &mut R) -> ForwardData<'a> {
        let mut hidden = self.hidden_activations(input);
        let dropout_mask = sample_mask(self.hidden_size(), rng);
        for (h, &m) in hidden.iter_mut().zip(&dropout_mask) {
            *h = *h * m * DROPOUT_SCALE;
        }
        self.finish_forward(input, dropout_mask, hidden)
    }

    /// Forward pass for a single sample without dropout.
    ///
    /// The mask is all ones and no scaling is applied. Consumes no randomness.
    ///
    /// Panics if `input.len() != self.image_pixels()`.
    pub fn forward_without_dropout<'a>(&self, input: &'a [f32]) -> ForwardData<'a> {
        let hidden = self.hidden_activations(input);
        self.finish_forward(input, vec![1.0; self.hidden_size()], hidden)
    }

    fn hidden_activations(&self, input: &[f32]) -> Vec<f32> {
        assert_eq!(
            input.len(),
            self.image_pixels(),
            "input len {} does not match model image_pixels {}",
            input.len(),
            self.image_pixels()
        );

        let mut hidden = vec![0.0_f32; self.hidden_size()];
        matmul(
            1,
            self.image_pixels(),
            self.hidden_size(),
            input,
            self.w1(),
            &mut hidden,
        );
        for h in &mut hidden {
            *h = relu(*h);
        }
        hidden
    }

    fn finish_forward<'a>(
        &self,
        input: &'a [f32],
        dropout_mask: Vec<f32>,
        layer_1: Vec<f32>,
    ) -> ForwardData<'a> {
        let mut layer_2 = vec![0.0_f32; self.num_labels()];
        matmul(
            1,
            self.hidden_size(),
            self.num_labels(),
            &layer_1,
            self.w2(),
            &mut layer_2,
        );
        ForwardData {
            dropout_mask,
            layer_0: input,
            layer_1,
            layer_2,
        }
    }

    /// Backward pass for a single sample.
    ///
    /// - `delta_2 = label - layer_2`
    /// - `delta_1 = W2 * delta_2`, then zeroed where `layer_1 <= 0` and where the mask dropped
    ///   the unit
    ///
    /// The ReLU derivative is read from the cached post-dropout `layer_1`.
    ///
    /// Panics if `label.len() != self.num_labels()` or `fwd` came from a model with
    /// another hidden size.
    pub fn backward(&self, fwd: &ForwardData<'_>, label: &[f32]) -> BackpropData {
        assert_eq!(
            label.len(),
            self.num_labels(),
            "label len {} does not match model num_labels {}",
            label.len(),
            self.num_labels()
        );
        assert_eq!(
            fwd.layer_1.len(),
            self.hidden_size(),
            "forward data hidden len {} does not match model hidden_size {}",
            fwd.layer_1.len(),
            self.hidden_size()
        );

        let delta_2: Vec<f32> = label
            .iter()
            .zip(&fwd.layer_2)
            .map(|(&t, &y)| t - y)
            .collect();

        let mut delta_1 = vec![0.0_f32; self.hidden_size()];
        matmul(
            self.hidden_size(),
            self.num_labels(),
            1,
            self.w2(),
            &delta_2,
            &mut delta_1,
        );
        for ((d, &h), &m) in delta_1
            .iter_mut()
            .zip(&fwd.layer_1)
            .zip(&fwd.dropout_mask)
        {
            *d *= relu_grad_from_output(h);
            *d *= m;
        }

        BackpropData { delta_1, delta_2 }
    }

    /// Online SGD update for one sample:
    ///
    /// - `W1 += learning_rate * outer(layer_0, delta_1)`
    /// - `W2 += outer(layer_1, delta_2) * learning_rate`
    ///
    /// Both deltas must have been computed against the weights before this call.
    pub fn apply_update(&mut self, fwd: &ForwardData<'_>, bp: &BackpropData, learning_rate: f32) {
        assert_eq!(
            fwd.layer_0.len(),
            self.image_pixels(),
            "forward data input len {} does not match model image_pixels {}",
            fwd.layer_0.len(),
            self.image_pixels()
        );
        assert_eq!(
            bp.delta_1.len(),
            self.hidden_size(),
            "delta_1 len {} does not match model hidden_size {}",
            bp.delta_1.len(),
            self.hidden_size()
        );
        assert_eq!(
            bp.delta_2.len(),
            self.num_labels(),
            "delta_2 len {} does not match model num_labels {}",
            bp.delta_2.len(),
            self.num_labels()
        );

        let (w1, w2) = self.weights_mut();
        add_scaled_outer(w1, fwd.layer_0, &bp.delta_1, learning_rate);
        add_scaled_outer(w2, &fwd.layer_1, &bp.delta_2, learning_rate);
    }
}
