//! Hidden-layer activation and dropout.
//!
//! The hidden layer caches its *post-activation, post-dropout* values. The ReLU
//! derivative used during backprop is read from those cached values, so a unit that
//! was dropped or clipped contributes a zero gradient either way.

use rand::Rng;

/// Scale applied to surviving units so the expected activation is unchanged
/// when half the units are dropped (inverted dropout, p = 0.5).
pub const DROPOUT_SCALE: f32 = 2.0;

#[inline]
pub(crate) fn relu(x: f32) -> f32 {
    x.max(0.0)
}

/// ReLU derivative expressed in terms of the cached activation `y`.
#[inline]
pub(crate) fn relu_grad_from_output(y: f32) -> f32 {
    if y > 0.0 { 1.0 } else { 0.0 }
}

/// Draws a fresh 0/1 mask, one uniform integer draw per unit.
pub(crate) fn sample_mask<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Vec<f32> {
    (0..len)
        .map(|_| f32::from(rng.random_range(0..2_u8)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn relu_clips_negatives() {
        assert_eq!(relu(-2.0), 0.0);
        assert_eq!(relu(3.0), 3.0);
        assert_eq!(relu_grad_from_output(0.0), 0.0);
        assert_eq!(relu_grad_from_output(0.5), 1.0);
    }

    #[test]
    fn mask_is_binary_and_seeded() {
        let a = sample_mask(256, &mut StdRng::seed_from_u64(9));
        let b = sample_mask(256, &mut StdRng::seed_from_u64(9));
        assert_eq!(a, b);
        assert!(a.iter().all(|&m| m == 0.0 || m == 1.0));

        // Both values show up in a mask of this size.
        assert!(a.contains(&0.0));
        assert!(a.contains(&1.0));
    }
}
