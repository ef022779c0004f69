//! Squared-error loss.
//!
//! Training minimizes the plain sum of squared residuals between the one-hot label
//! and the raw output scores. It is not averaged or halved; the training loop
//! normalizes per epoch instead.

/// `sum((target - pred)^2)`.
///
/// Works on a single sample or on two flat `(rows, cols)` buffers alike.
///
/// Shape contract: `pred.len() == target.len()`.
#[inline]
pub fn squared_error(pred: &[f32], target: &[f32]) -> f32 {
    assert_eq!(
        pred.len(),
        target.len(),
        "pred len {} does not match target len {}",
        pred.len(),
        target.len()
    );

    let mut sum = 0.0_f32;
    for (&y, &t) in pred.iter().zip(target) {
        let diff = t - y;
        sum += diff * diff;
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn squared_error_is_unnormalized() {
        assert_eq!(squared_error(&[0.0, 0.0], &[1.0, 0.0]), 1.0);
        assert_eq!(squared_error(&[0.5, -1.0, 2.0], &[1.0, 0.0, 0.0]), 5.25);
        assert_eq!(squared_error(&[], &[]), 0.0);
    }

    #[test]
    #[should_panic(expected = "does not match target len")]
    fn squared_error_panics_on_mismatch() {
        squared_error(&[0.0], &[1.0, 0.0]);
    }
}
