//! Classification accuracy helpers.
//!
//! Metrics do not take part in backprop; they only count hits.

/// Index of the largest value. Ties resolve to the lowest index.
///
/// Returns 0 for an empty slice. NaN never wins a comparison.
#[inline]
pub fn argmax(xs: &[f32]) -> usize {
    let mut best = 0;
    for (i, &x) in xs.iter().enumerate().skip(1) {
        if x > xs[best] {
            best = i;
        }
    }
    best
}

/// True when `pred` and the one-hot `target` agree on the class.
#[inline]
pub fn is_hit(pred: &[f32], target: &[f32]) -> bool {
    argmax(pred) == argmax(target)
}

/// Number of rows where the argmax of `preds` matches the argmax of `targets`.
///
/// Both buffers are row-major `(rows, cols)`.
pub fn count_hits(preds: &[f32], targets: &[f32], cols: usize) -> usize {
    assert_eq!(
        preds.len(),
        targets.len(),
        "preds len {} does not match targets len {}",
        preds.len(),
        targets.len()
    );
    assert!(cols > 0, "cols must be > 0");

    preds
        .chunks_exact(cols)
        .zip(targets.chunks_exact(cols))
        .filter(|(p, t)| is_hit(p, t))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_ties_go_to_first_index() {
        assert_eq!(argmax(&[0.0, 0.0]), 0);
        assert_eq!(argmax(&[1.0, 3.0, 3.0]), 1);
        assert_eq!(argmax(&[-1.0, -0.5]), 1);
        assert_eq!(argmax(&[]), 0);
    }

    #[test]
    fn tied_output_counts_as_class_zero() {
        assert!(is_hit(&[0.0, 0.0], &[1.0, 0.0]));
        assert!(!is_hit(&[0.0, 0.0], &[0.0, 1.0]));
    }

    #[test]
    fn count_hits_per_row() {
        let preds = [0.9, 0.1, 0.2, 0.8, 0.6, 0.4];
        let targets = [1.0, 0.0, 1.0, 0.0, 1.0, 0.0];
        assert_eq!(count_hits(&preds, &targets, 2), 2);
    }
}
