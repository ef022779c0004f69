//! Dense row-major matrix helpers used by the forward, backward and evaluation passes.
//!
//! - default: a simple, safe triple-loop implementation
//! - optional: a faster backend via the `matrixmultiply` feature

/// `c = a * b` where `a` is `(m, k)`, `b` is `(k, n)` and `c` is `(m, n)`, all row-major.
///
/// `c` is overwritten.
#[inline]
pub(crate) fn matmul(m: usize, k: usize, n: usize, a: &[f32], b: &[f32], c: &mut [f32]) {
    debug_assert_eq!(a.len(), m * k);
    debug_assert_eq!(b.len(), k * n);
    debug_assert_eq!(c.len(), m * n);

    if m == 0 || n == 0 {
        return;
    }
    if k == 0 {
        c.fill(0.0);
        return;
    }

    #[cfg(feature = "matrixmultiply")]
    // SAFETY: the slice lengths above cover every index reachable through the
    // row-major strides passed here.
    unsafe {
        matrixmultiply::sgemm(
            m,
            k,
            n,
            1.0,
            a.as_ptr(),
            k as isize,
            1,
            b.as_ptr(),
            n as isize,
            1,
            0.0,
            c.as_mut_ptr(),
            n as isize,
            1,
        );
    }

    #[cfg(not(feature = "matrixmultiply"))]
    for i in 0..m {
        let a_row = &a[i * k..(i + 1) * k];
        let c_row = &mut c[i * n..(i + 1) * n];
        for (j, out) in c_row.iter_mut().enumerate() {
            let mut acc = 0.0_f32;
            for (p, &av) in a_row.iter().enumerate() {
                acc = av.mul_add(b[p * n + j], acc);
            }
            *out = acc;
        }
    }
}

/// `mat += alpha * outer(x, y)` where `mat` is `(x.len(), y.len())` row-major.
///
/// Each entry is updated as `mat[i][j] + alpha * (x[i] * y[j])`.
#[inline]
pub(crate) fn add_scaled_outer(mat: &mut [f32], x: &[f32], y: &[f32], alpha: f32) {
    debug_assert_eq!(mat.len(), x.len() * y.len());

    let cols = y.len();
    for (i, &xi) in x.iter().enumerate() {
        // Zero rows are a no-op for finite `y`; most MNIST pixels are zero.
        if xi == 0.0 {
            continue;
        }
        let row = &mut mat[i * cols..(i + 1) * cols];
        for (w, &yj) in row.iter_mut().zip(y) {
            *w += alpha * (xi * yj);
        }
    }
}
