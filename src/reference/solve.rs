//!
//! Dense solves for silent transitions within one cell
//!
use ndarray::prelude::*;

///
/// Solve `(I - t) x = b` by Gauss-Jordan elimination with partial pivoting.
/// `None` if the system is singular.
///
pub fn solve_silent(t: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let k = b.len();
    let mut m: Array2<f64> = Array2::eye(k) - t;
    let mut x = b.clone();
    for c in 0..k {
        let pivot = (c..k).max_by(|&i, &j| {
            m[[i, c]]
                .abs()
                .partial_cmp(&m[[j, c]].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        if m[[pivot, c]].abs() < 1e-300 {
            return None;
        }
        if pivot != c {
            for j in 0..k {
                m.swap([c, j], [pivot, j]);
            }
            x.swap(c, pivot);
        }
        let scale = m[[c, c]];
        m.row_mut(c).mapv_inplace(|v| v / scale);
        x[c] /= scale;
        for r in 0..k {
            if r == c {
                continue;
            }
            let f = m[[r, c]];
            if f != 0.0 {
                let pivot_row = m.row(c).to_owned();
                m.row_mut(r).scaled_add(-f, &pivot_row);
                x[r] -= f * x[c];
            }
        }
    }
    Some(x)
}

///
/// Max-product counterpart: `x_i = max(b_i, max_j t_ij x_j)`, relaxed once
/// per state.
///
pub fn relax_silent(t: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let k = b.len();
    let mut x = b.clone();
    for _ in 0..k {
        for i in 0..k {
            for j in 0..k {
                x[i] = x[i].max(t[[i, j]] * x[j]);
            }
        }
    }
    x
}
