//! Singular value decomposition by cyclic Jacobi rotations on `AᵀA`.

use std::fmt;

use log::debug;

use super::eig::complete_column;
use super::{dot, matrix_dims, off_diagonal, Matrix, Progress, SolverOptions, SolverReport};
use crate::scalar::{Element, FloatScalar};
use crate::{ArrayError, NdArray, Result};

/// `A = U Σ Vᵀ` for an `m x n` matrix.
#[derive(Clone)]
pub struct Svd<T> {
    /// `m x m` orthogonal.
    pub u: NdArray<T>,
    /// `m x n` with the singular values on its main diagonal.
    pub s: NdArray<T>,
    /// `n x n` orthogonal.
    pub vt: NdArray<T>,
    /// The `min(m, n)` singular values, descending.
    pub singular_values: NdArray<T>,
    pub report: SolverReport,
}

impl<T: Element> fmt::Debug for Svd<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Svd")
            .field("u", &self.u)
            .field("s", &self.s)
            .field("vt", &self.vt)
            .field("singular_values", &self.singular_values)
            .field("report", &self.report)
            .finish()
    }
}

struct Factors<T> {
    u: Matrix<T>,
    sigma: Vec<T>,
    v: Matrix<T>,
    report: SolverReport,
}

/// Annihilate `a[p][q]` with the rotation `A <- G A Gᵀ` and accumulate `V <- V Gᵀ`.
fn rotate<T: FloatScalar>(a: &mut Matrix<T>, v: &mut Matrix<T>, p: usize, q: usize) {
    let apq = a[(p, q)];
    if apq == T::zero() {
        return;
    }
    let two = T::one() + T::one();
    let phi = (two * apq).atan2(a[(q, q)] - a[(p, p)]) / two;
    let (s, c) = phi.sin_cos();
    let n = a.rows;
    for k in 0..n {
        let (xp, xq) = (a[(p, k)], a[(q, k)]);
        a[(p, k)] = c * xp - s * xq;
        a[(q, k)] = s * xp + c * xq;
    }
    for k in 0..n {
        let (xp, xq) = (a[(k, p)], a[(k, q)]);
        a[(k, p)] = c * xp - s * xq;
        a[(k, q)] = s * xp + c * xq;
    }
    for k in 0..v.rows {
        let (xp, xq) = (v[(k, p)], v[(k, q)]);
        v[(k, p)] = c * xp - s * xq;
        v[(k, q)] = s * xp + c * xq;
    }
}

/// Singular values at or below this are treated as zero when building `U`
/// and the pseudo-inverse. Eigenvalues of `AᵀA` carry an absolute error near
/// `ε λ_max`, so their square roots are only trustworthy down to `σ_max √ε`.
fn rank_cutoff<T: FloatScalar>(sigma_max: T, m: usize, n: usize) -> T {
    let ten = T::from(10).unwrap_or_else(T::one);
    let scale = T::from(m.max(n)).unwrap_or_else(T::one);
    sigma_max * ten * (T::epsilon() * scale).sqrt()
}

fn factorize<T: FloatScalar>(a: &NdArray<T>, options: SolverOptions) -> Result<Factors<T>> {
    let (m, n) = matrix_dims(a)?;
    let am = Matrix::from_array(a)?;
    let mut ata = am.transpose().matmul(&am);
    let mut v = Matrix::<T>::identity(n);
    let mut progress = Progress::new("svd", options);

    while progress.step(off_diagonal(&ata)) {
        for p in 0..n {
            for q in p + 1..n {
                rotate(&mut ata, &mut v, p, q);
            }
        }
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| {
        ata[(j, j)]
            .partial_cmp(&ata[(i, i)])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let mut sorted = Matrix::zeros(n, n);
    for (dst, &src) in order.iter().enumerate() {
        sorted.set_column(dst, &v.column(src));
    }

    let k = m.min(n);
    let sigma: Vec<T> = order[..k]
        .iter()
        .map(|&i| ata[(i, i)].max(T::zero()).sqrt())
        .collect();
    let cutoff = rank_cutoff(sigma[0], m, n);

    let mut u = Matrix::zeros(m, m);
    for j in 0..m {
        if j < k && sigma[j] > cutoff {
            let vj = sorted.column(j);
            let col: Vec<T> = (0..m)
                .map(|i| (0..n).fold(T::zero(), |acc, c| acc + am[(i, c)] * vj[c]) / sigma[j])
                .collect();
            u.set_column(j, &col);
        } else {
            complete_column(&mut u, j);
        }
    }
    if sigma.iter().any(|&s| s <= cutoff) {
        debug!("svd: rank deficient {m}x{n} input, cutoff {:?}", cutoff);
    }

    Ok(Factors {
        u,
        sigma,
        v: sorted,
        report: progress.report(),
    })
}

/// Singular value decomposition.
///
/// Cyclic Jacobi sweeps diagonalise `AᵀA`; its eigenpairs are sorted
/// descending and `σ = sqrt(max(λ, 0))`. Columns of `U` are `A v / σ` for the
/// numerically nonzero singular values and a Gram-Schmidt completion otherwise.
///
/// Accuracy of the small singular values is limited by forming `AᵀA`; expect
/// roughly half the working precision relative to the largest one.
pub fn svd<T: FloatScalar>(a: &NdArray<T>, options: SolverOptions) -> Result<Svd<T>> {
    let (m, n) = matrix_dims(a)?;
    let f = factorize(a, options)?;
    let mut s = Matrix::zeros(m, n);
    for (i, &sv) in f.sigma.iter().enumerate() {
        s[(i, i)] = sv;
    }
    let k = f.sigma.len();
    Ok(Svd {
        u: f.u.into_array(),
        s: s.into_array(),
        vt: f.v.transpose().into_array(),
        singular_values: NdArray::from_contiguous(&[k], f.sigma),
        report: f.report,
    })
}

/// Moore-Penrose pseudo-inverse `V Σ⁺ Uᵀ`, shape `n x m`.
///
/// Singular values at or below `σ_max · 10 · sqrt(ε · max(m, n))` are dropped.
pub fn pinv<T: FloatScalar>(a: &NdArray<T>) -> Result<NdArray<T>> {
    let (m, n) = matrix_dims(a)?;
    let f = factorize(a, SolverOptions::default())?;
    let cutoff = rank_cutoff(f.sigma[0], m, n);
    let mut out = Matrix::zeros(n, m);
    for (c, &sv) in f.sigma.iter().enumerate() {
        if sv <= cutoff {
            continue;
        }
        let inv = T::one() / sv;
        for i in 0..n {
            let vi = f.v[(i, c)] * inv;
            for j in 0..m {
                out[(i, j)] = out[(i, j)] + vi * f.u[(j, c)];
            }
        }
    }
    Ok(out.into_array())
}

/// Least-squares solution of `A x ≈ b` via [`pinv`].
///
/// `b` is a vector of length `m` or an `m x k` matrix; `x` has shape `[n]` or
/// `[n, k]` accordingly.
///
/// # Errors
/// [`ArrayError::ShapeMismatch`] when `b` does not have `m` rows.
pub fn lstsq<T: FloatScalar>(a: &NdArray<T>, b: &NdArray<T>) -> Result<NdArray<T>> {
    let (m, _) = matrix_dims(a)?;
    match b.shape().first() {
        Some(&rows) if rows == m && b.ndim() <= 2 => dot(&pinv(a)?, b),
        _ => Err(ArrayError::ShapeMismatch(
            a.shape().to_vec(),
            b.shape().to_vec(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::{inverse, matmul, SolverState};
    use approx::assert_abs_diff_eq;

    fn mat(rows: usize, cols: usize, data: Vec<f64>) -> NdArray<f64> {
        NdArray::from_vec(&[rows, cols], data).unwrap()
    }

    fn assert_close(a: &NdArray<f64>, b: &NdArray<f64>, eps: f64) {
        assert_eq!(a.shape(), b.shape());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_abs_diff_eq!(x, y, epsilon = eps);
        }
    }

    fn assert_orthogonal(q: &NdArray<f64>) {
        let n = q.shape()[0];
        let eye = Matrix::<f64>::identity(n).into_array();
        assert_close(&matmul(&q.t(), q).unwrap(), &eye, 1e-8);
    }

    fn reconstruct(d: &Svd<f64>) -> NdArray<f64> {
        matmul(&matmul(&d.u, &d.s).unwrap(), &d.vt).unwrap()
    }

    #[test]
    fn test_svd_wide_reference() {
        let a = mat(2, 3, vec![3.0, 2.0, 2.0, 2.0, 3.0, -2.0]);
        let d = svd(&a, SolverOptions::default()).unwrap();
        assert!(d.report.converged());
        assert_eq!(d.u.shape(), &[2, 2]);
        assert_eq!(d.s.shape(), &[2, 3]);
        assert_eq!(d.vt.shape(), &[3, 3]);
        let sv = d.singular_values.to_vec();
        assert_abs_diff_eq!(sv[0], 5.0, epsilon = 1e-9);
        assert_abs_diff_eq!(sv[1], 3.0, epsilon = 1e-9);
        assert_close(&reconstruct(&d), &a, 1e-6);
        assert_orthogonal(&d.u);
        assert_orthogonal(&d.vt);
    }

    #[test]
    fn test_svd_tall_completes_u() {
        let a = mat(3, 2, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let d = svd(&a, SolverOptions::default()).unwrap();
        assert_eq!(d.u.shape(), &[3, 3]);
        assert_orthogonal(&d.u);
        assert_close(&reconstruct(&d), &a, 1e-6);
        let sv = d.singular_values.to_vec();
        assert!(sv[0] >= sv[1] && sv[1] > 0.0);
    }

    #[test]
    fn test_svd_rank_deficient() {
        let a = mat(2, 2, vec![1.0, 2.0, 2.0, 4.0]);
        let d = svd(&a, SolverOptions::default()).unwrap();
        let sv = d.singular_values.to_vec();
        assert_abs_diff_eq!(sv[0], 5.0, epsilon = 1e-9);
        assert!(sv[1] < 1e-6);
        assert_orthogonal(&d.u);
        assert_close(&reconstruct(&d), &a, 1e-6);
    }

    #[test]
    fn test_svd_iteration_cap() {
        let a = mat(3, 3, vec![4.0, 1.0, 2.0, 1.0, 3.0, 0.5, 2.0, 0.5, 5.0]);
        let d = svd(&a, SolverOptions::new(0, 1e-12)).unwrap();
        assert_eq!(d.report.state, SolverState::IterationLimitReached);
        assert_eq!(d.report.iterations, 0);
    }

    #[test]
    fn test_svd_is_debug_printable() {
        let d = svd(&mat(2, 2, vec![2.0, 0.0, 0.0, 1.0]), SolverOptions::default()).unwrap();
        let text = format!("{d:?}");
        assert!(text.starts_with("Svd"));
        assert!(text.contains("singular_values"));
    }

    #[test]
    fn test_pinv_of_invertible_is_inverse() {
        let a = mat(2, 2, vec![4.0, 7.0, 2.0, 6.0]);
        assert_close(&pinv(&a).unwrap(), &inverse(&a).unwrap(), 1e-8);
    }

    #[test]
    fn test_pinv_penrose_identity() {
        let a = mat(2, 2, vec![1.0, 2.0, 2.0, 4.0]);
        let p = pinv(&a).unwrap();
        let apa = matmul(&matmul(&a, &p).unwrap(), &a).unwrap();
        assert_close(&apa, &a, 1e-6);
    }

    #[test]
    fn test_lstsq_line_fit() {
        let a = mat(4, 2, vec![1.0, 0.0, 1.0, 1.0, 1.0, 2.0, 1.0, 3.0]);
        let b = NdArray::from_vec(&[4], vec![1.0, 3.0, 5.0, 7.0]).unwrap();
        let x = lstsq(&a, &b).unwrap();
        assert_eq!(x.shape(), &[2]);
        assert_abs_diff_eq!(x.get(&[0]).unwrap(), 1.0, epsilon = 1e-8);
        assert_abs_diff_eq!(x.get(&[1]).unwrap(), 2.0, epsilon = 1e-8);

        let bb = NdArray::from_vec(&[4, 1], vec![1.0, 3.0, 5.0, 7.0]).unwrap();
        assert_eq!(lstsq(&a, &bb).unwrap().shape(), &[2, 1]);

        let short = NdArray::from_vec(&[3], vec![1.0, 2.0, 3.0]).unwrap();
        assert!(matches!(
            lstsq(&a, &short),
            Err(ArrayError::ShapeMismatch(_, _))
        ));
    }
}
