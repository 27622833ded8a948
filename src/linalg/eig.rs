//! QR factorisation and the unshifted QR eigenvalue iteration.

use std::fmt;

use log::debug;

use super::{
    matrix_dims, off_diagonal, pivot_tolerance, square_dim, Matrix, Progress, SolverOptions,
    SolverReport,
};
use crate::scalar::{Element, FloatScalar};
use crate::{ArrayError, NdArray, Result};

/// Reduced QR factorisation `A = Q R` of an `m x n` matrix with `m >= n`.
#[derive(Clone)]
pub struct Qr<T> {
    /// `m x n` with orthonormal columns.
    pub q: NdArray<T>,
    /// `n x n` upper triangular.
    pub r: NdArray<T>,
}

/// Eigenvalue estimates from [`eig`].
#[derive(Clone)]
pub struct Eigen<T> {
    /// Diagonal of the final iterate, shape `[n, 1]`.
    pub values: NdArray<T>,
    /// Accumulated orthogonal transforms; column `j` pairs with `values[j]`.
    pub vectors: NdArray<T>,
    pub report: SolverReport,
}

impl<T: Element> fmt::Debug for Qr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Qr")
            .field("q", &self.q)
            .field("r", &self.r)
            .finish()
    }
}

impl<T: Element> fmt::Debug for Eigen<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Eigen")
            .field("values", &self.values)
            .field("vectors", &self.vectors)
            .field("report", &self.report)
            .finish()
    }
}

fn dot_columns<T: FloatScalar>(m: &Matrix<T>, j: usize, v: &[T]) -> T {
    v.iter()
        .enumerate()
        .fold(T::zero(), |acc, (i, &x)| acc + m[(i, j)] * x)
}

fn euclidean<T: FloatScalar>(v: &[T]) -> T {
    v.iter().fold(T::zero(), |acc, &x| acc + x * x).sqrt()
}

/// Remove from `v` its projection onto the columns `0..filled` of `q`.
/// Two passes keep the result orthogonal to working precision.
fn orthogonalize<T: FloatScalar>(q: &Matrix<T>, filled: usize, v: &mut [T]) {
    for _ in 0..2 {
        for j in 0..filled {
            let proj = dot_columns(q, j, v);
            for (i, x) in v.iter_mut().enumerate() {
                *x = *x - proj * q[(i, j)];
            }
        }
    }
}

/// Fill column `j` of `q` with a unit vector orthogonal to columns `0..j`,
/// built from whichever standard basis vector keeps the largest remainder.
/// The column is left zero if no candidate survives orthogonalisation.
pub(super) fn complete_column<T: FloatScalar>(q: &mut Matrix<T>, j: usize) {
    let tol = pivot_tolerance::<T>();
    let mut best: Option<(T, Vec<T>)> = None;
    for e in 0..q.rows {
        let mut v = vec![T::zero(); q.rows];
        v[e] = T::one();
        orthogonalize(q, j, &mut v);
        let n = euclidean(&v);
        if best.as_ref().map_or(true, |(bn, _)| n > *bn) {
            best = Some((n, v));
        }
    }
    match best {
        Some((n, v)) if n > tol => {
            let unit: Vec<T> = v.iter().map(|&x| x / n).collect();
            q.set_column(j, &unit);
        }
        _ => {
            debug!("complete_column: no direction left for column {j}");
            q.set_column(j, &vec![T::zero(); q.rows]);
        }
    }
}

/// Modified Gram-Schmidt. Columns that are numerically dependent on their
/// predecessors get `R(j, j) ≈ 0` and an arbitrary orthonormal completion in `Q`.
pub(super) fn gram_schmidt<T: FloatScalar>(a: &Matrix<T>) -> (Matrix<T>, Matrix<T>) {
    let (m, n) = (a.rows, a.cols);
    let tol = pivot_tolerance::<T>();
    let mut q = Matrix::zeros(m, n);
    let mut r = Matrix::zeros(n, n);
    for j in 0..n {
        let mut v = a.column(j);
        for i in 0..j {
            let rij = dot_columns(&q, i, &v);
            r[(i, j)] = rij;
            for (k, x) in v.iter_mut().enumerate() {
                *x = *x - rij * q[(k, i)];
            }
        }
        let norm = euclidean(&v);
        r[(j, j)] = norm;
        if norm > tol {
            let unit: Vec<T> = v.iter().map(|&x| x / norm).collect();
            q.set_column(j, &unit);
        } else {
            complete_column(&mut q, j);
        }
    }
    (q, r)
}

/// Reduced QR factorisation by modified Gram-Schmidt.
///
/// # Errors
/// [`ArrayError::NotMatrix`] for non-rank-2 input, [`ArrayError::InvalidArgument`]
/// when `a` has more columns than rows.
pub fn qr<T: FloatScalar>(a: &NdArray<T>) -> Result<Qr<T>> {
    let (m, n) = matrix_dims(a)?;
    if m < n {
        return Err(ArrayError::InvalidArgument(format!(
            "qr needs rows >= cols, got {m}x{n}"
        )));
    }
    let (q, r) = gram_schmidt(&Matrix::from_array(a)?);
    Ok(Qr {
        q: q.into_array(),
        r: r.into_array(),
    })
}

/// Eigendecomposition by unshifted QR iteration.
///
/// Each sweep factors the iterate `A_k = Q R`, replaces it with `R Q` and
/// accumulates `V <- V Q`. Iteration stops once the absolute off-diagonal sum
/// of `A_k` drops below `options.tol` or after `options.max_iter` sweeps; either
/// way the current estimate is returned and [`Eigen::report`] says which.
///
/// Reliable for symmetric matrices with eigenvalues of distinct magnitude.
/// Complex or equal-magnitude spectra never converge and come back with
/// [`SolverState::IterationLimitReached`](super::SolverState::IterationLimitReached).
///
/// # Example
/// ```rust
/// use strided_nd::linalg::{eig, SolverOptions};
/// use strided_nd::NdArray;
///
/// let a = NdArray::from_vec(&[2, 2], vec![2.0f64, 1.0, 1.0, 2.0]).unwrap();
/// let e = eig(&a, SolverOptions::default()).unwrap();
/// assert!(e.report.converged());
/// assert!((e.values.get(&[0, 0]).unwrap() - 3.0).abs() < 1e-9);
/// ```
pub fn eig<T: FloatScalar>(a: &NdArray<T>, options: SolverOptions) -> Result<Eigen<T>> {
    let n = square_dim(a)?;
    let mut ak = Matrix::from_array(a)?;
    let mut v = Matrix::<T>::identity(n);
    let mut progress = Progress::new("eig", options);

    while progress.step(off_diagonal(&ak)) {
        let (q, r) = gram_schmidt(&ak);
        ak = r.matmul(&q);
        v = v.matmul(&q);
    }

    let values = (0..n).map(|i| ak[(i, i)]).collect();
    Ok(Eigen {
        values: NdArray::from_contiguous(&[n, 1], values),
        vectors: v.into_array(),
        report: progress.report(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::{matmul, SolverState};
    use approx::assert_abs_diff_eq;

    fn mat(rows: usize, cols: usize, data: Vec<f64>) -> NdArray<f64> {
        NdArray::from_vec(&[rows, cols], data).unwrap()
    }

    fn assert_orthonormal_columns(q: &NdArray<f64>) {
        let qtq = matmul(&q.t(), q).unwrap();
        let n = qtq.shape()[0];
        for i in 0..n {
            for j in 0..n {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(qtq.get(&[i, j]).unwrap(), expected, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_qr_reconstructs() {
        let a = mat(3, 2, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let Qr { q, r } = qr(&a).unwrap();
        assert_eq!(q.shape(), &[3, 2]);
        assert_eq!(r.shape(), &[2, 2]);
        assert_orthonormal_columns(&q);
        assert_abs_diff_eq!(r.get(&[1, 0]).unwrap(), 0.0);
        let back = matmul(&q, &r).unwrap();
        for (x, e) in back.iter().zip(a.iter()) {
            assert_abs_diff_eq!(x, e, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_qr_rank_deficient_completes_q() {
        let a = mat(3, 3, vec![1.0, 2.0, 0.0, 2.0, 4.0, 0.0, 3.0, 6.0, 1.0]);
        let Qr { q, r } = qr(&a).unwrap();
        assert_orthonormal_columns(&q);
        assert_abs_diff_eq!(r.get(&[1, 1]).unwrap(), 0.0, epsilon = 1e-10);
        let back = matmul(&q, &r).unwrap();
        for (x, e) in back.iter().zip(a.iter()) {
            assert_abs_diff_eq!(x, e, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_qr_rejects_wide() {
        assert!(matches!(
            qr(&mat(2, 3, vec![0.0; 6])),
            Err(ArrayError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_eig_symmetric_pairs() {
        let a = mat(3, 3, vec![4.0, 1.0, 0.0, 1.0, 3.0, 1.0, 0.0, 1.0, 2.0]);
        let e = eig(&a, SolverOptions::default()).unwrap();
        assert!(e.report.converged());
        assert_eq!(e.values.shape(), &[3, 1]);
        let av = matmul(&a, &e.vectors).unwrap();
        for j in 0..3 {
            let lambda = e.values.get(&[j, 0]).unwrap();
            for i in 0..3 {
                assert_abs_diff_eq!(
                    av.get(&[i, j]).unwrap(),
                    lambda * e.vectors.get(&[i, j]).unwrap(),
                    epsilon = 1e-4
                );
            }
        }
        let sum: f64 = e.values.iter().sum();
        assert_abs_diff_eq!(sum, 9.0, epsilon = 1e-9);
    }

    #[test]
    fn test_eig_diagonal_converges_immediately() {
        let a = mat(2, 2, vec![5.0, 0.0, 0.0, -1.0]);
        let e = eig(&a, SolverOptions::default()).unwrap();
        assert_eq!(e.report.iterations, 0);
        assert_eq!(e.report.state, SolverState::Converged);
        assert_eq!(e.values.to_vec(), vec![5.0, -1.0]);
    }

    #[test]
    fn test_eig_iteration_cap_returns_estimate() {
        let a = mat(2, 2, vec![2.0, 1.0, 1.0, 2.0]);
        let e = eig(&a, SolverOptions::new(2, 1e-12)).unwrap();
        assert_eq!(e.report.state, SolverState::IterationLimitReached);
        assert_eq!(e.report.iterations, 2);
        assert!(e.report.residual > 0.0);
    }

    #[test]
    fn test_eig_rotation_never_converges() {
        let rot = mat(2, 2, vec![0.0, -1.0, 1.0, 0.0]);
        let e = eig(&rot, SolverOptions::default().with_max_iter(50)).unwrap();
        assert!(!e.report.converged());
        assert_eq!(e.report.iterations, 50);
    }

    #[test]
    fn test_results_are_debug_printable() {
        let a = mat(2, 2, vec![1.0, 0.0, 0.0, 2.0]);
        let e = eig(&a, SolverOptions::default()).unwrap();
        let text = format!("{e:?}");
        assert!(text.starts_with("Eigen"));
        assert!(text.contains("Converged"));
        assert!(format!("{:?}", qr(&a).unwrap()).starts_with("Qr"));
    }

    #[test]
    fn test_eig_requires_square() {
        assert!(matches!(
            eig(&mat(2, 3, vec![0.0; 6]), SolverOptions::default()),
            Err(ArrayError::NotSquare { rows: 2, cols: 3 })
        ));
    }
}
