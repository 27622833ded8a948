//! Partial-pivoting elimination: determinant and inverse.

use log::debug;

use super::{pivot_tolerance, square_dim, Matrix};
use crate::scalar::FloatScalar;
use crate::{ArrayError, NdArray, Result};

/// Row in `from..rows` with the largest magnitude in column `col`.
fn pivot_row<T: FloatScalar>(m: &Matrix<T>, col: usize, from: usize) -> usize {
    (from + 1..m.rows).fold(from, |best, r| {
        if m[(r, col)].abs() > m[(best, col)].abs() {
            r
        } else {
            best
        }
    })
}

/// Determinant by LU decomposition with partial pivoting.
///
/// `det = Π pivots × (-1)^swaps`. A pivot smaller than [`PIVOT_TOLERANCE`](crate::PIVOT_TOLERANCE) in
/// magnitude marks the matrix singular and the result is exactly zero; this is
/// the one kernel that answers singular input with a value instead of an error.
///
/// # Errors
/// [`ArrayError::NotMatrix`] or [`ArrayError::NotSquare`] for non-square input.
pub fn det<T: FloatScalar>(a: &NdArray<T>) -> Result<T> {
    let n = square_dim(a)?;
    let mut lu = Matrix::from_array(a)?;
    let tol = pivot_tolerance::<T>();
    let mut det = T::one();
    let mut swaps = 0usize;

    for k in 0..n {
        let p = pivot_row(&lu, k, k);
        if lu[(p, k)].abs() < tol {
            debug!("det: pivot {:?} in column {k} below tolerance, singular", lu[(p, k)]);
            return Ok(T::zero());
        }
        if p != k {
            lu.swap_rows(p, k);
            swaps += 1;
        }
        let pivot = lu[(k, k)];
        det = det * pivot;
        for r in k + 1..n {
            let factor = lu[(r, k)] / pivot;
            if factor == T::zero() {
                continue;
            }
            for c in k..n {
                lu[(r, c)] = lu[(r, c)] - factor * lu[(k, c)];
            }
        }
    }

    Ok(if swaps % 2 == 1 { -det } else { det })
}

/// Inverse by Gauss-Jordan elimination on `[A | I]` with partial pivoting.
///
/// # Errors
/// [`ArrayError::SingularMatrix`] when a pivot falls below [`PIVOT_TOLERANCE`](crate::PIVOT_TOLERANCE),
/// [`ArrayError::NotMatrix`] or [`ArrayError::NotSquare`] for non-square input.
pub fn inverse<T: FloatScalar>(a: &NdArray<T>) -> Result<NdArray<T>> {
    let n = square_dim(a)?;
    let mut m = Matrix::from_array(a)?;
    let mut inv = Matrix::<T>::identity(n);
    let tol = pivot_tolerance::<T>();

    for i in 0..n {
        let p = pivot_row(&m, i, i);
        if m[(p, i)].abs() < tol {
            debug!("inverse: pivot {:?} in column {i} below tolerance", m[(p, i)]);
            return Err(ArrayError::SingularMatrix);
        }
        m.swap_rows(p, i);
        inv.swap_rows(p, i);

        let pivot = m[(i, i)];
        for j in 0..n {
            m[(i, j)] = m[(i, j)] / pivot;
            inv[(i, j)] = inv[(i, j)] / pivot;
        }
        for r in 0..n {
            if r == i {
                continue;
            }
            let factor = m[(r, i)];
            if factor == T::zero() {
                continue;
            }
            for j in 0..n {
                m[(r, j)] = m[(r, j)] - factor * m[(i, j)];
                inv[(r, j)] = inv[(r, j)] - factor * inv[(i, j)];
            }
        }
    }
    Ok(inv.into_array())
}
