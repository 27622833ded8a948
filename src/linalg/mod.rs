//! Dense linear algebra written from first principles.
//!
//! All kernels take rank-2 [`NdArray`]s (matrices) unless noted and validate
//! rank and shape before touching data. Products read their operands in place
//! through strides, so transposed or broadcast views need no copy; the
//! factorisations copy into a row-major scratch matrix.
//!
//! # Key functions
//!
//! - [`matmul`], [`dot`], [`outer`], [`multi_dot`], [`matrix_power`]
//! - [`trace`], [`norm`], [`vector_norm`]
//! - [`det`], [`inverse`]: partial-pivoting elimination
//! - [`eig`], [`qr`]: unshifted QR iteration
//! - [`svd`], [`pinv`], [`lstsq`]: one-sided Jacobi on `AᵀA`
//!
//! The iterative solvers never fail on non-convergence. They return their best
//! estimate with a [`SolverReport`] recording whether the residual dropped
//! below [`SolverOptions::tol`] within [`SolverOptions::max_iter`] sweeps.

mod eig;
mod lu;
mod svd;

pub use eig::{eig, qr, Eigen, Qr};
pub use lu::{det, inverse};
pub use svd::{lstsq, pinv, svd, Svd};

use std::ops::{Index, IndexMut};
use std::str::FromStr;

use log::{debug, trace, warn};
use num_traits::ToPrimitive;

use crate::kernel::collect_indexed;
use crate::scalar::{FloatScalar, Scalar};
use crate::{
    ArrayError, NdArray, Result, DEFAULT_MAX_ITER, DEFAULT_TOLERANCE, PIVOT_TOLERANCE,
};

// ============================================================================
// Solver configuration and state
// ============================================================================

/// Iteration cap and convergence tolerance for [`eig`] and [`svd`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverOptions {
    /// Maximum number of sweeps.
    pub max_iter: usize,
    /// Off-diagonal magnitude below which a sweep counts as converged.
    pub tol: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_iter: DEFAULT_MAX_ITER,
            tol: DEFAULT_TOLERANCE,
        }
    }
}

impl SolverOptions {
    pub fn new(max_iter: usize, tol: f64) -> Self {
        Self { max_iter, tol }
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }
}

/// Phase of an iterative solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverState {
    Initialized,
    Iterating,
    Converged,
    IterationLimitReached,
}

/// How an iterative solver terminated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverReport {
    /// Terminal state: [`SolverState::Converged`] or
    /// [`SolverState::IterationLimitReached`].
    pub state: SolverState,
    /// Sweeps performed.
    pub iterations: usize,
    /// Off-diagonal magnitude at termination.
    pub residual: f64,
}

impl SolverReport {
    pub fn converged(&self) -> bool {
        self.state == SolverState::Converged
    }
}

/// Drives the `Initialized -> Iterating -> {Converged, IterationLimitReached}`
/// transitions shared by the QR and Jacobi loops.
pub(crate) struct Progress {
    solver: &'static str,
    options: SolverOptions,
    state: SolverState,
    iterations: usize,
    residual: f64,
}

impl Progress {
    pub(crate) fn new(solver: &'static str, options: SolverOptions) -> Self {
        Self {
            solver,
            options,
            state: SolverState::Initialized,
            iterations: 0,
            residual: f64::INFINITY,
        }
    }

    /// Record the residual before a sweep. Returns `true` if another sweep
    /// should run.
    pub(crate) fn step<T: ToPrimitive>(&mut self, residual: T) -> bool {
        self.residual = residual.to_f64().unwrap_or(f64::NAN);
        if self.residual < self.options.tol {
            self.state = SolverState::Converged;
            debug!(
                "{}: converged after {} sweeps, residual {:e}",
                self.solver, self.iterations, self.residual
            );
            return false;
        }
        if self.iterations >= self.options.max_iter {
            self.state = SolverState::IterationLimitReached;
            warn!(
                "{}: stopped at iteration cap {} with residual {:e} (tol {:e})",
                self.solver, self.options.max_iter, self.residual, self.options.tol
            );
            return false;
        }
        self.state = SolverState::Iterating;
        self.iterations += 1;
        trace!(
            "{}: sweep {} residual {:e}",
            self.solver,
            self.iterations,
            self.residual
        );
        true
    }

    pub(crate) fn report(&self) -> SolverReport {
        SolverReport {
            state: self.state,
            iterations: self.iterations,
            residual: self.residual,
        }
    }
}

// ============================================================================
// Working matrix
// ============================================================================

/// Owned row-major matrix used as scratch space by the factorisations.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Matrix<T> {
    pub(crate) rows: usize,
    pub(crate) cols: usize,
    data: Vec<T>,
}

impl<T: Scalar> Matrix<T> {
    pub(crate) fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![T::zero(); rows * cols],
        }
    }

    pub(crate) fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m[(i, i)] = T::one();
        }
        m
    }

    /// Copy a rank-2 array.
    pub(crate) fn from_array(a: &NdArray<T>) -> Result<Self> {
        let (rows, cols) = matrix_dims(a)?;
        Ok(Self {
            rows,
            cols,
            data: a.to_vec(),
        })
    }

    pub(crate) fn into_array(self) -> NdArray<T> {
        NdArray::from_contiguous(&[self.rows, self.cols], self.data)
    }

    pub(crate) fn transpose(&self) -> Self {
        let mut t = Self::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                t[(j, i)] = self[(i, j)];
            }
        }
        t
    }

    pub(crate) fn matmul(&self, other: &Self) -> Self {
        let mut out = Self::zeros(self.rows, other.cols);
        for i in 0..self.rows {
            for k in 0..self.cols {
                let aik = self[(i, k)];
                for j in 0..other.cols {
                    out[(i, j)] = out[(i, j)] + aik * other[(k, j)];
                }
            }
        }
        out
    }

    pub(crate) fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for j in 0..self.cols {
            self.data.swap(a * self.cols + j, b * self.cols + j);
        }
    }

    pub(crate) fn column(&self, j: usize) -> Vec<T> {
        (0..self.rows).map(|i| self[(i, j)]).collect()
    }

    pub(crate) fn set_column(&mut self, j: usize, values: &[T]) {
        for (i, &v) in values.iter().enumerate() {
            self[(i, j)] = v;
        }
    }
}

impl<T> Index<(usize, usize)> for Matrix<T> {
    type Output = T;

    #[inline]
    fn index(&self, (i, j): (usize, usize)) -> &T {
        &self.data[i * self.cols + j]
    }
}

impl<T> IndexMut<(usize, usize)> for Matrix<T> {
    #[inline]
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut T {
        &mut self.data[i * self.cols + j]
    }
}

/// `(rows, cols)` of a rank-2 array.
pub(crate) fn matrix_dims<T>(a: &NdArray<T>) -> Result<(usize, usize)> {
    match a.shape() {
        &[rows, cols] => Ok((rows, cols)),
        shape => Err(ArrayError::NotMatrix(shape.len())),
    }
}

/// Side length of a square matrix.
pub(crate) fn square_dim<T>(a: &NdArray<T>) -> Result<usize> {
    let (rows, cols) = matrix_dims(a)?;
    if rows != cols {
        return Err(ArrayError::NotSquare { rows, cols });
    }
    Ok(rows)
}

/// [`PIVOT_TOLERANCE`] in the working precision.
pub(crate) fn pivot_tolerance<T: FloatScalar>() -> T {
    T::from(PIVOT_TOLERANCE).unwrap_or_else(T::epsilon)
}

// ============================================================================
// Products
// ============================================================================

/// Matrix product `C(i, j) = Σ_k A(i, k) B(k, j)`.
///
/// # Errors
/// [`ArrayError::NotMatrix`] for non-rank-2 inputs, [`ArrayError::ShapeMismatch`]
/// when the inner dimensions differ.
///
/// # Example
/// ```rust
/// use strided_nd::{linalg, NdArray};
///
/// let a = NdArray::from_vec(&[2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
/// let c = linalg::matmul(&a, &a.t()).unwrap();
/// assert_eq!(c.to_vec(), vec![5.0, 11.0, 11.0, 25.0]);
/// ```
pub fn matmul<T: Scalar>(a: &NdArray<T>, b: &NdArray<T>) -> Result<NdArray<T>> {
    let (n, p) = matrix_dims(a)?;
    let (p2, m) = matrix_dims(b)?;
    if p != p2 {
        return Err(ArrayError::ShapeMismatch(a.shape().to_vec(), b.shape().to_vec()));
    }
    let (da, db) = (a.data(), b.data());
    let (sa, sb): (&[T], &[T]) = (&da, &db);
    let (ar, ac, ao) = (a.strides()[0], a.strides()[1], a.offset());
    let (br, bc, bo) = (b.strides()[0], b.strides()[1], b.offset());
    let out = collect_indexed(n * m, |idx| {
        let (i, j) = (idx / m, idx % m);
        (0..p).fold(T::zero(), |acc, k| {
            acc + sa[ao + i * ar + k * ac] * sb[bo + k * br + j * bc]
        })
    });
    Ok(NdArray::from_contiguous(&[n, m], out))
}

/// Generalised dot product.
///
/// - 1-D · 1-D: inner product, returned with shape `[1]`
/// - 2-D · 2-D: [`matmul`]
/// - 2-D · 1-D: matrix-vector product, shape `[rows]`
/// - 1-D · 2-D: vector-matrix product, shape `[cols]`
pub fn dot<T: Scalar>(a: &NdArray<T>, b: &NdArray<T>) -> Result<NdArray<T>> {
    match (a.ndim(), b.ndim()) {
        (1, 1) => {
            if a.len() != b.len() {
                return Err(ArrayError::ShapeMismatch(a.shape().to_vec(), b.shape().to_vec()));
            }
            let s = a
                .iter()
                .zip(b.iter())
                .fold(T::zero(), |acc, (x, y)| acc + x * y);
            NdArray::from_vec(&[1], vec![s])
        }
        (2, 2) => matmul(a, b),
        (2, 1) => {
            let col = b.expand_dims(1)?;
            matmul(a, &col)?.reshape(&[a.shape()[0]])
        }
        (1, 2) => {
            let row = a.expand_dims(0)?;
            matmul(&row, b)?.reshape(&[b.shape()[1]])
        }
        _ => Err(ArrayError::InvalidArgument(format!(
            "dot supports 1-D and 2-D operands, got ranks {} and {}",
            a.ndim(),
            b.ndim()
        ))),
    }
}

/// Outer product of two vectors: `out(i, j) = a[i] * b[j]`.
pub fn outer<T: Scalar>(a: &NdArray<T>, b: &NdArray<T>) -> Result<NdArray<T>> {
    if a.ndim() != 1 || b.ndim() != 1 {
        return Err(ArrayError::InvalidArgument(format!(
            "outer expects vectors, got ranks {} and {}",
            a.ndim(),
            b.ndim()
        )));
    }
    crate::ops::multiply(&a.expand_dims(1)?, &b.expand_dims(0)?)
}

/// Product of a chain of matrices, multiplied in the order that minimises the
/// scalar multiplication count (classic matrix-chain dynamic programme).
pub fn multi_dot<T: Scalar>(matrices: &[&NdArray<T>]) -> Result<NdArray<T>> {
    let n = matrices.len();
    if n < 2 {
        return Err(ArrayError::InvalidArgument(format!(
            "multi_dot needs at least two matrices, got {n}"
        )));
    }
    let mut dims = Vec::with_capacity(n + 1);
    for (i, m) in matrices.iter().enumerate() {
        let (rows, cols) = matrix_dims(m)?;
        if i == 0 {
            dims.push(rows);
        } else if dims[i] != rows {
            return Err(ArrayError::ShapeMismatch(
                matrices[i - 1].shape().to_vec(),
                m.shape().to_vec(),
            ));
        }
        dims.push(cols);
    }

    // cost[i][j]: cheapest product of matrices i..=j; split[i][j]: its last split
    let mut cost = vec![vec![0usize; n]; n];
    let mut split = vec![vec![0usize; n]; n];
    for len in 2..=n {
        for i in 0..=n - len {
            let j = i + len - 1;
            cost[i][j] = usize::MAX;
            for k in i..j {
                let q = cost[i][k]
                    .saturating_add(cost[k + 1][j])
                    .saturating_add(dims[i].saturating_mul(dims[k + 1]).saturating_mul(dims[j + 1]));
                if q < cost[i][j] {
                    cost[i][j] = q;
                    split[i][j] = k;
                }
            }
        }
    }
    chain_product(matrices, &split, 0, n - 1)
}

fn chain_product<T: Scalar>(
    matrices: &[&NdArray<T>],
    split: &[Vec<usize>],
    i: usize,
    j: usize,
) -> Result<NdArray<T>> {
    if i == j {
        return Ok(matrices[i].clone());
    }
    let k = split[i][j];
    let left = chain_product(matrices, split, i, k)?;
    let right = chain_product(matrices, split, k + 1, j)?;
    matmul(&left, &right)
}

/// `A^n` by repeated squaring; negative powers invert `A` first.
///
/// # Errors
/// [`ArrayError::NotSquare`] for non-square input, [`ArrayError::SingularMatrix`]
/// for a negative power of a singular matrix.
pub fn matrix_power<T: FloatScalar>(a: &NdArray<T>, n: i32) -> Result<NdArray<T>> {
    let size = square_dim(a)?;
    let mut result = Matrix::<T>::identity(size).into_array();
    if n == 0 {
        return Ok(result);
    }
    let mut base = if n > 0 { a.clone() } else { inverse(a)? };
    let mut exp = n.unsigned_abs();
    while exp > 0 {
        if exp & 1 == 1 {
            result = matmul(&result, &base)?;
        }
        exp >>= 1;
        if exp > 0 {
            base = matmul(&base, &base)?;
        }
    }
    Ok(result)
}

// ============================================================================
// Trace and norms
// ============================================================================

/// Sum of the main diagonal.
///
/// # Errors
/// [`ArrayError::NotSquare`] unless `a` is square.
pub fn trace<T: Scalar>(a: &NdArray<T>) -> Result<T> {
    let n = square_dim(a)?;
    (0..n).try_fold(T::zero(), |acc, i| Ok(acc + a.get(&[i, i])?))
}

/// Matrix norm selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormKind {
    /// `sqrt(Σ a_ij²)`
    Frobenius,
    /// Maximum absolute row sum.
    Inf,
    /// Maximum absolute column sum.
    One,
    /// Largest singular value.
    Spectral,
}

impl FromStr for NormKind {
    type Err = ArrayError;

    /// Parses the NumPy spellings `"fro"`, `"inf"`, `"1"` and `"2"`.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "fro" => Ok(NormKind::Frobenius),
            "inf" => Ok(NormKind::Inf),
            "1" => Ok(NormKind::One),
            "2" => Ok(NormKind::Spectral),
            other => Err(ArrayError::UnknownNorm(other.to_string())),
        }
    }
}

/// Matrix norm of the given kind.
///
/// # Example
/// ```rust
/// use strided_nd::linalg::{norm, NormKind};
/// use strided_nd::NdArray;
///
/// let a = NdArray::from_vec(&[2, 2], vec![1.0, -2.0, 3.0, 4.0]).unwrap();
/// assert_eq!(norm(&a, NormKind::Inf).unwrap(), 7.0);
/// assert_eq!(norm(&a, "1".parse().unwrap()).unwrap(), 6.0);
/// ```
pub fn norm<T: FloatScalar>(a: &NdArray<T>, kind: NormKind) -> Result<T> {
    matrix_dims(a)?;
    match kind {
        NormKind::Frobenius => Ok(crate::reduce(a, |x| x * x, |s, x| s + x, T::zero()).sqrt()),
        NormKind::Inf => {
            let sums = crate::reduce_axis(a, 1, |x: T| x.abs(), |s, x| s + x, T::zero())?;
            Ok(crate::max(&sums))
        }
        NormKind::One => {
            let sums = crate::reduce_axis(a, 0, |x: T| x.abs(), |s, x| s + x, T::zero())?;
            Ok(crate::max(&sums))
        }
        NormKind::Spectral => {
            let s = svd(a, SolverOptions::default())?;
            Ok(crate::max(&s.singular_values))
        }
    }
}

/// Euclidean norm of a vector.
pub fn vector_norm<T: FloatScalar>(v: &NdArray<T>) -> Result<T> {
    if v.ndim() != 1 {
        return Err(ArrayError::InvalidArgument(format!(
            "vector_norm expects a 1-D array, got rank {}",
            v.ndim()
        )));
    }
    Ok(crate::reduce(v, |x| x * x, |s, x| s + x, T::zero()).sqrt())
}

/// Σ |a_ij| over i ≠ j.
pub(crate) fn off_diagonal<T: FloatScalar>(m: &Matrix<T>) -> T {
    let mut s = T::zero();
    for i in 0..m.rows {
        for j in 0..m.cols {
            if i != j {
                s = s + m[(i, j)].abs();
            }
        }
    }
    s
}
