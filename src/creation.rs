//! Array constructors: ranges, identity-like matrices and diagonals.

use num_traits::{Float, ToPrimitive};

use crate::scalar::Scalar;
use crate::{ArrayError, NdArray, Result};

/// `n x m` matrix with ones on diagonal `k` (positive above the main diagonal)
/// and zeros elsewhere.
pub fn eye<T: Scalar>(n: usize, m: usize, k: isize) -> Result<NdArray<T>> {
    NdArray::from_fn(&[n, m], |idx| {
        if idx[1] as isize - idx[0] as isize == k {
            T::one()
        } else {
            T::zero()
        }
    })
}

/// `n x n` identity matrix.
pub fn identity<T: Scalar>(n: usize) -> Result<NdArray<T>> {
    eye(n, n, 0)
}

/// Values `start, start + step, ...` strictly before `stop`.
///
/// The length is fixed up front as `ceil((stop - start) / step)`, so a step
/// too small to move a float, or a range ending near the type's maximum,
/// still terminates without overflowing.
///
/// # Errors
/// [`ArrayError::InvalidArgument`] for a zero step, non-finite bounds or a
/// length that cannot be allocated, [`ArrayError::InvalidShape`] when the
/// range is empty.
pub fn arange<T: Scalar>(start: T, stop: T, step: T) -> Result<NdArray<T>> {
    if step.is_zero() {
        return Err(ArrayError::InvalidArgument(
            "arange step cannot be zero".to_string(),
        ));
    }
    let count = arange_len(start, stop, step)?;
    let mut data = Vec::with_capacity(count);
    let mut value = start;
    data.push(value);
    if count > 1 {
        // the next value stays before `stop` iff the current one is before `stop - step`
        let last = stop - step;
        let ascending = step > T::zero();
        while data.len() < count && ((ascending && value < last) || (!ascending && value > last)) {
            value = value + step;
            data.push(value);
        }
    }
    NdArray::from_vec(&[data.len()], data)
}

fn arange_len<T: Scalar>(start: T, stop: T, step: T) -> Result<usize> {
    let span = match (start.to_f64(), stop.to_f64(), step.to_f64()) {
        (Some(a), Some(b), Some(s)) => ((b - a) / s).ceil(),
        _ => f64::NAN,
    };
    if span.is_nan() {
        return Err(ArrayError::InvalidArgument(format!(
            "arange bounds {start}..{stop} step {step} are not finite"
        )));
    }
    if span <= 0.0 {
        return Err(ArrayError::InvalidShape(vec![0]));
    }
    if span > isize::MAX as f64 {
        return Err(ArrayError::InvalidArgument(format!(
            "arange {start}..{stop} step {step} has too many elements"
        )));
    }
    Ok(span as usize)
}

/// `num` evenly spaced values over `[start, stop]`, or `[start, stop)` when
/// `endpoint` is false. With `endpoint` the last value is exactly `stop`.
pub fn linspace<T: Scalar + Float>(
    start: T,
    stop: T,
    num: usize,
    endpoint: bool,
) -> Result<NdArray<T>> {
    if num == 0 {
        return Err(ArrayError::InvalidShape(vec![0]));
    }
    if num == 1 {
        return NdArray::from_vec(&[1], vec![start]);
    }
    let intervals = if endpoint { num - 1 } else { num };
    let divisor = T::from(intervals)
        .ok_or_else(|| ArrayError::InvalidArgument(format!("{intervals} intervals")))?;
    let step = (stop - start) / divisor;
    let mut data: Vec<T> = (0..num)
        .map(|i| start + T::from(i).unwrap_or_else(T::nan) * step)
        .collect();
    if endpoint {
        data[num - 1] = stop;
    }
    NdArray::from_vec(&[num], data)
}

/// Diagonal matrix from a vector, or diagonal `k` of a matrix.
///
/// For 1-D input of length `n`, returns an `(n + |k|) x (n + |k|)` matrix with
/// the vector on diagonal `k`. For 2-D input, returns the elements on
/// diagonal `k`.
///
/// # Errors
/// [`ArrayError::InvalidShape`] when diagonal `k` of a matrix is empty,
/// [`ArrayError::InvalidArgument`] for other ranks.
pub fn diag<T: Scalar>(src: &NdArray<T>, k: isize) -> Result<NdArray<T>> {
    let row_shift = k.unsigned_abs() * usize::from(k < 0);
    let col_shift = k.unsigned_abs() * usize::from(k > 0);
    match src.ndim() {
        1 => {
            let v = src.to_vec();
            let size = v.len() + k.unsigned_abs();
            NdArray::from_fn(&[size, size], |idx| {
                let (r, c) = (idx[0], idx[1]);
                if r >= row_shift && c >= col_shift && r - row_shift == c - col_shift {
                    v.get(r - row_shift).copied().unwrap_or_else(T::zero)
                } else {
                    T::zero()
                }
            })
        }
        2 => {
            let (rows, cols) = (src.shape()[0], src.shape()[1]);
            let len = rows
                .saturating_sub(row_shift)
                .min(cols.saturating_sub(col_shift));
            let values = (0..len)
                .map(|i| src.get(&[row_shift + i, col_shift + i]))
                .collect::<Result<Vec<T>>>()?;
            NdArray::from_vec(&[len], values)
        }
        rank => Err(ArrayError::InvalidArgument(format!(
            "diag expects a 1-D or 2-D array, got rank {rank}"
        ))),
    }
}

/// Vandermonde matrix: column `j` holds `x^(n-1-j)`, or `x^j` when `increasing`.
pub fn vander<T: Scalar>(x: &NdArray<T>, n: usize, increasing: bool) -> Result<NdArray<T>> {
    if x.ndim() != 1 {
        return Err(ArrayError::InvalidArgument(format!(
            "vander expects a 1-D array, got rank {}",
            x.ndim()
        )));
    }
    let xs = x.to_vec();
    NdArray::from_fn(&[xs.len(), n], |idx| {
        let power = if increasing { idx[1] } else { n - 1 - idx[1] };
        (0..power).fold(T::one(), |acc, _| acc * xs[idx[0]])
    })
}
