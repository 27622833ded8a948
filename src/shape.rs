//! Shape and stride arithmetic.
//!
//! Pure functions over dimension sequences: element counts with overflow
//! detection, row-major strides, and conversion between multi-indices and flat
//! offsets.

use crate::{ArrayError, Result};

/// Product of the dimensions of `shape`.
///
/// An empty shape describes a single element and returns 1.
///
/// # Errors
/// [`ArrayError::Overflow`] when the product does not fit in `usize`.
pub fn total_size(shape: &[usize]) -> Result<usize> {
    shape.iter().try_fold(1usize, |acc, &d| {
        acc.checked_mul(d)
            .ok_or_else(|| ArrayError::Overflow(shape.to_vec()))
    })
}

/// Check that `shape` can back an array and return its element count.
///
/// Arrays are never rank 0 and never empty: every dimension must be positive.
pub fn validate_shape(shape: &[usize]) -> Result<usize> {
    if shape.is_empty() || shape.contains(&0) {
        return Err(ArrayError::InvalidShape(shape.to_vec()));
    }
    total_size(shape)
}

/// Compute row-major strides (last index varies fastest).
///
/// `strides[last] == 1` and `strides[i] == strides[i + 1] * shape[i + 1]`.
/// The caller is expected to have validated the shape with [`total_size`].
pub fn compute_strides(shape: &[usize]) -> Vec<usize> {
    let rank = shape.len();
    if rank == 0 {
        return vec![];
    }
    let mut strides = vec![1usize; rank];
    for i in (0..rank - 1).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }
    strides
}

/// Flat offset of a multi-index: `Σ index[i] * strides[i]`.
///
/// # Errors
/// [`ArrayError::RankMismatch`] when the lengths differ,
/// [`ArrayError::Overflow`] when the offset does not fit in `usize`.
pub fn flatten_index(index: &[usize], strides: &[usize]) -> Result<usize> {
    if index.len() != strides.len() {
        return Err(ArrayError::RankMismatch {
            expected: strides.len(),
            got: index.len(),
        });
    }
    index
        .iter()
        .zip(strides)
        .try_fold(0usize, |acc, (&i, &s)| {
            i.checked_mul(s).and_then(|term| acc.checked_add(term))
        })
        .ok_or_else(|| ArrayError::Overflow(index.to_vec()))
}

/// Bounds-checked [`flatten_index`] against a row-major layout of `shape`.
pub fn ravel_multi_index(index: &[usize], shape: &[usize]) -> Result<usize> {
    check_index(index, shape)?;
    flatten_index(index, &compute_strides(shape))
}

/// Inverse of [`flatten_index`] for row-major strides.
///
/// # Errors
/// [`ArrayError::RankMismatch`] when `shape` and `strides` disagree in length,
/// [`ArrayError::IndexOutOfRange`] when `offset >= total_size(shape)`.
pub fn unravel_index(offset: usize, shape: &[usize], strides: &[usize]) -> Result<Vec<usize>> {
    if shape.len() != strides.len() {
        return Err(ArrayError::RankMismatch {
            expected: shape.len(),
            got: strides.len(),
        });
    }
    let total = total_size(shape)?;
    if offset >= total {
        return Err(ArrayError::IndexOutOfRange {
            axis: 0,
            index: offset,
            dim: total,
        });
    }
    let mut rem = offset;
    let mut index = Vec::with_capacity(shape.len());
    for (axis, &stride) in strides.iter().enumerate() {
        if stride == 0 {
            return Err(ArrayError::InvalidArgument(format!(
                "cannot unravel through zero stride on axis {axis}"
            )));
        }
        index.push(rem / stride);
        rem %= stride;
    }
    Ok(index)
}

/// Validate rank and per-axis bounds of a multi-index.
pub(crate) fn check_index(index: &[usize], shape: &[usize]) -> Result<()> {
    if index.len() != shape.len() {
        return Err(ArrayError::RankMismatch {
            expected: shape.len(),
            got: index.len(),
        });
    }
    for (axis, (&i, &d)) in index.iter().zip(shape).enumerate() {
        if i >= d {
            return Err(ArrayError::IndexOutOfRange {
                axis,
                index: i,
                dim: d,
            });
        }
    }
    Ok(())
}

/// Advance a row-major multi-index counter in place. Returns `false` on wrap-around.
#[inline]
pub(crate) fn increment_index(index: &mut [usize], shape: &[usize]) -> bool {
    for d in (0..shape.len()).rev() {
        index[d] += 1;
        if index[d] < shape[d] {
            return true;
        }
        index[d] = 0;
    }
    false
}
