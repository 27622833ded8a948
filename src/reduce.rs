//! Whole-array and per-axis reductions, plus running scans.
//!
//! [`reduce`] folds every element in row-major order. [`reduce_axis`] folds
//! each lane along one axis and drops that axis from the result. The scans
//! keep the input shape.

use num_traits::Float;

use crate::kernel::{collect_indexed, Layout};
use crate::maybe_sync::MaybeSendSync;
use crate::scalar::{Element, Scalar, Truthy};
use crate::shape::compute_strides;
use crate::{ArrayError, NdArray, Result};

/// Fold every element: `reduce_fn(... reduce_fn(init, map_fn(x0)) ..., map_fn(xn))`.
pub fn reduce<T, U, M, R>(src: &NdArray<T>, map_fn: M, reduce_fn: R, init: U) -> U
where
    T: Element,
    M: Fn(T) -> U,
    R: Fn(U, U) -> U,
{
    let data = src.data();
    let layout = src.layout();
    (0..src.len()).fold(init, |acc, i| reduce_fn(acc, map_fn(data[layout.at(i)])))
}

/// Fold along `axis`, removing it from the shape.
///
/// A 1-D input reduces to shape `[1]` since arrays are never rank 0.
///
/// # Errors
/// [`ArrayError::InvalidAxis`] when `axis >= ndim()`.
pub fn reduce_axis<T, U, M, R>(
    src: &NdArray<T>,
    axis: usize,
    map_fn: M,
    reduce_fn: R,
    init: U,
) -> Result<NdArray<U>>
where
    T: Element,
    U: Element,
    M: Fn(T) -> U + MaybeSendSync,
    R: Fn(U, U) -> U + MaybeSendSync,
{
    fold_lanes(src, axis, |lane| lane.map(&map_fn).fold(init, &reduce_fn))
}

/// Apply `fold` to each 1-D lane along `axis`.
fn fold_lanes<T, U, F>(src: &NdArray<T>, axis: usize, fold: F) -> Result<NdArray<U>>
where
    T: Element,
    U: Element,
    F: Fn(&mut dyn Iterator<Item = T>) -> U + MaybeSendSync,
{
    let rank = src.ndim();
    if axis >= rank {
        return Err(ArrayError::InvalidAxis { axis, rank });
    }
    let axis_len = src.shape()[axis];
    let axis_stride = src.strides()[axis];
    let mut out_dims = src.shape().to_vec();
    let mut outer_strides = src.strides().to_vec();
    out_dims.remove(axis);
    outer_strides.remove(axis);

    let data = src.data();
    let buf: &[T] = &data;
    let out_len: usize = out_dims.iter().product();
    let outer = Layout::new(&out_dims, &outer_strides, src.offset());
    let out = collect_indexed(out_len, |o| {
        let base = outer.at(o);
        let mut lane = (0..axis_len).map(|k| buf[base + k * axis_stride]);
        fold(&mut lane)
    });

    if out_dims.is_empty() {
        out_dims.push(1);
    }
    Ok(NdArray::from_contiguous(&out_dims, out))
}

// ============================================================================
// Whole-array reductions
// ============================================================================

pub fn sum<T: Scalar>(src: &NdArray<T>) -> T {
    reduce(src, |x| x, |a, b| a + b, T::zero())
}

pub fn product<T: Scalar>(src: &NdArray<T>) -> T {
    reduce(src, |x| x, |a, b| a * b, T::one())
}

/// Smallest element. Unordered values (`NaN`) are skipped unless every element is one.
pub fn min<T: Scalar>(src: &NdArray<T>) -> T {
    let first = src.data()[src.offset()];
    reduce(src, |x| x, pick_min, first)
}

/// Largest element. Unordered values (`NaN`) are skipped unless every element is one.
pub fn max<T: Scalar>(src: &NdArray<T>) -> T {
    let first = src.data()[src.offset()];
    reduce(src, |x| x, pick_max, first)
}

#[inline]
fn pick_min<T: PartialOrd>(a: T, b: T) -> T {
    if b < a || a != a {
        b
    } else {
        a
    }
}

#[inline]
fn pick_max<T: PartialOrd>(a: T, b: T) -> T {
    if b > a || a != a {
        b
    } else {
        a
    }
}

/// Arithmetic mean.
///
/// # Errors
/// [`ArrayError::EmptyInput`] when there is nothing to average.
pub fn mean<T: Scalar + Float>(src: &NdArray<T>) -> Result<T> {
    let n = count_as::<T>(src.len(), "mean")?;
    Ok(sum(src) / n)
}

fn count_as<T: Scalar>(n: usize, op: &'static str) -> Result<T> {
    if n == 0 {
        return Err(ArrayError::EmptyInput(op));
    }
    T::from(n).ok_or_else(|| ArrayError::InvalidArgument(format!("{op}: count {n} not representable")))
}

/// Flat row-major index of the first smallest element.
pub fn argmin<T: Element + PartialOrd>(src: &NdArray<T>) -> usize {
    arg_best(src, |cand, best| cand < best)
}

/// Flat row-major index of the first largest element.
pub fn argmax<T: Element + PartialOrd>(src: &NdArray<T>) -> usize {
    arg_best(src, |cand, best| cand > best)
}

fn arg_best<T: Element, F: Fn(T, T) -> bool>(src: &NdArray<T>, better: F) -> usize {
    let mut it = src.iter().enumerate();
    let Some((mut best_i, mut best)) = it.next() else {
        return 0;
    };
    for (i, x) in it {
        if better(x, best) {
            best_i = i;
            best = x;
        }
    }
    best_i
}

pub fn all<T: Element + Truthy>(src: &NdArray<T>) -> bool {
    src.iter().all(|x| x.is_truthy())
}

pub fn any<T: Element + Truthy>(src: &NdArray<T>) -> bool {
    src.iter().any(|x| x.is_truthy())
}

// ============================================================================
// Axis reductions
// ============================================================================

pub fn sum_axis<T: Scalar>(src: &NdArray<T>, axis: usize) -> Result<NdArray<T>> {
    reduce_axis(src, axis, |x| x, |a, b| a + b, T::zero())
}

pub fn min_axis<T: Scalar>(src: &NdArray<T>, axis: usize) -> Result<NdArray<T>> {
    fold_lanes(src, axis, |lane| {
        let first = lane.next().unwrap_or_default();
        lane.fold(first, pick_min)
    })
}

pub fn max_axis<T: Scalar>(src: &NdArray<T>, axis: usize) -> Result<NdArray<T>> {
    fold_lanes(src, axis, |lane| {
        let first = lane.next().unwrap_or_default();
        lane.fold(first, pick_max)
    })
}

pub fn mean_axis<T: Scalar + Float>(src: &NdArray<T>, axis: usize) -> Result<NdArray<T>> {
    let rank = src.ndim();
    if axis >= rank {
        return Err(ArrayError::InvalidAxis { axis, rank });
    }
    let n = count_as::<T>(src.shape()[axis], "mean")?;
    let sums = sum_axis(src, axis)?;
    Ok(crate::ops::map(&sums, move |s| s / n))
}

// ============================================================================
// Scans
// ============================================================================

/// Running sum. `None` scans the flattened array; `Some(axis)` scans each lane
/// along `axis` and keeps the shape.
pub fn cumsum<T: Scalar>(src: &NdArray<T>, axis: Option<usize>) -> Result<NdArray<T>> {
    scan(src, axis, |a, b| a + b)
}

/// Running product; see [`cumsum`] for the `axis` convention.
pub fn cumprod<T: Scalar>(src: &NdArray<T>, axis: Option<usize>) -> Result<NdArray<T>> {
    scan(src, axis, |a, b| a * b)
}

fn scan<T, F>(src: &NdArray<T>, axis: Option<usize>, op: F) -> Result<NdArray<T>>
where
    T: Element,
    F: Fn(T, T) -> T,
{
    let mut values = src.to_vec();
    let Some(axis) = axis else {
        for i in 1..values.len() {
            values[i] = op(values[i - 1], values[i]);
        }
        return Ok(NdArray::from_contiguous(&[values.len()], values));
    };

    let rank = src.ndim();
    if axis >= rank {
        return Err(ArrayError::InvalidAxis { axis, rank });
    }
    let shape = src.shape();
    let strides = compute_strides(shape);
    let axis_len = shape[axis];
    let step = strides[axis];
    let mut outer_dims = shape.to_vec();
    let mut outer_strides = strides.clone();
    outer_dims.remove(axis);
    outer_strides.remove(axis);
    let outer = Layout::new(&outer_dims, &outer_strides, 0);
    let lanes: usize = outer_dims.iter().product();
    for o in 0..lanes {
        let base = outer.at(o);
        for k in 1..axis_len {
            let (prev, cur) = (base + (k - 1) * step, base + k * step);
            values[cur] = op(values[prev], values[cur]);
        }
    }
    Ok(NdArray::from_contiguous(shape, values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn m23() -> NdArray<f64> {
        NdArray::from_vec(&[2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap()
    }

    #[test]
    fn test_reduce_sum() {
        let a = m23();
        let total = reduce(&a, |x| x, |acc, x| acc + x, 0.0);
        assert_relative_eq!(total, 21.0);
        assert_relative_eq!(sum(&a), 21.0);
        assert_relative_eq!(product(&a), 720.0);
    }

    #[test]
    fn test_reduce_with_map() {
        let a = m23();
        let sum_sq = reduce(&a, |x| x * x, |acc, x| acc + x, 0.0);
        assert_relative_eq!(sum_sq, 91.0);
    }

    #[test]
    fn test_reduce_axis_rows_and_columns() {
        let a = m23();
        let cols = reduce_axis(&a, 0, |x| x, |acc, x| acc + x, 0.0).unwrap();
        assert_eq!(cols.shape(), &[3]);
        assert_eq!(cols.to_vec(), vec![5.0, 7.0, 9.0]);
        let rows = sum_axis(&a, 1).unwrap();
        assert_eq!(rows.shape(), &[2]);
        assert_eq!(rows.to_vec(), vec![6.0, 15.0]);
        assert!(matches!(
            sum_axis(&a, 2),
            Err(ArrayError::InvalidAxis { axis: 2, rank: 2 })
        ));
    }

    #[test]
    fn test_reduce_axis_1d_keeps_rank_one() {
        let v = NdArray::from_vec(&[4], vec![1, 2, 3, 4]).unwrap();
        let s = sum_axis(&v, 0).unwrap();
        assert_eq!(s.shape(), &[1]);
        assert_eq!(s.to_vec(), vec![10]);
    }

    #[test]
    fn test_reduce_axis_on_transposed_view() {
        let t = m23().t();
        let s = sum_axis(&t, 0).unwrap();
        assert_eq!(s.to_vec(), vec![6.0, 15.0]);
    }

    #[test]
    fn test_min_max() {
        let a = NdArray::from_vec(&[2, 2], vec![3.0, -1.0, 7.5, 0.0]).unwrap();
        assert_eq!(min(&a), -1.0);
        assert_eq!(max(&a), 7.5);
        assert_eq!(argmin(&a), 1);
        assert_eq!(argmax(&a), 2);
        assert_eq!(min_axis(&a, 0).unwrap().to_vec(), vec![3.0, -1.0]);
        assert_eq!(max_axis(&a, 1).unwrap().to_vec(), vec![3.0, 7.5]);
    }

    #[test]
    fn test_min_skips_nan() {
        let a = NdArray::from_vec(&[3], vec![f64::NAN, 2.0, 1.0]).unwrap();
        assert_eq!(min(&a), 1.0);
        assert_eq!(max(&a), 2.0);
    }

    #[test]
    fn test_mean() {
        let a = m23();
        assert_relative_eq!(mean(&a).unwrap(), 3.5);
        assert_eq!(mean_axis(&a, 0).unwrap().to_vec(), vec![2.5, 3.5, 4.5]);
        assert_eq!(mean_axis(&a, 1).unwrap().to_vec(), vec![2.0, 5.0]);
    }

    #[test]
    fn test_all_any() {
        let a = NdArray::from_vec(&[3], vec![1, 0, 2]).unwrap();
        assert!(!all(&a));
        assert!(any(&a));
        let z = NdArray::from_vec(&[2], vec![false, false]).unwrap();
        assert!(!any(&z));
    }

    #[test]
    fn test_cumsum_flat_and_axis() {
        let a = NdArray::from_vec(&[2, 3], vec![1, 2, 3, 4, 5, 6]).unwrap();
        let flat = cumsum(&a, None).unwrap();
        assert_eq!(flat.shape(), &[6]);
        assert_eq!(flat.to_vec(), vec![1, 3, 6, 10, 15, 21]);
        let down = cumsum(&a, Some(0)).unwrap();
        assert_eq!(down.to_vec(), vec![1, 2, 3, 5, 7, 9]);
        let across = cumprod(&a, Some(1)).unwrap();
        assert_eq!(across.to_vec(), vec![1, 2, 6, 4, 20, 120]);
        assert!(cumsum(&a, Some(2)).is_err());
    }
}
