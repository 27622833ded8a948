//! NumPy-style broadcasting.
//!
//! Shapes are compared right-aligned; a missing leading axis counts as size 1,
//! and a size-1 axis stretches to match the other operand. A broadcast view
//! repeats its source by giving expanded axes stride 0, so no data is copied.

use crate::scalar::Element;
use crate::shape::validate_shape;
use crate::{ArrayError, NdArray, Result};

/// Common shape of two broadcast-compatible shapes.
///
/// # Errors
/// [`ArrayError::IncompatibleShapes`] when a right-aligned pair of dimensions
/// differs and neither is 1.
///
/// # Example
/// ```rust
/// use strided_nd::broadcast_shapes;
///
/// assert_eq!(broadcast_shapes(&[4, 1, 3], &[5, 1]).unwrap(), vec![4, 5, 3]);
/// assert!(broadcast_shapes(&[2, 3], &[4]).is_err());
/// ```
pub fn broadcast_shapes(a: &[usize], b: &[usize]) -> Result<Vec<usize>> {
    let rank = a.len().max(b.len());
    let mut out = vec![0usize; rank];
    for i in 0..rank {
        let da = dim_from_right(a, rank, i);
        let db = dim_from_right(b, rank, i);
        out[i] = if da == db || db == 1 {
            da
        } else if da == 1 {
            db
        } else {
            return Err(ArrayError::IncompatibleShapes(a.to_vec(), b.to_vec()));
        };
    }
    Ok(out)
}

/// Common shape of three operands (as used by `clip` and `where_cond`).
pub fn broadcast_shapes3(a: &[usize], b: &[usize], c: &[usize]) -> Result<Vec<usize>> {
    let ab = broadcast_shapes(a, b)?;
    broadcast_shapes(&ab, c)
}

/// Whether [`broadcast_shapes`] would succeed.
pub fn can_broadcast(a: &[usize], b: &[usize]) -> bool {
    broadcast_shapes(a, b).is_ok()
}

/// Dimension `i` of `shape` after left-padding it with 1s to `rank`.
#[inline]
fn dim_from_right(shape: &[usize], rank: usize, i: usize) -> usize {
    let pad = rank - shape.len();
    if i < pad {
        1
    } else {
        shape[i - pad]
    }
}

/// Zero-copy view of `src` with logical shape `target`.
///
/// Element `(i0, ..., ik)` of the result is
/// `src(min(i0, s0 - 1), ..., min(ik, sk - 1))` over the left-padded source
/// dims `s`: padded and stretched axes get stride 0.
///
/// # Errors
/// [`ArrayError::InvalidShape`] for an invalid target,
/// [`ArrayError::IncompatibleShapes`] when the target has lower rank or a
/// non-1 source dimension differs from its target dimension.
pub fn broadcast_to<T: Element>(src: &NdArray<T>, target: &[usize]) -> Result<NdArray<T>> {
    validate_shape(target)?;
    let shape = src.shape();
    let incompatible = || ArrayError::IncompatibleShapes(shape.to_vec(), target.to_vec());
    if target.len() < shape.len() {
        return Err(incompatible());
    }
    let pad = target.len() - shape.len();
    let mut strides = vec![0usize; target.len()];
    for (i, (&d, &s)) in shape.iter().zip(src.strides()).enumerate() {
        let t = target[pad + i];
        if d == t {
            strides[pad + i] = s;
        } else if d != 1 {
            return Err(incompatible());
        }
    }
    Ok(src.view_with(target.to_vec(), strides, src.offset()))
}

/// Broadcast both operands to their common shape.
pub fn broadcast_pair<A: Element, B: Element>(
    a: &NdArray<A>,
    b: &NdArray<B>,
) -> Result<(NdArray<A>, NdArray<B>)> {
    let shape = broadcast_shapes(a.shape(), b.shape())?;
    Ok((broadcast_to(a, &shape)?, broadcast_to(b, &shape)?))
}

impl<T: Element> NdArray<T> {
    /// Method form of [`broadcast_to`].
    pub fn broadcast_to(&self, target: &[usize]) -> Result<NdArray<T>> {
        broadcast_to(self, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_shapes_rules() {
        assert_eq!(broadcast_shapes(&[2, 3], &[2, 3]).unwrap(), vec![2, 3]);
        assert_eq!(broadcast_shapes(&[2, 3], &[3]).unwrap(), vec![2, 3]);
        assert_eq!(broadcast_shapes(&[2, 1], &[1, 4]).unwrap(), vec![2, 4]);
        assert_eq!(broadcast_shapes(&[1], &[5, 2]).unwrap(), vec![5, 2]);
        assert_eq!(
            broadcast_shapes(&[2, 3], &[3, 2]).unwrap_err(),
            ArrayError::IncompatibleShapes(vec![2, 3], vec![3, 2])
        );
        assert!(can_broadcast(&[8, 1, 6, 1], &[7, 1, 5]));
        assert!(!can_broadcast(&[3], &[4]));
    }

    #[test]
    fn test_broadcast_shapes3() {
        assert_eq!(
            broadcast_shapes3(&[3, 1], &[1, 4], &[4]).unwrap(),
            vec![3, 4]
        );
        assert!(broadcast_shapes3(&[3, 1], &[1, 4], &[5]).is_err());
    }

    #[test]
    fn test_broadcast_to_row() {
        let row = NdArray::from_vec(&[3], vec![1, 2, 3]).unwrap();
        let b = broadcast_to(&row, &[2, 3]).unwrap();
        assert_eq!(b.strides(), &[0, 1]);
        assert!(b.shares_buffer(&row));
        assert_eq!(b.to_vec(), vec![1, 2, 3, 1, 2, 3]);
    }

    #[test]
    fn test_broadcast_to_column() {
        let col = NdArray::from_vec(&[2, 1], vec![10, 20]).unwrap();
        let b = col.broadcast_to(&[2, 3]).unwrap();
        assert_eq!(b.strides(), &[1, 0]);
        assert_eq!(b.to_vec(), vec![10, 10, 10, 20, 20, 20]);
    }

    #[test]
    fn test_broadcast_to_maps_to_clamped_source_index() {
        let src = NdArray::from_fn(&[3, 1], |i| i[0] as i32).unwrap();
        let target = [2, 3, 4];
        let b = broadcast_to(&src, &target).unwrap();
        for i in 0..2 {
            for j in 0..3 {
                for k in 0..4 {
                    let expected = src.get(&[j.min(2), k.min(0)]).unwrap();
                    assert_eq!(b.get(&[i, j, k]).unwrap(), expected);
                }
            }
        }
    }

    #[test]
    fn test_broadcast_to_same_shape_is_identity() {
        let a = NdArray::from_vec(&[2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let b = broadcast_to(&a, &[2, 2]).unwrap();
        assert_eq!(b.strides(), a.strides());
        assert_eq!(b, a);
    }

    #[test]
    fn test_broadcast_to_rejects() {
        let a = NdArray::from_vec(&[2, 3], vec![0; 6]).unwrap();
        assert!(matches!(
            broadcast_to(&a, &[3]),
            Err(ArrayError::IncompatibleShapes(_, _))
        ));
        assert!(matches!(
            broadcast_to(&a, &[4, 3]),
            Err(ArrayError::IncompatibleShapes(_, _))
        ));
        assert!(matches!(
            broadcast_to(&a, &[0, 3]),
            Err(ArrayError::InvalidShape(_))
        ));
    }

    #[test]
    fn test_writes_to_source_show_in_broadcast_view() {
        let mut row = NdArray::from_vec(&[2], vec![1, 2]).unwrap();
        let b = broadcast_to(&row, &[3, 2]).unwrap();
        row.set(&[1], 9).unwrap();
        assert_eq!(b.to_vec(), vec![1, 9, 1, 9, 1, 9]);
    }

    #[test]
    fn test_broadcast_pair_mixed_types() {
        let a = NdArray::from_vec(&[2, 1], vec![1.0, 2.0]).unwrap();
        let m = NdArray::from_vec(&[3], vec![true, false, true]).unwrap();
        let (ab, mb) = broadcast_pair(&a, &m).unwrap();
        assert_eq!(ab.shape(), &[2, 3]);
        assert_eq!(mb.shape(), &[2, 3]);
        assert_eq!(mb.to_vec(), vec![true, false, true, true, false, true]);
    }
}
