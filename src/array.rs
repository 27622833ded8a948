//! The [`NdArray`] container: a strided descriptor over a shared buffer.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::ops::Range;
use std::rc::Rc;

use log::debug;
use num_traits::{One, Zero};

use crate::kernel::{collect_indexed, Layout};
use crate::scalar::Element;
use crate::shape::{check_index, compute_strides, increment_index, validate_shape};
use crate::{ArrayError, Result};

/// Dynamic-rank strided array.
///
/// An `NdArray` is a `(shape, strides, offset)` descriptor over a
/// reference-counted element buffer. Views derived from it (reshape, permute,
/// axis insertion/removal, [`index_axis`](Self::index_axis), broadcasting)
/// share that buffer, so a write through one view is observed through every
/// other. The buffer is freed when the last view is dropped.
///
/// `Clone` is shallow: it yields another view of the same buffer. Use
/// [`to_contiguous`](Self::to_contiguous) for an independent copy.
///
/// Arrays are never rank 0 and never empty.
pub struct NdArray<T> {
    buffer: Rc<RefCell<Vec<T>>>,
    dims: Rc<[usize]>,
    strides: Rc<[usize]>,
    offset: usize,
}

impl<T> Clone for NdArray<T> {
    fn clone(&self) -> Self {
        Self {
            buffer: Rc::clone(&self.buffer),
            dims: Rc::clone(&self.dims),
            strides: Rc::clone(&self.strides),
            offset: self.offset,
        }
    }
}

// ============================================================================
// Construction
// ============================================================================

impl<T: Element> NdArray<T> {
    /// Allocate an array filled with `T::default()`.
    pub fn new(shape: &[usize]) -> Result<Self> {
        Self::full(shape, T::default())
    }

    /// Allocate an array filled with `value`.
    pub fn full(shape: &[usize], value: T) -> Result<Self> {
        let len = validate_shape(shape)?;
        Ok(Self::from_contiguous(shape, vec![value; len]))
    }

    /// Allocate an array whose element at each multi-index is `f(index)`.
    pub fn from_fn<F>(shape: &[usize], mut f: F) -> Result<Self>
    where
        F: FnMut(&[usize]) -> T,
    {
        let len = validate_shape(shape)?;
        let mut data = Vec::with_capacity(len);
        let mut index = vec![0usize; shape.len()];
        loop {
            data.push(f(&index));
            if !increment_index(&mut index, shape) {
                break;
            }
        }
        Ok(Self::from_contiguous(shape, data))
    }

    /// Wrap `data` as a row-major array of the given shape.
    ///
    /// # Errors
    /// [`ArrayError::InvalidShape`] for an empty or zero-sized shape,
    /// [`ArrayError::SizeMismatch`] when `data.len()` differs from the shape's
    /// element count.
    pub fn from_vec(shape: &[usize], data: Vec<T>) -> Result<Self> {
        let expected = validate_shape(shape)?;
        if data.len() != expected {
            return Err(ArrayError::SizeMismatch {
                expected,
                got: data.len(),
            });
        }
        Ok(Self::from_contiguous(shape, data))
    }

    /// Wrap `data` without validating the shape.
    pub(crate) fn from_contiguous(shape: &[usize], data: Vec<T>) -> Self {
        Self {
            buffer: Rc::new(RefCell::new(data)),
            dims: Rc::from(shape),
            strides: Rc::from(compute_strides(shape)),
            offset: 0,
        }
    }

    /// Another descriptor over the same buffer.
    pub(crate) fn view_with(&self, dims: Vec<usize>, strides: Vec<usize>, offset: usize) -> Self {
        Self {
            buffer: Rc::clone(&self.buffer),
            dims: Rc::from(dims),
            strides: Rc::from(strides),
            offset,
        }
    }
}

impl<T: Element + Zero> NdArray<T> {
    /// Allocate an array of zeros.
    pub fn zeros(shape: &[usize]) -> Result<Self> {
        Self::full(shape, T::zero())
    }
}

impl<T: Element + One> NdArray<T> {
    /// Allocate an array of ones.
    pub fn ones(shape: &[usize]) -> Result<Self> {
        Self::full(shape, T::one())
    }
}

// ============================================================================
// Metadata
// ============================================================================

impl<T> NdArray<T> {
    /// Dimensions.
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.dims
    }

    /// Per-axis element strides.
    #[inline]
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Offset of element `[0, ..., 0]` in the buffer.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Rank.
    #[inline]
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// Number of logical elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.dims.iter().product()
    }

    /// Always `false` for a constructed array; present for API symmetry.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the view addresses its elements in row-major order with no gaps.
    pub fn is_contiguous(&self) -> bool {
        crate::kernel::is_contiguous(&self.dims, &self.strides)
    }

    /// Whether both arrays are views of the same buffer.
    pub fn shares_buffer(&self, other: &NdArray<T>) -> bool {
        Rc::ptr_eq(&self.buffer, &other.buffer)
    }

    #[inline]
    pub(crate) fn layout(&self) -> Layout<'_> {
        Layout::new(&self.dims, &self.strides, self.offset)
    }

    /// Borrow the whole backing buffer.
    ///
    /// The slice spans every element of the shared allocation, not only those
    /// addressed by this view; combine with [`strides`](Self::strides) and
    /// [`offset`](Self::offset) to locate view elements.
    ///
    /// # Panics
    /// If a [`data_mut`](Self::data_mut) guard on an alias of this buffer is alive.
    pub fn data(&self) -> Ref<'_, [T]> {
        Ref::map(self.buffer.borrow(), |v| v.as_slice())
    }

    /// Mutably borrow the whole backing buffer.
    ///
    /// # Panics
    /// If any other guard on the same buffer is alive.
    pub fn data_mut(&mut self) -> RefMut<'_, [T]> {
        RefMut::map(self.buffer.borrow_mut(), |v| v.as_mut_slice())
    }
}

// ============================================================================
// Element access
// ============================================================================

impl<T: Element> NdArray<T> {
    /// Read the element at a multi-index.
    ///
    /// # Errors
    /// [`ArrayError::RankMismatch`] when `index.len() != ndim()`,
    /// [`ArrayError::IndexOutOfRange`] when an index exceeds its dimension.
    pub fn get(&self, index: &[usize]) -> Result<T> {
        check_index(index, &self.dims)?;
        let pos = self.layout().at_index(index);
        Ok(self.buffer.borrow()[pos])
    }

    /// Write the element at a multi-index. Visible through every alias.
    pub fn set(&mut self, index: &[usize], value: T) -> Result<()> {
        check_index(index, &self.dims)?;
        let pos = self.layout().at_index(index);
        self.buffer.borrow_mut()[pos] = value;
        Ok(())
    }

    /// Replace the element at `index` with `f(old)`.
    ///
    /// The buffer is not borrowed while `f` runs, so `f` may read through
    /// aliases of this array.
    pub fn update<F>(&mut self, index: &[usize], f: F) -> Result<()>
    where
        F: FnOnce(T) -> T,
    {
        check_index(index, &self.dims)?;
        let pos = self.layout().at_index(index);
        let old = self.buffer.borrow()[pos];
        let new = f(old);
        self.buffer.borrow_mut()[pos] = new;
        Ok(())
    }

    /// Read the `i`-th element in row-major logical order.
    pub fn get_flat(&self, i: usize) -> Result<T> {
        let len = self.len();
        if i >= len {
            return Err(ArrayError::IndexOutOfRange {
                axis: 0,
                index: i,
                dim: len,
            });
        }
        let pos = self.layout().at(i);
        Ok(self.buffer.borrow()[pos])
    }

    /// Write the `i`-th element in row-major logical order.
    pub fn set_flat(&mut self, i: usize, value: T) -> Result<()> {
        let len = self.len();
        if i >= len {
            return Err(ArrayError::IndexOutOfRange {
                axis: 0,
                index: i,
                dim: len,
            });
        }
        let pos = self.layout().at(i);
        self.buffer.borrow_mut()[pos] = value;
        Ok(())
    }

    /// Set every element addressed by this view to `value`.
    pub fn fill(&mut self, value: T) {
        let len = self.len();
        let layout = Layout::new(&self.dims, &self.strides, self.offset);
        let mut buf = self.buffer.borrow_mut();
        for i in 0..len {
            buf[layout.at(i)] = value;
        }
    }

    /// Copy `other` into this view, broadcasting it to this view's shape.
    ///
    /// `other` may alias this array; its values are gathered before writing.
    pub fn assign(&mut self, other: &NdArray<T>) -> Result<()> {
        let values = other.broadcast_to(&self.dims)?.to_vec();
        let layout = Layout::new(&self.dims, &self.strides, self.offset);
        let mut buf = self.buffer.borrow_mut();
        for (i, v) in values.into_iter().enumerate() {
            buf[layout.at(i)] = v;
        }
        Ok(())
    }

    /// Iterate elements in row-major logical order.
    pub fn iter(&self) -> Iter<T> {
        Iter {
            buffer: Rc::clone(&self.buffer),
            dims: Rc::clone(&self.dims),
            strides: Rc::clone(&self.strides),
            offset: self.offset,
            indices: vec![0; self.dims.len()],
            remaining: self.len(),
        }
    }

    /// Elements in row-major logical order.
    pub fn to_vec(&self) -> Vec<T> {
        let data = self.data();
        let src: &[T] = &data;
        let layout = self.layout();
        collect_indexed(self.len(), |i| src[layout.at(i)])
    }

    /// Deep copy into a fresh row-major buffer.
    pub fn to_contiguous(&self) -> Self {
        Self::from_contiguous(&self.dims, self.to_vec())
    }
}

// ============================================================================
// Views
// ============================================================================

impl<T: Element> NdArray<T> {
    /// Reinterpret the elements under a new shape.
    ///
    /// A row-major contiguous array is reshaped as a view over the same buffer.
    /// Any other view (permuted, broadcast) is first copied into a fresh
    /// contiguous buffer.
    ///
    /// # Errors
    /// [`ArrayError::InvalidShape`] for an invalid target shape,
    /// [`ArrayError::SizeMismatch`] when the element counts differ.
    pub fn reshape(&self, new_shape: &[usize]) -> Result<Self> {
        let new_len = validate_shape(new_shape)?;
        let len = self.len();
        if new_len != len {
            return Err(ArrayError::SizeMismatch {
                expected: len,
                got: new_len,
            });
        }
        if self.is_contiguous() {
            return Ok(self.view_with(
                new_shape.to_vec(),
                compute_strides(new_shape),
                self.offset,
            ));
        }
        debug!(
            "reshape {:?} -> {:?}: strides {:?} not contiguous, copying",
            self.dims, new_shape, self.strides
        );
        Ok(Self::from_contiguous(new_shape, self.to_vec()))
    }

    /// Reshape to one dimension.
    pub fn flatten(&self) -> Self {
        let len = self.len();
        if self.is_contiguous() {
            return self.view_with(vec![len], vec![1], self.offset);
        }
        Self::from_contiguous(&[len], self.to_vec())
    }

    /// Reorder axes: axis `i` of the result is axis `perm[i]` of `self`.
    ///
    /// No data moves; only the shape and strides are permuted.
    ///
    /// # Errors
    /// [`ArrayError::InvalidPermutation`] unless `perm` is a bijection on `0..ndim()`.
    pub fn permute(&self, perm: &[usize]) -> Result<Self> {
        let rank = self.ndim();
        let invalid = || ArrayError::InvalidPermutation {
            perm: perm.to_vec(),
            rank,
        };
        if perm.len() != rank {
            return Err(invalid());
        }
        let mut seen = vec![false; rank];
        for &p in perm {
            if p >= rank || seen[p] {
                return Err(invalid());
            }
            seen[p] = true;
        }
        let dims = perm.iter().map(|&p| self.dims[p]).collect();
        let strides = perm.iter().map(|&p| self.strides[p]).collect();
        Ok(self.view_with(dims, strides, self.offset))
    }

    /// Reverse all axes (matrix transpose for rank 2).
    pub fn t(&self) -> Self {
        let dims = self.dims.iter().rev().copied().collect();
        let strides = self.strides.iter().rev().copied().collect();
        self.view_with(dims, strides, self.offset)
    }

    /// Insert a size-1 axis at position `axis` (`0..=ndim()`).
    pub fn expand_dims(&self, axis: usize) -> Result<Self> {
        let rank = self.ndim();
        if axis > rank {
            return Err(ArrayError::InvalidAxis { axis, rank });
        }
        let mut dims = self.dims.to_vec();
        let mut strides = self.strides.to_vec();
        let stride = strides.get(axis).map_or(1, |&s| s * dims[axis]);
        dims.insert(axis, 1);
        strides.insert(axis, stride);
        Ok(self.view_with(dims, strides, self.offset))
    }

    /// Remove every size-1 axis.
    ///
    /// # Errors
    /// [`ArrayError::UnsupportedOperation`] when every axis has size 1, since
    /// the result would be rank 0.
    pub fn squeeze(&self) -> Result<Self> {
        let (dims, strides): (Vec<usize>, Vec<usize>) = self
            .dims
            .iter()
            .zip(self.strides.iter())
            .filter(|&(&d, _)| d != 1)
            .map(|(&d, &s)| (d, s))
            .unzip();
        if dims.is_empty() {
            return Err(ArrayError::UnsupportedOperation(
                "squeeze would produce a rank-0 array",
            ));
        }
        Ok(self.view_with(dims, strides, self.offset))
    }

    /// Remove the size-1 axis `axis`.
    pub fn squeeze_axis(&self, axis: usize) -> Result<Self> {
        let rank = self.ndim();
        if axis >= rank {
            return Err(ArrayError::InvalidAxis { axis, rank });
        }
        if self.dims[axis] != 1 {
            return Err(ArrayError::InvalidArgument(format!(
                "cannot squeeze axis {axis} of size {}",
                self.dims[axis]
            )));
        }
        if rank == 1 {
            return Err(ArrayError::UnsupportedOperation(
                "squeeze would produce a rank-0 array",
            ));
        }
        let mut dims = self.dims.to_vec();
        let mut strides = self.strides.to_vec();
        dims.remove(axis);
        strides.remove(axis);
        Ok(self.view_with(dims, strides, self.offset))
    }

    /// View of the sub-array at position `index` along `axis`; the axis is removed.
    ///
    /// For a matrix, `index_axis(0, i)` is row `i` and `index_axis(1, j)` is column `j`.
    pub fn index_axis(&self, axis: usize, index: usize) -> Result<Self> {
        let rank = self.ndim();
        if axis >= rank {
            return Err(ArrayError::InvalidAxis { axis, rank });
        }
        if index >= self.dims[axis] {
            return Err(ArrayError::IndexOutOfRange {
                axis,
                index,
                dim: self.dims[axis],
            });
        }
        if rank == 1 {
            return Err(ArrayError::UnsupportedOperation(
                "indexing the only axis would produce a rank-0 array",
            ));
        }
        let offset = self.offset + index * self.strides[axis];
        let mut dims = self.dims.to_vec();
        let mut strides = self.strides.to_vec();
        dims.remove(axis);
        strides.remove(axis);
        Ok(self.view_with(dims, strides, offset))
    }

    /// Gather the positions `indices` along `axis` into a new array.
    ///
    /// The result has the shape of `self` with `dims[axis]` replaced by
    /// `indices.len()`. Indices may repeat and come in any order.
    ///
    /// # Errors
    /// [`ArrayError::InvalidAxis`] for `axis >= ndim()`,
    /// [`ArrayError::IndexOutOfRange`] for an index past the axis,
    /// [`ArrayError::InvalidShape`] when `indices` is empty.
    pub fn take(&self, axis: usize, indices: &[usize]) -> Result<Self> {
        let rank = self.ndim();
        if axis >= rank {
            return Err(ArrayError::InvalidAxis { axis, rank });
        }
        let dim = self.dims[axis];
        if let Some(&index) = indices.iter().find(|&&i| i >= dim) {
            return Err(ArrayError::IndexOutOfRange { axis, index, dim });
        }
        let mut dims = self.dims.to_vec();
        dims[axis] = indices.len();
        let layout = self.layout();
        let buf = self.buffer.borrow();
        let mut source = vec![0usize; rank];
        Self::from_fn(&dims, |idx| {
            source.copy_from_slice(idx);
            source[axis] = indices[idx[axis]];
            buf[layout.at_index(&source)]
        })
    }

    /// Copy the region `ranges[0] x ranges[1] x ...` into a new array.
    ///
    /// # Errors
    /// [`ArrayError::RankMismatch`] unless there is one range per axis,
    /// [`ArrayError::IndexOutOfRange`] when `start > stop` or `stop > dim`,
    /// [`ArrayError::InvalidShape`] for an empty range.
    pub fn slice(&self, ranges: &[Range<usize>]) -> Result<Self> {
        let rank = self.ndim();
        if ranges.len() != rank {
            return Err(ArrayError::RankMismatch {
                expected: rank,
                got: ranges.len(),
            });
        }
        let mut offset = self.offset;
        let mut dims = Vec::with_capacity(rank);
        for (axis, r) in ranges.iter().enumerate() {
            let dim = self.dims[axis];
            if r.end > dim {
                return Err(ArrayError::IndexOutOfRange {
                    axis,
                    index: r.end,
                    dim,
                });
            }
            if r.start > r.end {
                return Err(ArrayError::IndexOutOfRange {
                    axis,
                    index: r.start,
                    dim: r.end,
                });
            }
            offset += r.start * self.strides[axis];
            dims.push(r.end - r.start);
        }
        validate_shape(&dims)?;
        let region = self.view_with(dims, self.strides.to_vec(), offset);
        Ok(region.to_contiguous())
    }
}

// ============================================================================
// Iteration
// ============================================================================

/// Row-major iterator over the logical elements of an [`NdArray`].
///
/// Holds its own handle on the buffer and borrows it one element at a time,
/// so writes through aliases between steps are observed.
pub struct Iter<T> {
    buffer: Rc<RefCell<Vec<T>>>,
    dims: Rc<[usize]>,
    strides: Rc<[usize]>,
    offset: usize,
    indices: Vec<usize>,
    remaining: usize,
}

impl<T: Copy> Iterator for Iter<T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        if self.remaining == 0 {
            return None;
        }
        let pos = self
            .indices
            .iter()
            .zip(self.strides.iter())
            .fold(self.offset, |pos, (&i, &s)| pos + i * s);
        let value = self.buffer.borrow()[pos];
        increment_index(&mut self.indices, &self.dims);
        self.remaining -= 1;
        Some(value)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T: Copy> ExactSizeIterator for Iter<T> {}

impl<T: Element> IntoIterator for &NdArray<T> {
    type Item = T;
    type IntoIter = Iter<T>;

    fn into_iter(self) -> Iter<T> {
        self.iter()
    }
}

// ============================================================================
// Trait impls
// ============================================================================

impl<T: Element> PartialEq for NdArray<T> {
    /// Same shape and same elements in logical order; layout is ignored.
    fn eq(&self, other: &Self) -> bool {
        self.dims == other.dims && self.iter().eq(other.iter())
    }
}

impl<T: Element> fmt::Debug for NdArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NdArray")
            .field("shape", &self.dims)
            .field("strides", &self.strides)
            .field("offset", &self.offset)
            .field("elements", &self.to_vec())
            .finish()
    }
}

impl<T: Element + fmt::Display> fmt::Display for NdArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.data();
        write_nested(f, &data, &self.dims, &self.strides, self.offset, 0)
    }
}

fn write_nested<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    data: &[T],
    dims: &[usize],
    strides: &[usize],
    pos: usize,
    depth: usize,
) -> fmt::Result {
    let innermost = dims.len() == 1;
    write!(f, "[")?;
    for i in 0..dims[0] {
        if i > 0 {
            if innermost {
                write!(f, ", ")?;
            } else {
                write!(f, ",\n{:width$}", "", width = depth + 1)?;
            }
        }
        let p = pos + i * strides[0];
        if innermost {
            write!(f, "{}", data[p])?;
        } else {
            write_nested(f, data, &dims[1..], &strides[1..], p, depth + 1)?;
        }
    }
    write!(f, "]")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arange23() -> NdArray<f64> {
        NdArray::from_vec(&[2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap()
    }

    #[test]
    fn test_construction_validates_shape() {
        assert!(matches!(
            NdArray::<f64>::new(&[]),
            Err(ArrayError::InvalidShape(_))
        ));
        assert!(matches!(
            NdArray::<f64>::zeros(&[3, 0]),
            Err(ArrayError::InvalidShape(_))
        ));
        assert_eq!(
            NdArray::from_vec(&[2, 2], vec![1, 2, 3]).unwrap_err(),
            ArrayError::SizeMismatch {
                expected: 4,
                got: 3
            }
        );
    }

    #[test]
    fn test_fill_constructors() {
        let z = NdArray::<f64>::zeros(&[2, 2]).unwrap();
        assert!(z.iter().all(|x| x == 0.0));
        let o = NdArray::<i32>::ones(&[3]).unwrap();
        assert_eq!(o.to_vec(), vec![1, 1, 1]);
        let f = NdArray::full(&[2], 7u8).unwrap();
        assert_eq!(f.to_vec(), vec![7, 7]);
        let g = NdArray::from_fn(&[2, 3], |idx| (idx[0] * 10 + idx[1]) as i64).unwrap();
        assert_eq!(g.to_vec(), vec![0, 1, 2, 10, 11, 12]);
    }

    #[test]
    fn test_get_set_checks() {
        let mut a = arange23();
        assert_eq!(a.get(&[1, 2]).unwrap(), 6.0);
        a.set(&[0, 1], 20.0).unwrap();
        assert_eq!(a.get(&[0, 1]).unwrap(), 20.0);
        assert!(matches!(
            a.get(&[0]),
            Err(ArrayError::RankMismatch { expected: 2, got: 1 })
        ));
        assert!(matches!(
            a.get(&[2, 0]),
            Err(ArrayError::IndexOutOfRange { axis: 0, index: 2, dim: 2 })
        ));
        a.update(&[1, 1], |x| x * 2.0).unwrap();
        assert_eq!(a.get(&[1, 1]).unwrap(), 10.0);
    }

    #[test]
    fn test_reshape_shares_buffer() {
        let a = arange23();
        let mut r = a.reshape(&[3, 2]).unwrap();
        assert!(r.shares_buffer(&a));
        assert_eq!(r.get(&[2, 1]).unwrap(), 6.0);
        r.set(&[0, 0], 100.0).unwrap();
        assert_eq!(a.get(&[0, 0]).unwrap(), 100.0);
        assert!(matches!(
            a.reshape(&[4]),
            Err(ArrayError::SizeMismatch { expected: 6, got: 4 })
        ));
    }

    #[test]
    fn test_reshape_of_permuted_view_copies() {
        let a = arange23();
        let t = a.t();
        let r = t.reshape(&[6]).unwrap();
        assert!(!r.shares_buffer(&a));
        assert_eq!(r.to_vec(), vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    fn test_permute_roundtrip() {
        let a = NdArray::from_fn(&[2, 3, 4], |i| (i[0] * 100 + i[1] * 10 + i[2]) as i32).unwrap();
        let p = [2, 0, 1];
        let inv = [1, 2, 0];
        let v = a.permute(&p).unwrap();
        assert_eq!(v.shape(), &[4, 2, 3]);
        assert_eq!(v.get(&[3, 1, 2]).unwrap(), a.get(&[1, 2, 3]).unwrap());
        assert_eq!(v.permute(&inv).unwrap(), a);
        assert!(matches!(
            a.permute(&[0, 0, 1]),
            Err(ArrayError::InvalidPermutation { .. })
        ));
        assert!(matches!(
            a.permute(&[0, 1]),
            Err(ArrayError::InvalidPermutation { .. })
        ));
    }

    #[test]
    fn test_transpose_view() {
        let a = arange23();
        let t = a.t();
        assert_eq!(t.shape(), &[3, 2]);
        assert_eq!(t.strides(), &[1, 3]);
        assert!(t.shares_buffer(&a));
        assert!(!t.is_contiguous());
        assert_eq!(t.to_vec(), vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    fn test_expand_and_squeeze() {
        let a = arange23();
        let e = a.expand_dims(1).unwrap();
        assert_eq!(e.shape(), &[2, 1, 3]);
        assert_eq!(e.get(&[1, 0, 2]).unwrap(), 6.0);
        let e2 = a.expand_dims(2).unwrap();
        assert_eq!(e2.shape(), &[2, 3, 1]);
        assert!(matches!(
            a.expand_dims(3),
            Err(ArrayError::InvalidAxis { axis: 3, rank: 2 })
        ));

        assert_eq!(e.squeeze().unwrap(), a);
        assert_eq!(e.squeeze_axis(1).unwrap().shape(), &[2, 3]);
        assert!(matches!(
            e.squeeze_axis(0),
            Err(ArrayError::InvalidArgument(_))
        ));

        let one = NdArray::from_vec(&[1, 1], vec![5.0]).unwrap();
        assert!(matches!(
            one.squeeze(),
            Err(ArrayError::UnsupportedOperation(_))
        ));
        let single = NdArray::from_vec(&[1], vec![5.0]).unwrap();
        assert!(matches!(
            single.squeeze_axis(0),
            Err(ArrayError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn test_index_axis_rows_and_columns() {
        let a = arange23();
        let row = a.index_axis(0, 1).unwrap();
        assert_eq!(row.to_vec(), vec![4.0, 5.0, 6.0]);
        let mut col = a.index_axis(1, 2).unwrap();
        assert_eq!(col.to_vec(), vec![3.0, 6.0]);
        col.set(&[1], -1.0).unwrap();
        assert_eq!(a.get(&[1, 2]).unwrap(), -1.0);
        assert!(matches!(
            row.index_axis(0, 0),
            Err(ArrayError::UnsupportedOperation(_))
        ));
    }

    #[test]
    fn test_take_gathers_along_axis() {
        let a = arange23();
        let rows = a.take(0, &[1, 0, 1]).unwrap();
        assert_eq!(rows.shape(), &[3, 3]);
        assert_eq!(
            rows.to_vec(),
            vec![4.0, 5.0, 6.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]
        );
        let cols = a.take(1, &[2, 0]).unwrap();
        assert_eq!(cols.shape(), &[2, 2]);
        assert_eq!(cols.to_vec(), vec![3.0, 1.0, 6.0, 4.0]);
        assert!(!cols.shares_buffer(&a));
    }

    #[test]
    fn test_take_on_transposed_view() {
        let t = arange23().t();
        let picked = t.take(0, &[2]).unwrap();
        assert_eq!(picked.shape(), &[1, 2]);
        assert_eq!(picked.to_vec(), vec![3.0, 6.0]);
    }

    #[test]
    fn test_take_errors() {
        let a = arange23();
        assert_eq!(
            a.take(2, &[0]).unwrap_err(),
            ArrayError::InvalidAxis { axis: 2, rank: 2 }
        );
        assert_eq!(
            a.take(1, &[0, 3]).unwrap_err(),
            ArrayError::IndexOutOfRange {
                axis: 1,
                index: 3,
                dim: 3
            }
        );
        assert!(matches!(a.take(0, &[]), Err(ArrayError::InvalidShape(_))));
    }

    #[test]
    fn test_update_reads_through_alias() {
        let mut a = NdArray::from_vec(&[2], vec![1.0, 10.0]).unwrap();
        let view = a.reshape(&[2]).unwrap();
        assert!(view.shares_buffer(&a));
        a.update(&[0], |x| x + view.get(&[1]).unwrap()).unwrap();
        assert_eq!(a.to_vec(), vec![11.0, 10.0]);
        assert_eq!(view.get(&[0]).unwrap(), 11.0);
    }

    #[test]
    fn test_slice_copies_region() {
        let a = NdArray::from_fn(&[3, 4], |i| (i[0] * 4 + i[1]) as i32).unwrap();
        let s = a.slice(&[1..3, 1..3]).unwrap();
        assert_eq!(s.shape(), &[2, 2]);
        assert_eq!(s.to_vec(), vec![5, 6, 9, 10]);
        assert!(!s.shares_buffer(&a));

        assert!(matches!(
            a.slice(&[0..4, 0..1]),
            Err(ArrayError::IndexOutOfRange { axis: 0, index: 4, dim: 3 })
        ));
        assert!(matches!(
            a.slice(&[2..2, 0..1]),
            Err(ArrayError::InvalidShape(_))
        ));
        assert!(matches!(
            a.slice(&[0..1]),
            Err(ArrayError::RankMismatch { .. })
        ));
    }

    #[test]
    fn test_fill_and_assign_through_view() {
        let mut a = NdArray::<f64>::zeros(&[2, 3]).unwrap();
        let mut row = a.index_axis(0, 0).unwrap();
        row.fill(1.5);
        assert_eq!(a.to_vec(), vec![1.5, 1.5, 1.5, 0.0, 0.0, 0.0]);

        let src = NdArray::from_vec(&[3], vec![7.0, 8.0, 9.0]).unwrap();
        a.assign(&src).unwrap();
        assert_eq!(a.to_vec(), vec![7.0, 8.0, 9.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_assign_from_alias() {
        let mut a = arange23();
        let t = a.reshape(&[2, 3]).unwrap();
        let swapped = t.index_axis(0, 1).unwrap();
        a.assign(&swapped).unwrap();
        assert_eq!(a.to_vec(), vec![4.0, 5.0, 6.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_flat_access() {
        let mut a = arange23().t();
        assert_eq!(a.get_flat(1).unwrap(), 4.0);
        a.set_flat(1, 40.0).unwrap();
        assert_eq!(a.get(&[0, 1]).unwrap(), 40.0);
        assert!(a.get_flat(6).is_err());
        let flat = a.flatten();
        assert_eq!(flat.shape(), &[6]);
        assert_eq!(flat.get_flat(1).unwrap(), 40.0);
    }

    #[test]
    fn test_iterator_is_exact() {
        let a = arange23().t();
        let mut it = a.iter();
        assert_eq!(it.len(), 6);
        it.next();
        assert_eq!(it.len(), 5);
        let collected: Vec<f64> = (&a).into_iter().collect();
        assert_eq!(collected, a.to_vec());
    }

    #[test]
    fn test_equality_ignores_layout() {
        let a = arange23();
        let b = a.t().to_contiguous().t();
        assert!(!b.is_contiguous());
        assert_eq!(a, b);
        assert_ne!(a, a.reshape(&[3, 2]).unwrap());
    }

    #[test]
    fn test_data_access() {
        let mut a = NdArray::from_vec(&[2, 2], vec![1, 2, 3, 4]).unwrap();
        assert_eq!(&*a.data(), &[1, 2, 3, 4]);
        a.data_mut()[3] = 40;
        assert_eq!(a.get(&[1, 1]).unwrap(), 40);
    }

    #[test]
    fn test_display() {
        let a = NdArray::from_vec(&[2, 2], vec![1, 2, 3, 4]).unwrap();
        assert_eq!(format!("{a}"), "[[1, 2],\n [3, 4]]");
        let v = NdArray::from_vec(&[3], vec![1, 2, 3]).unwrap();
        assert_eq!(format!("{v}"), "[1, 2, 3]");
    }
}
