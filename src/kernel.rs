//! Traversal engine shared by the elementwise, reduction and linalg layers.
//!
//! Every operation walks its output in row-major logical order and maps each
//! logical position to a buffer offset per operand through a [`Layout`].
//! Output elements are independent, so with the `parallel` feature the
//! per-element closure is handed to rayon once the output is large enough.

use crate::maybe_sync::{MaybeSend, MaybeSendSync};
use crate::Result;

/// Borrowed shape/stride/offset triple of one operand.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Layout<'a> {
    pub(crate) dims: &'a [usize],
    pub(crate) strides: &'a [usize],
    pub(crate) offset: usize,
    contiguous: bool,
}

impl<'a> Layout<'a> {
    pub(crate) fn new(dims: &'a [usize], strides: &'a [usize], offset: usize) -> Self {
        Self {
            dims,
            strides,
            offset,
            contiguous: is_contiguous(dims, strides),
        }
    }

    /// Buffer offset of the `flat`-th element in row-major logical order.
    #[inline]
    pub(crate) fn at(&self, flat: usize) -> usize {
        if self.contiguous {
            return self.offset + flat;
        }
        let mut rem = flat;
        let mut pos = self.offset;
        for (&d, &s) in self.dims.iter().zip(self.strides).rev() {
            pos += (rem % d) * s;
            rem /= d;
        }
        pos
    }

    /// Buffer offset of a multi-index (no bounds check).
    #[inline]
    pub(crate) fn at_index(&self, index: &[usize]) -> usize {
        index
            .iter()
            .zip(self.strides)
            .fold(self.offset, |pos, (&i, &s)| pos + i * s)
    }
}

/// Row-major contiguity test. Size-1 axes may carry any stride.
pub(crate) fn is_contiguous(dims: &[usize], strides: &[usize]) -> bool {
    if dims.len() != strides.len() {
        return false;
    }
    let mut expected = 1usize;
    for (&dim, &stride) in dims.iter().rev().zip(strides.iter().rev()) {
        if dim <= 1 {
            continue;
        }
        if stride != expected {
            return false;
        }
        expected = expected.saturating_mul(dim);
    }
    true
}

/// Whether a loop of `len` independent iterations should be split across threads.
#[cfg(feature = "parallel")]
#[inline]
pub(crate) fn use_parallel(len: usize) -> bool {
    len >= crate::MIN_PARALLEL_LEN
}

/// Build `[f(0), f(1), ..., f(len - 1)]`.
pub(crate) fn collect_indexed<U, F>(len: usize, f: F) -> Vec<U>
where
    U: MaybeSend,
    F: Fn(usize) -> U + MaybeSendSync,
{
    #[cfg(feature = "parallel")]
    if use_parallel(len) {
        use rayon::prelude::*;
        return (0..len).into_par_iter().map(f).collect();
    }
    (0..len).map(f).collect()
}

/// Fallible [`collect_indexed`]; the first error in index order is returned.
pub(crate) fn try_collect_indexed<U, F>(len: usize, f: F) -> Result<Vec<U>>
where
    U: MaybeSend,
    F: Fn(usize) -> Result<U> + MaybeSendSync,
{
    #[cfg(feature = "parallel")]
    if use_parallel(len) {
        use rayon::prelude::*;
        return (0..len).into_par_iter().map(f).collect();
    }
    (0..len).map(f).collect()
}
