//! Elementwise operations with broadcasting.
//!
//! Binary and ternary operations broadcast their operands to a common shape
//! (see [`crate::broadcast`]) and always return a fresh row-major array.
//! Partial operations (division, clipping with crossed bounds) go through the
//! fallible `try_*` traversals and report the first offending element.

use std::ops::Neg;

use crate::broadcast::{broadcast_shapes, broadcast_shapes3, broadcast_to};
use crate::kernel::{collect_indexed, try_collect_indexed};
use crate::maybe_sync::MaybeSendSync;
use crate::scalar::{Element, Scalar, Truthy};
use crate::shape::total_size;
use crate::{ArrayError, NdArray, Result};

// ============================================================================
// Generic traversals
// ============================================================================

/// Apply `f` to every element.
pub fn map<T, U, F>(a: &NdArray<T>, f: F) -> NdArray<U>
where
    T: Element,
    U: Element,
    F: Fn(T) -> U + MaybeSendSync,
{
    let data = a.data();
    let src: &[T] = &data;
    let layout = a.layout();
    let out = collect_indexed(a.len(), |i| f(src[layout.at(i)]));
    NdArray::from_contiguous(a.shape(), out)
}

/// Fallible [`map`]; stops at the first error in row-major order.
pub fn try_map<T, U, F>(a: &NdArray<T>, f: F) -> Result<NdArray<U>>
where
    T: Element,
    U: Element,
    F: Fn(T) -> Result<U> + MaybeSendSync,
{
    let data = a.data();
    let src: &[T] = &data;
    let layout = a.layout();
    let out = try_collect_indexed(a.len(), |i| f(src[layout.at(i)]))?;
    Ok(NdArray::from_contiguous(a.shape(), out))
}

/// Combine two arrays elementwise after broadcasting them together.
///
/// # Errors
/// [`ArrayError::IncompatibleShapes`] when the shapes do not broadcast.
pub fn zip_map<A, B, U, F>(a: &NdArray<A>, b: &NdArray<B>, f: F) -> Result<NdArray<U>>
where
    A: Element,
    B: Element,
    U: Element,
    F: Fn(A, B) -> U + MaybeSendSync,
{
    try_zip_map(a, b, |x, y| Ok(f(x, y)))
}

/// Fallible [`zip_map`] for partial operations.
pub fn try_zip_map<A, B, U, F>(a: &NdArray<A>, b: &NdArray<B>, f: F) -> Result<NdArray<U>>
where
    A: Element,
    B: Element,
    U: Element,
    F: Fn(A, B) -> Result<U> + MaybeSendSync,
{
    let shape = broadcast_shapes(a.shape(), b.shape())?;
    let len = total_size(&shape)?;
    let av = broadcast_to(a, &shape)?;
    let bv = broadcast_to(b, &shape)?;
    let (da, db) = (av.data(), bv.data());
    let (sa, sb): (&[A], &[B]) = (&da, &db);
    let (la, lb) = (av.layout(), bv.layout());
    let out = try_collect_indexed(len, |i| f(sa[la.at(i)], sb[lb.at(i)]))?;
    Ok(NdArray::from_contiguous(&shape, out))
}

/// Combine three arrays elementwise after broadcasting them together.
pub fn zip_map3<A, B, C, U, F>(
    a: &NdArray<A>,
    b: &NdArray<B>,
    c: &NdArray<C>,
    f: F,
) -> Result<NdArray<U>>
where
    A: Element,
    B: Element,
    C: Element,
    U: Element,
    F: Fn(A, B, C) -> Result<U> + MaybeSendSync,
{
    let shape = broadcast_shapes3(a.shape(), b.shape(), c.shape())?;
    let len = total_size(&shape)?;
    let av = broadcast_to(a, &shape)?;
    let bv = broadcast_to(b, &shape)?;
    let cv = broadcast_to(c, &shape)?;
    let (da, db, dc) = (av.data(), bv.data(), cv.data());
    let (sa, sb, sc): (&[A], &[B], &[C]) = (&da, &db, &dc);
    let (la, lb, lc) = (av.layout(), bv.layout(), cv.layout());
    let out = try_collect_indexed(len, |i| f(sa[la.at(i)], sb[lb.at(i)], sc[lc.at(i)]))?;
    Ok(NdArray::from_contiguous(&shape, out))
}

// ============================================================================
// Arithmetic
// ============================================================================

fn division_by_zero(op: &'static str) -> ArrayError {
    ArrayError::Domain {
        op,
        detail: "division by zero".to_string(),
    }
}

pub fn add<T: Scalar>(a: &NdArray<T>, b: &NdArray<T>) -> Result<NdArray<T>> {
    zip_map(a, b, |x, y| x + y)
}

pub fn subtract<T: Scalar>(a: &NdArray<T>, b: &NdArray<T>) -> Result<NdArray<T>> {
    zip_map(a, b, |x, y| x - y)
}

pub fn multiply<T: Scalar>(a: &NdArray<T>, b: &NdArray<T>) -> Result<NdArray<T>> {
    zip_map(a, b, |x, y| x * y)
}

/// Elementwise `a / b`.
///
/// # Errors
/// [`ArrayError::Domain`] if any broadcast divisor is zero, including for
/// floating-point elements.
pub fn divide<T: Scalar>(a: &NdArray<T>, b: &NdArray<T>) -> Result<NdArray<T>> {
    try_zip_map(a, b, |x, y| {
        if y.is_zero() {
            Err(division_by_zero("divide"))
        } else {
            Ok(x / y)
        }
    })
}

pub fn add_scalar<T: Scalar>(a: &NdArray<T>, s: T) -> NdArray<T> {
    map(a, move |x| x + s)
}

pub fn subtract_scalar<T: Scalar>(a: &NdArray<T>, s: T) -> NdArray<T> {
    map(a, move |x| x - s)
}

/// `s - a` elementwise.
pub fn scalar_subtract<T: Scalar>(s: T, a: &NdArray<T>) -> NdArray<T> {
    map(a, move |x| s - x)
}

pub fn multiply_scalar<T: Scalar>(a: &NdArray<T>, s: T) -> NdArray<T> {
    map(a, move |x| x * s)
}

pub fn divide_scalar<T: Scalar>(a: &NdArray<T>, s: T) -> Result<NdArray<T>> {
    if s.is_zero() {
        return Err(division_by_zero("divide_scalar"));
    }
    Ok(map(a, move |x| x / s))
}

/// `s / a` elementwise.
pub fn scalar_divide<T: Scalar>(s: T, a: &NdArray<T>) -> Result<NdArray<T>> {
    try_map(a, move |x| {
        if x.is_zero() {
            Err(division_by_zero("scalar_divide"))
        } else {
            Ok(s / x)
        }
    })
}

pub fn negate<T: Scalar + Neg<Output = T>>(a: &NdArray<T>) -> NdArray<T> {
    map(a, |x| -x)
}

// ============================================================================
// Comparison
// ============================================================================

pub fn equal<T: Element>(a: &NdArray<T>, b: &NdArray<T>) -> Result<NdArray<bool>> {
    zip_map(a, b, |x, y| x == y)
}

pub fn not_equal<T: Element>(a: &NdArray<T>, b: &NdArray<T>) -> Result<NdArray<bool>> {
    zip_map(a, b, |x, y| x != y)
}

pub fn less<T: Element + PartialOrd>(a: &NdArray<T>, b: &NdArray<T>) -> Result<NdArray<bool>> {
    zip_map(a, b, |x, y| x < y)
}

pub fn less_equal<T: Element + PartialOrd>(
    a: &NdArray<T>,
    b: &NdArray<T>,
) -> Result<NdArray<bool>> {
    zip_map(a, b, |x, y| x <= y)
}

pub fn greater<T: Element + PartialOrd>(
    a: &NdArray<T>,
    b: &NdArray<T>,
) -> Result<NdArray<bool>> {
    zip_map(a, b, |x, y| x > y)
}

pub fn greater_equal<T: Element + PartialOrd>(
    a: &NdArray<T>,
    b: &NdArray<T>,
) -> Result<NdArray<bool>> {
    zip_map(a, b, |x, y| x >= y)
}

// ============================================================================
// Logical
// ============================================================================

pub fn logical_and<A, B>(a: &NdArray<A>, b: &NdArray<B>) -> Result<NdArray<bool>>
where
    A: Element + Truthy,
    B: Element + Truthy,
{
    zip_map(a, b, |x, y| x.is_truthy() && y.is_truthy())
}

pub fn logical_or<A, B>(a: &NdArray<A>, b: &NdArray<B>) -> Result<NdArray<bool>>
where
    A: Element + Truthy,
    B: Element + Truthy,
{
    zip_map(a, b, |x, y| x.is_truthy() || y.is_truthy())
}

pub fn logical_xor<A, B>(a: &NdArray<A>, b: &NdArray<B>) -> Result<NdArray<bool>>
where
    A: Element + Truthy,
    B: Element + Truthy,
{
    zip_map(a, b, |x, y| x.is_truthy() != y.is_truthy())
}

pub fn logical_not<A: Element + Truthy>(a: &NdArray<A>) -> NdArray<bool> {
    map(a, |x| !x.is_truthy())
}

// ============================================================================
// Selection
// ============================================================================

/// Clamp `a` into `[lo, hi]`, with all three operands broadcast together.
///
/// # Errors
/// [`ArrayError::InvalidArgument`] where a broadcast lower bound exceeds its
/// upper bound.
pub fn clip<T: Scalar>(a: &NdArray<T>, lo: &NdArray<T>, hi: &NdArray<T>) -> Result<NdArray<T>> {
    zip_map3(a, lo, hi, clamp)
}

/// [`clip`] with scalar bounds.
pub fn clip_scalar<T: Scalar>(a: &NdArray<T>, lo: T, hi: T) -> Result<NdArray<T>> {
    if lo > hi {
        return Err(ArrayError::InvalidArgument(format!(
            "clip bounds crossed: min {lo} > max {hi}"
        )));
    }
    try_map(a, move |x| clamp(x, lo, hi))
}

#[inline]
fn clamp<T: Scalar>(x: T, lo: T, hi: T) -> Result<T> {
    if lo > hi {
        return Err(ArrayError::InvalidArgument(format!(
            "clip bounds crossed: min {lo} > max {hi}"
        )));
    }
    Ok(if x < lo {
        lo
    } else if x > hi {
        hi
    } else {
        x
    })
}

/// Pick `x` where `cond` is truthy and `y` elsewhere, broadcasting all three.
pub fn where_cond<C, T>(cond: &NdArray<C>, x: &NdArray<T>, y: &NdArray<T>) -> Result<NdArray<T>>
where
    C: Element + Truthy,
    T: Element,
{
    zip_map3(cond, x, y, |c, a, b| Ok(if c.is_truthy() { a } else { b }))
}
