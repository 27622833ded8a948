//! Unary floating-point functions and interpolation.
//!
//! Functions with a restricted real domain return [`ArrayError::Domain`] for the
//! first element outside it instead of producing `NaN`. A `NaN` input lies
//! outside every restricted domain.

use num_traits::Float;

use crate::ops::{map, try_map, try_zip_map};
use crate::scalar::Element;
use crate::{ArrayError, NdArray, Result};

fn domain<T: Element>(op: &'static str, x: T, requirement: &str) -> ArrayError {
    ArrayError::Domain {
        op,
        detail: format!("{x:?} is outside the domain ({requirement})"),
    }
}

macro_rules! unary_total {
    ($($(#[$doc:meta])* $name:ident => $method:ident;)*) => {
        $(
            $(#[$doc])*
            pub fn $name<T: Float + Element>(a: &NdArray<T>) -> NdArray<T> {
                map(a, |x: T| x.$method())
            }
        )*
    };
}

unary_total! {
    /// Absolute value.
    abs => abs;
    /// Cube root, defined for negative inputs.
    cbrt => cbrt;
    exp => exp;
    /// `e^x - 1`, accurate near zero.
    expm1 => exp_m1;
    sin => sin;
    cos => cos;
    tan => tan;
    atan => atan;
    sinh => sinh;
    cosh => cosh;
    tanh => tanh;
    floor => floor;
    ceil => ceil;
    /// Round half away from zero.
    round => round;
}

/// `-1`, `0` or `1` by sign; `NaN` stays `NaN`.
pub fn sign<T: Float + Element>(a: &NdArray<T>) -> NdArray<T> {
    map(a, |x: T| {
        if x.is_nan() {
            x
        } else if x > T::zero() {
            T::one()
        } else if x < T::zero() {
            -T::one()
        } else {
            T::zero()
        }
    })
}

/// Square root; negative and `NaN` elements are a domain error.
pub fn sqrt<T: Float + Element>(a: &NdArray<T>) -> Result<NdArray<T>> {
    try_map(a, |x: T| {
        if x.is_nan() || x < T::zero() {
            Err(domain("sqrt", x, "x >= 0"))
        } else {
            Ok(x.sqrt())
        }
    })
}

/// Natural logarithm; requires `x > 0`.
pub fn ln<T: Float + Element>(a: &NdArray<T>) -> Result<NdArray<T>> {
    positive_log(a, "ln", T::ln)
}

pub fn log10<T: Float + Element>(a: &NdArray<T>) -> Result<NdArray<T>> {
    positive_log(a, "log10", T::log10)
}

pub fn log2<T: Float + Element>(a: &NdArray<T>) -> Result<NdArray<T>> {
    positive_log(a, "log2", T::log2)
}

fn positive_log<T, F>(a: &NdArray<T>, op: &'static str, f: F) -> Result<NdArray<T>>
where
    T: Float + Element,
    F: Fn(T) -> T + crate::MaybeSendSync,
{
    try_map(a, |x: T| {
        if x.is_nan() || x <= T::zero() {
            Err(domain(op, x, "x > 0"))
        } else {
            Ok(f(x))
        }
    })
}

/// `ln(1 + x)`; requires `x > -1`.
pub fn log1p<T: Float + Element>(a: &NdArray<T>) -> Result<NdArray<T>> {
    try_map(a, |x: T| {
        if x.is_nan() || x <= -T::one() {
            Err(domain("log1p", x, "x > -1"))
        } else {
            Ok(x.ln_1p())
        }
    })
}

pub fn asin<T: Float + Element>(a: &NdArray<T>) -> Result<NdArray<T>> {
    try_map(a, |x: T| {
        if x.is_nan() || x.abs() > T::one() {
            Err(domain("asin", x, "|x| <= 1"))
        } else {
            Ok(x.asin())
        }
    })
}

pub fn acos<T: Float + Element>(a: &NdArray<T>) -> Result<NdArray<T>> {
    try_map(a, |x: T| {
        if x.is_nan() || x.abs() > T::one() {
            Err(domain("acos", x, "|x| <= 1"))
        } else {
            Ok(x.acos())
        }
    })
}

/// Raise every element to `exponent`.
pub fn powf<T: Float + Element>(a: &NdArray<T>, exponent: T) -> NdArray<T> {
    map(a, move |x: T| x.powf(exponent))
}

/// Floating remainder `a % b` (sign of `a`) with broadcasting; zero divisors
/// are a domain error.
pub fn remainder<T: Float + Element>(a: &NdArray<T>, b: &NdArray<T>) -> Result<NdArray<T>> {
    try_zip_map(a, b, |x: T, y: T| {
        if y == T::zero() {
            Err(domain("remainder", y, "divisor != 0"))
        } else {
            Ok(x % y)
        }
    })
}

pub fn is_nan<T: Float + Element>(a: &NdArray<T>) -> NdArray<bool> {
    map(a, |x: T| x.is_nan())
}

pub fn is_inf<T: Float + Element>(a: &NdArray<T>) -> NdArray<bool> {
    map(a, |x: T| x.is_infinite())
}

/// Piecewise-linear interpolation of the samples `(xp, fp)` at every element of `x`.
///
/// `xp` must be 1-D, ascending, and the same length as `fp` with at least two
/// points. Elements left of `xp[0]` map to `fp[0]`, elements right of the last
/// sample map to the last `fp`.
pub fn interp<T: Float + Element>(
    x: &NdArray<T>,
    xp: &NdArray<T>,
    fp: &NdArray<T>,
) -> Result<NdArray<T>> {
    if xp.ndim() != 1 || fp.ndim() != 1 {
        return Err(ArrayError::InvalidArgument(
            "interp sample points must be 1-D".to_string(),
        ));
    }
    if xp.len() != fp.len() {
        return Err(ArrayError::SizeMismatch {
            expected: xp.len(),
            got: fp.len(),
        });
    }
    if xp.len() < 2 {
        return Err(ArrayError::InvalidArgument(
            "interp needs at least two sample points".to_string(),
        ));
    }
    let xs = xp.to_vec();
    let fs = fp.to_vec();
    if xs.windows(2).any(|w| w[1] < w[0]) {
        return Err(ArrayError::InvalidArgument(
            "interp sample points must be ascending".to_string(),
        ));
    }
    let last = xs.len() - 1;
    Ok(map(x, move |xi: T| {
        if xi <= xs[0] {
            return fs[0];
        }
        if xi >= xs[last] {
            return fs[last];
        }
        // first j with xs[j + 1] >= xi
        let j = xs.partition_point(|&v| v < xi) - 1;
        let (x0, x1, y0, y1) = (xs[j], xs[j + 1], fs[j], fs[j + 1]);
        y0 + (y1 - y0) * (xi - x0) / (x1 - x0)
    }))
}
