//! Element type bounds.

use crate::maybe_sync::MaybeSendSync;

/// Anything that can live in an [`NdArray`](crate::NdArray) buffer.
///
/// `Default` supplies the fill value of [`NdArray::new`](crate::NdArray::new).
pub trait Element: Copy + Default + PartialEq + std::fmt::Debug + MaybeSendSync + 'static {}

impl<T> Element for T where T: Copy + Default + PartialEq + std::fmt::Debug + MaybeSendSync + 'static
{}

/// Element types with ring arithmetic, ordering and numeric casts.
///
/// Unlike [`Element`], this excludes `bool`; comparison and logical
/// operations produce `NdArray<bool>` outputs from `Scalar` inputs.
pub trait Scalar:
    Element + PartialOrd + num_traits::Num + num_traits::NumCast + std::fmt::Display
{
}

impl<T> Scalar for T where
    T: Element + PartialOrd + num_traits::Num + num_traits::NumCast + std::fmt::Display
{
}

/// Real floating-point scalars accepted by the linear algebra kernels.
pub trait FloatScalar: Scalar + num_traits::Float {}

impl<T> FloatScalar for T where T: Scalar + num_traits::Float {}

/// Truthiness used by the logical operations: non-zero is `true`.
pub trait Truthy {
    fn is_truthy(&self) -> bool;
}

impl Truthy for bool {
    #[inline]
    fn is_truthy(&self) -> bool {
        *self
    }
}

macro_rules! impl_truthy_numeric {
    ($($t:ty),*) => {
        $(
            impl Truthy for $t {
                #[inline]
                fn is_truthy(&self) -> bool {
                    *self != (0 as $t)
                }
            }
        )*
    };
}

impl_truthy_numeric!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);
