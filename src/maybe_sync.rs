//! Thread-safety bounds that only bite under the `parallel` feature.
//!
//! `kernel::collect_indexed` and `kernel::try_collect_indexed` hand the
//! per-element closure to rayon when `parallel` is on, which needs the closure
//! to be `Send + Sync` and its output `Send`. Every elementwise, reduction and
//! matmul entry point funnels through those two functions, so their bounds
//! surface on the public API as `F: MaybeSendSync` and `T: Element`.
//!
//! Without `parallel` each marker is implemented for every type. Closures that
//! capture an `Rc` (as closures over [`NdArray`](crate::NdArray) handles do)
//! are then accepted, and the sequential build keeps no trace of the bounds.

macro_rules! maybe_marker {
    ($(#[$doc:meta])* $name:ident: $($bound:tt)+) => {
        $(#[$doc])*
        #[cfg(feature = "parallel")]
        pub trait $name: $($bound)+ {}
        #[cfg(feature = "parallel")]
        impl<T: $($bound)+> $name for T {}

        $(#[$doc])*
        #[cfg(not(feature = "parallel"))]
        pub trait $name {}
        #[cfg(not(feature = "parallel"))]
        impl<T> $name for T {}
    };
}

maybe_marker! {
    /// `Send` when the `parallel` feature is enabled.
    MaybeSend: Send
}

maybe_marker! {
    /// `Sync` when the `parallel` feature is enabled.
    MaybeSync: Sync
}

maybe_marker! {
    /// `Send + Sync` when the `parallel` feature is enabled.
    MaybeSendSync: Send + Sync
}
