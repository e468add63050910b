use num::{Float, NumCast, Zero};
use std::{
    fmt::{Debug, Display, LowerExp},
    iter::Sum,
    ops::{AddAssign, SubAssign},
};

/// Floating point type a k-means calculation can be carried out in.
///
/// Implemented for [`f32`] and [`f64`].
pub trait Primitive: AddAssign + Sum + SubAssign + Zero + Float + NumCast
                + PartialOrd + Copy + Default + Display + Debug + Sync + Send + LowerExp + 'static {
    /// Lossy conversion of an element count (cluster sizes, interpolation steps) into this type.
    fn from_count(cnt: usize) -> Self;
}
impl Primitive for f32 {
    #[inline(always)] fn from_count(cnt: usize) -> Self { cnt as f32 }
}
impl Primitive for f64 {
    #[inline(always)] fn from_count(cnt: usize) -> Self { cnt as f64 }
}
