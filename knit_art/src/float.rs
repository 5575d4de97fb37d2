use std::{
    fmt::{Debug, Display},
    ops::{AddAssign, DivAssign, MulAssign, SubAssign},
};

use num_traits::{ConstOne, ConstZero};

/// Scalar the loss is tracked with. Implemented for `f32` and `f64`.
pub trait Float:
    'static
    + Display
    + Debug
    + Sync
    + Send
    + Into<f64>
    + AddAssign
    + SubAssign
    + MulAssign
    + DivAssign
    + num_traits::Float
    + num_traits::NumCast
    + ConstZero
    + ConstOne
{
}

impl Float for f32 {}

impl Float for f64 {}
