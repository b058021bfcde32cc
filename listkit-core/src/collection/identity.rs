//! Element identity.
//!
//! Sorting and diffing match elements by a typed identity value rather than
//! by position or by a formatted string, so two distinct elements never
//! collide just because they print the same way.

use std::fmt::Debug;
use std::hash::Hash;

/// An element with a stable identity.
///
/// Equality (`PartialEq`) answers "is the content the same", while
/// [`identity`](Identify::identity) answers "is this the same element".
pub trait Identify: PartialEq {
    /// The identity value. Must be stable across mutations of the element.
    type Id: Clone + Eq + Hash + Debug + Send + Sync + 'static;

    fn identity(&self) -> Self::Id;
}

/// Everything a collection needs from its element type.
pub trait Element: Identify + Clone + Send + Sync + 'static {}

impl<T> Element for T where T: Identify + Clone + Send + Sync + 'static {}

impl Identify for String {
    type Id = String;

    fn identity(&self) -> String {
        self.clone()
    }
}

macro_rules! identify_by_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Identify for $ty {
                type Id = $ty;

                fn identity(&self) -> $ty {
                    *self
                }
            }
        )*
    };
}

identify_by_value!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize, char, bool, &'static str);
