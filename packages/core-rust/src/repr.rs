//! Input representations: the type-level shape of a consumer's argument tuple.
//!
//! A consumer is keyed by a marker tuple `I` of one to four elements. Each
//! element names how one argument is passed:
//!
//! | Marker | Representation | Argument type |
//! |---|---|---|
//! | `i32`, `f64`, `bool`, ... | primitive scalar | the value itself |
//! | [`Boxed<T>`] | boxed / generic reference | `&T` |
//! | [`Array<T>`] | array, rank 1 | `&[T]` |
//! | [`Array2<T>`] | array, rank 2 | `&[Vec<T>]` |
//! | [`Array3<T>`] | array, rank 3 | `&[Vec<Vec<T>>]` |
//!
//! Markers are never constructed; only their [`Input::Ref`] projection is.
//! Every projection is `Copy`, so a composite can hand the same arguments to
//! each of its constituents.

use std::marker::PhantomData;

/// Type-level description of how arguments reach a consumer.
///
/// Implemented for the element markers listed in the module docs and for
/// tuples of one to four of them.
pub trait Input {
    /// Argument value borrowed for the duration of a single invocation.
    type Ref<'a>: Copy;
}

/// Boxed (generic, by-reference) representation of a `T`.
pub struct Boxed<T: ?Sized>(PhantomData<T>);

/// Rank-1 array of `T`, passed as a slice.
pub struct Array<T>(PhantomData<T>);

/// Rank-2 array of `T`.
pub type Array2<T> = Array<Vec<T>>;

/// Rank-3 array of `T`.
pub type Array3<T> = Array<Vec<Vec<T>>>;

impl<T: ?Sized + 'static> Input for Boxed<T> {
    type Ref<'a> = &'a T;
}

impl<T: 'static> Input for Array<T> {
    type Ref<'a> = &'a [T];
}

macro_rules! scalar_inputs {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Input for $ty {
                type Ref<'a> = $ty;
            }
        )*
    };
}

scalar_inputs!(bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

macro_rules! tuple_inputs {
    ($(($($name:ident),+)),+ $(,)?) => {
        $(
            impl<$($name: Input),+> Input for ($($name,)+) {
                type Ref<'a> = ($($name::Ref<'a>,)+);
            }
        )+
    };
}

tuple_inputs!((A), (A, B), (A, B, C), (A, B, C, D));
