//! Boxing-avoidance dispatch.
//!
//! A raw-input composite (say over `(Array<i32>,)`) sometimes holds a
//! consumer typed at the boxed representation (`(Boxed<Vec<i32>>,)`). Calling
//! it through its boxed entry point means copying every slice into a fresh
//! `Vec` first. When that consumer is really a raw one seen through
//! [`Generalized`], [`Consumer::unboxed`] hands back the raw consumer and the
//! copy is skipped.
//!
//! - [`Unboxing`] resolves the route once, when it is built.
//! - Heterogeneous lists (see [`crate::batch`]) ask every element on every
//!   call, through [`accept_unboxed`].
//!
//! Both routes run the same side effects and fail the same way.

use std::fmt;
use std::marker::PhantomData;

use crate::config::{ComposeConfig, DispatchMode};
use crate::consumer::Consumer;
use crate::repr::{Array, Boxed, Input};

/// A boxed input representation with a raw counterpart.
///
/// Implemented for `Boxed<Vec<T>>` (raw: `Array<T>`, so `Boxed<Vec<Vec<T>>>`
/// pairs with `Array2<T>`), `Boxed<String>` (raw: `Boxed<str>`), boxed
/// primitive scalars (raw: the scalar), the scalars themselves, and tuples of
/// one to four of these.
pub trait Unbox: Input {
    /// The unboxed counterpart.
    type Raw: Input;

    /// Owned storage built when boxing raw arguments.
    type Owned;

    /// Materialises boxed values from raw arguments. This is the cost the
    /// dispatcher avoids.
    fn box_up(raw: <Self::Raw as Input>::Ref<'_>) -> Self::Owned;

    /// Borrows boxed arguments out of owned storage.
    fn borrow(owned: &Self::Owned) -> Self::Ref<'_>;

    /// Views boxed arguments as raw ones without copying.
    fn unbox(boxed: Self::Ref<'_>) -> <Self::Raw as Input>::Ref<'_>;
}

impl<T: Clone + 'static> Unbox for Boxed<Vec<T>> {
    type Raw = Array<T>;
    type Owned = Vec<T>;

    fn box_up(raw: &[T]) -> Vec<T> {
        raw.to_vec()
    }

    fn borrow(owned: &Vec<T>) -> &Vec<T> {
        owned
    }

    fn unbox(boxed: Self::Ref<'_>) -> <Self::Raw as Input>::Ref<'_> {
        boxed.as_slice()
    }
}

impl Unbox for Boxed<String> {
    type Raw = Boxed<str>;
    type Owned = String;

    fn box_up(raw: &str) -> String {
        raw.to_owned()
    }

    fn borrow(owned: &String) -> &String {
        owned
    }

    fn unbox(boxed: Self::Ref<'_>) -> <Self::Raw as Input>::Ref<'_> {
        boxed.as_str()
    }
}

macro_rules! unbox_scalars {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Unbox for Boxed<$ty> {
                type Raw = $ty;
                type Owned = $ty;

                fn box_up(raw: $ty) -> $ty {
                    raw
                }

                fn borrow(owned: &$ty) -> &$ty {
                    owned
                }

                fn unbox(boxed: Self::Ref<'_>) -> <Self::Raw as Input>::Ref<'_> {
                    *boxed
                }
            }

            impl Unbox for $ty {
                type Raw = $ty;
                type Owned = $ty;

                fn box_up(raw: $ty) -> $ty {
                    raw
                }

                fn borrow(owned: &$ty) -> $ty {
                    *owned
                }

                fn unbox(boxed: Self::Ref<'_>) -> <Self::Raw as Input>::Ref<'_> {
                    boxed
                }
            }
        )*
    };
}

unbox_scalars!(bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

macro_rules! unbox_tuples {
    ($(($($name:ident $idx:tt),+)),+ $(,)?) => {
        $(
            impl<$($name: Unbox),+> Unbox for ($($name,)+) {
                type Raw = ($($name::Raw,)+);
                type Owned = ($($name::Owned,)+);

                fn box_up(raw: <Self::Raw as Input>::Ref<'_>) -> Self::Owned {
                    ($($name::box_up(raw.$idx),)+)
                }

                fn borrow(owned: &Self::Owned) -> Self::Ref<'_> {
                    ($($name::borrow(&owned.$idx),)+)
                }

                fn unbox(boxed: Self::Ref<'_>) -> <Self::Raw as Input>::Ref<'_> {
                    ($($name::unbox(boxed.$idx),)+)
                }
            }
        )+
    };
}

unbox_tuples!((A 0), (A 0, B 1), (A 0, B 1, C 2), (A 0, B 1, C 2, D 3));

/// Calls a boxed consumer with raw arguments by boxing them first.
fn accept_boxing<G, B>(op: &B, args: <G::Raw as Input>::Ref<'_>) -> Result<(), B::Error>
where
    G: Unbox,
    B: Consumer<G> + ?Sized,
{
    let owned = G::box_up(args);
    op.accept(G::borrow(&owned))
}

/// Calls a boxed consumer with raw arguments, asking it for a raw view first.
///
/// `boxed` caches the boxed arguments across calls that share the same `args`,
/// so a list of plain boxed consumers pays for one copy, not one per element.
pub(crate) fn accept_unboxed<G, B>(
    op: &B,
    args: <G::Raw as Input>::Ref<'_>,
    mode: DispatchMode,
    boxed: &mut Option<G::Owned>,
) -> Result<(), B::Error>
where
    G: Unbox,
    B: Consumer<G> + ?Sized,
{
    if mode == DispatchMode::Specialized {
        if let Some(raw) = op.unboxed() {
            return raw.accept(args);
        }
    }
    let owned = boxed.get_or_insert_with(|| G::box_up(args));
    op.accept(G::borrow(owned))
}

// ---------------------------------------------------------------------------
// Generalized
// ---------------------------------------------------------------------------

/// A raw-input consumer seen at the boxed representation `G`.
///
/// Built by [`Consumer::generalize`]. Calls through the boxed entry point
/// unbox for free; [`Consumer::unboxed`] returns the wrapped consumer.
pub struct Generalized<S, G> {
    inner: S,
    _repr: PhantomData<fn(G)>,
}

impl<S, G> Generalized<S, G> {
    pub(crate) fn new(inner: S) -> Self {
        Self {
            inner,
            _repr: PhantomData,
        }
    }

    /// Returns the wrapped raw-input consumer.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<G, S> Consumer<G> for Generalized<S, G>
where
    G: Unbox,
    S: Consumer<G::Raw>,
{
    type Error = S::Error;

    fn accept(&self, args: G::Ref<'_>) -> Result<(), S::Error> {
        self.inner.accept(G::unbox(args))
    }

    fn unboxed(&self) -> Option<&dyn Consumer<G::Raw, Error = S::Error>>
    where
        G: Unbox,
    {
        let raw: &dyn Consumer<G::Raw, Error = S::Error> = &self.inner;
        Some(raw)
    }
}

impl<S: Clone, G> Clone for Generalized<S, G> {
    fn clone(&self) -> Self {
        Self::new(self.inner.clone())
    }
}

impl<S: fmt::Debug, G> fmt::Debug for Generalized<S, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Generalized").field(&self.inner).finish()
    }
}

// ---------------------------------------------------------------------------
// Unboxing
// ---------------------------------------------------------------------------

/// How an [`Unboxing`] reaches its consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Through the raw view returned by [`Consumer::unboxed`].
    Specialized,
    /// Through the boxed entry point, copying arguments on every call.
    Boxing,
}

/// A consumer typed at the boxed representation `G`, accepting raw arguments.
///
/// The [`Route`] is decided when the adapter is built. For a concrete `B`
/// the answer of [`Consumer::unboxed`] is known after monomorphisation; for
/// `dyn` consumers it is asked once here.
pub struct Unboxing<B, G> {
    inner: B,
    route: Route,
    _repr: PhantomData<fn(G)>,
}

impl<B, G> Unboxing<B, G>
where
    G: Unbox,
    B: Consumer<G>,
{
    /// Adapts `inner` with the default dispatch mode.
    pub fn new(inner: B) -> Self {
        Self::with_config(inner, &ComposeConfig::default())
    }

    /// Adapts `inner`, resolving its route under `config`.
    pub fn with_config(inner: B, config: &ComposeConfig) -> Self {
        let route = match config.dispatch {
            DispatchMode::Specialized if inner.unboxed().is_some() => Route::Specialized,
            DispatchMode::Specialized | DispatchMode::Generic => Route::Boxing,
        };
        tracing::debug!(?route, mode = ?config.dispatch, "resolved consumer dispatch route");
        Self {
            inner,
            route,
            _repr: PhantomData,
        }
    }
}

impl<B, G> Unboxing<B, G> {
    /// The route chosen at construction.
    #[must_use]
    pub fn route(&self) -> Route {
        self.route
    }

    /// Returns the adapted consumer.
    pub fn into_inner(self) -> B {
        self.inner
    }
}

impl<G, B> Consumer<G::Raw> for Unboxing<B, G>
where
    G: Unbox,
    B: Consumer<G>,
{
    type Error = B::Error;

    fn accept(&self, args: <G::Raw as Input>::Ref<'_>) -> Result<(), B::Error> {
        if self.route == Route::Specialized {
            if let Some(raw) = self.inner.unboxed() {
                return raw.accept(args);
            }
        }
        accept_boxing::<G, B>(&self.inner, args)
    }
}

impl<B: Clone, G> Clone for Unboxing<B, G> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            route: self.route,
            _repr: PhantomData,
        }
    }
}

impl<B: fmt::Debug, G> fmt::Debug for Unboxing<B, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unboxing")
            .field("inner", &self.inner)
            .field("route", &self.route)
            .finish()
    }
}
