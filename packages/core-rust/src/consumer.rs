//! The [`Consumer`] capability and its leaf constructors.
//!
//! A consumer accepts one input tuple (see [`crate::repr`]) and performs a side
//! effect, possibly failing. Throwing-ness is the associated `Error` type:
//! `Error = Infallible` is a consumer that cannot fail. Every combinator in
//! this crate is built from [`Consumer::accept`] alone.

use std::convert::Infallible;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::Arc;

use crate::adapt::{Fallible, HandleEx, IgnoreEx, IntoAny, MapErr, OnEx};
use crate::compose::Then;
use crate::config::ComposeConfig;
use crate::dispatch::{Generalized, Unbox, Unboxing};
use crate::error::ComposeError;
use crate::repr::Input;

/// A side-effecting operation over the input tuple `I`.
///
/// Only [`accept`](Consumer::accept) must be supplied. The remaining methods
/// build new consumers and never invoke anything themselves.
pub trait Consumer<I: Input> {
    /// Failure raised by [`accept`](Consumer::accept). `Infallible` for
    /// consumers that cannot fail.
    type Error;

    /// Performs the side effect for one set of arguments.
    ///
    /// # Errors
    ///
    /// Returns `Self::Error` when the underlying logic fails.
    fn accept(&self, args: I::Ref<'_>) -> Result<(), Self::Error>;

    /// Capability negotiation for boxing-avoidance dispatch.
    ///
    /// A consumer typed at a boxed representation `I` returns the consumer it
    /// wraps when that one already accepts the raw counterpart `I::Raw`, so a
    /// raw-input composite can call it without materialising boxed values.
    /// The default answers `None`.
    fn unboxed(&self) -> Option<&dyn Consumer<I::Raw, Error = Self::Error>>
    where
        I: Unbox,
    {
        None
    }

    /// Runs `self`, then `after`, with the same arguments.
    fn then<B>(self, after: B) -> Then<Self, B>
    where
        Self: Sized,
        B: Consumer<I, Error = Self::Error>,
    {
        Then::new(self, after)
    }

    /// Like [`then`](Consumer::then) for a reference that may be absent.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError::MissingOperation`] when `after` is `None`.
    fn try_then<B>(self, after: Option<B>) -> Result<Then<Self, B>, ComposeError>
    where
        Self: Sized,
        B: Consumer<I, Error = Self::Error>,
    {
        after
            .map(|after| Then::new(self, after))
            .ok_or(ComposeError::MissingOperation { call: "then" })
    }

    /// Runs `before`, then `self`, with the same arguments.
    fn before<B>(self, before: B) -> Then<B, Self>
    where
        Self: Sized,
        B: Consumer<I, Error = Self::Error>,
    {
        Then::new(before, self)
    }

    /// Like [`before`](Consumer::before) for a reference that may be absent.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError::MissingOperation`] when `before` is `None`.
    fn try_before<B>(self, before: Option<B>) -> Result<Then<B, Self>, ComposeError>
    where
        Self: Sized,
        B: Consumer<I, Error = Self::Error>,
    {
        before
            .map(|before| Then::new(before, self))
            .ok_or(ComposeError::MissingOperation { call: "before" })
    }

    /// Chains a consumer typed at the boxed representation `G` after this
    /// raw-input consumer.
    ///
    /// If `after` can expose a raw view of itself the composite calls that
    /// view directly; otherwise the arguments are boxed for it on each call.
    fn then_boxed<G, B>(self, after: B) -> Then<Self, Unboxing<B, G>>
    where
        Self: Sized,
        G: Unbox<Raw = I>,
        B: Consumer<G, Error = Self::Error>,
    {
        Then::new(self, Unboxing::new(after))
    }

    /// [`then_boxed`](Consumer::then_boxed) with an explicit dispatch config.
    fn then_boxed_with<G, B>(self, after: B, config: &ComposeConfig) -> Then<Self, Unboxing<B, G>>
    where
        Self: Sized,
        G: Unbox<Raw = I>,
        B: Consumer<G, Error = Self::Error>,
    {
        Then::new(self, Unboxing::with_config(after, config))
    }

    /// Chains a consumer typed at the boxed representation `G` before this one.
    fn before_boxed<G, B>(self, before: B) -> Then<Unboxing<B, G>, Self>
    where
        Self: Sized,
        G: Unbox<Raw = I>,
        B: Consumer<G, Error = Self::Error>,
    {
        Then::new(Unboxing::new(before), self)
    }

    /// [`before_boxed`](Consumer::before_boxed) with an explicit dispatch config.
    fn before_boxed_with<G, B>(
        self,
        before: B,
        config: &ComposeConfig,
    ) -> Then<Unboxing<B, G>, Self>
    where
        Self: Sized,
        G: Unbox<Raw = I>,
        B: Consumer<G, Error = Self::Error>,
    {
        Then::new(Unboxing::with_config(before, config), self)
    }

    /// Views this raw-input consumer at the boxed representation `G`.
    ///
    /// The view keeps answering [`unboxed`](Consumer::unboxed), so composing it
    /// back into a raw-input chain skips the boxing step.
    fn generalize<G>(self) -> Generalized<Self, G>
    where
        Self: Sized,
        G: Unbox<Raw = I>,
    {
        Generalized::new(self)
    }

    /// Hands any failure to `handler` and reports success.
    fn handle_ex<H>(self, handler: H) -> HandleEx<Self, H>
    where
        Self: Sized,
        H: Fn(Self::Error),
    {
        HandleEx::new(self, handler)
    }

    /// Like [`handle_ex`](Consumer::handle_ex) for a handler that may be absent.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError::MissingHandler`] when `handler` is `None`.
    fn try_handle_ex<H>(self, handler: Option<H>) -> Result<HandleEx<Self, H>, ComposeError>
    where
        Self: Sized,
        H: Fn(Self::Error),
    {
        handler
            .map(|handler| HandleEx::new(self, handler))
            .ok_or(ComposeError::MissingHandler { call: "handle_ex" })
    }

    /// Discards any failure.
    fn ignore_ex(self) -> IgnoreEx<Self>
    where
        Self: Sized,
    {
        IgnoreEx::new(self)
    }

    /// Runs `fallback` with the same arguments when `self` fails.
    ///
    /// The result fails only if `fallback` does.
    fn on_ex<F>(self, fallback: F) -> OnEx<Self, F>
    where
        Self: Sized,
        F: Consumer<I>,
    {
        OnEx::new(self, fallback)
    }

    /// Like [`on_ex`](Consumer::on_ex) for a fallback that may be absent.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError::MissingOperation`] when `fallback` is `None`.
    fn try_on_ex<F>(self, fallback: Option<F>) -> Result<OnEx<Self, F>, ComposeError>
    where
        Self: Sized,
        F: Consumer<I>,
    {
        fallback
            .map(|fallback| OnEx::new(self, fallback))
            .ok_or(ComposeError::MissingOperation { call: "on_ex" })
    }

    /// Converts failures with `f`.
    fn map_err<F, E>(self, f: F) -> MapErr<Self, F>
    where
        Self: Sized,
        F: Fn(Self::Error) -> E,
    {
        MapErr::new(self, f)
    }

    /// Converts failures into [`anyhow::Error`].
    fn into_any(self) -> IntoAny<Self, Self::Error>
    where
        Self: Sized,
        Self::Error: std::error::Error + Send + Sync + 'static,
    {
        MapErr::new(self, anyhow::Error::from as fn(Self::Error) -> anyhow::Error)
    }

    /// Lifts a consumer that cannot fail into any error type `E`.
    fn fallible<E>(self) -> Fallible<Self, E>
    where
        Self: Sized,
    {
        Fallible::new(self)
    }
}

/// Invocation of consumers that cannot fail, without the `Result`.
pub trait Run<I: Input>: Consumer<I, Error = Infallible> {
    /// Performs the side effect.
    fn run(&self, args: I::Ref<'_>) {
        match self.accept(args) {
            Ok(()) => {}
            Err(never) => match never {},
        }
    }
}

impl<I: Input, C: Consumer<I, Error = Infallible> + ?Sized> Run<I> for C {}

/// Type-erased throwing consumer for heterogeneous lists.
pub type AnyConsumer<I> = Box<dyn Consumer<I, Error = anyhow::Error> + Send + Sync>;

// ---------------------------------------------------------------------------
// Forwarding impls
// ---------------------------------------------------------------------------

macro_rules! forward_consumer {
    ($($ptr:ident),*) => {
        $(
            impl<I: Input, C: Consumer<I> + ?Sized> Consumer<I> for $ptr<C> {
                type Error = C::Error;

                fn accept(&self, args: I::Ref<'_>) -> Result<(), Self::Error> {
                    (**self).accept(args)
                }

                fn unboxed(&self) -> Option<&dyn Consumer<I::Raw, Error = Self::Error>>
                where
                    I: Unbox,
                {
                    (**self).unboxed()
                }
            }
        )*
    };
}

forward_consumer!(Box, Arc, Rc);

impl<I: Input, C: Consumer<I> + ?Sized> Consumer<I> for &C {
    type Error = C::Error;

    fn accept(&self, args: I::Ref<'_>) -> Result<(), Self::Error> {
        (**self).accept(args)
    }

    fn unboxed(&self) -> Option<&dyn Consumer<I::Raw, Error = Self::Error>>
    where
        I: Unbox,
    {
        (**self).unboxed()
    }
}

// ---------------------------------------------------------------------------
// Leaf consumers
// ---------------------------------------------------------------------------

/// Consumer backed by a closure that cannot fail. Built by [`consumer`].
pub struct FnConsumer<F, I> {
    f: F,
    _input: PhantomData<fn(I)>,
}

/// Wraps a closure taking the argument tuple of `I`.
///
/// Annotate the closure parameter so it accepts any argument lifetime:
///
/// ```
/// use sidefx_core::{consumer, Array, Run};
///
/// let print_len = consumer::<(Array<u8>,), _>(|(bytes,): (&[u8],)| {
///     assert_eq!(bytes.len(), 2);
/// });
/// print_len.run((&[1u8, 2][..],));
/// ```
pub fn consumer<I: Input, F>(f: F) -> FnConsumer<F, I> {
    FnConsumer {
        f,
        _input: PhantomData,
    }
}

impl<I: Input, F> Consumer<I> for FnConsumer<F, I>
where
    F: for<'a> Fn(I::Ref<'a>),
{
    type Error = Infallible;

    fn accept(&self, args: I::Ref<'_>) -> Result<(), Infallible> {
        (self.f)(args);
        Ok(())
    }
}

impl<F: Clone, I> Clone for FnConsumer<F, I> {
    fn clone(&self) -> Self {
        Self {
            f: self.f.clone(),
            _input: PhantomData,
        }
    }
}

impl<F, I> fmt::Debug for FnConsumer<F, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnConsumer").finish_non_exhaustive()
    }
}

/// Consumer backed by a closure returning `Result`. Built by [`try_consumer`].
pub struct TryFnConsumer<F, I, E> {
    f: F,
    _input: PhantomData<fn(I) -> E>,
}

/// Wraps a fallible closure taking the argument tuple of `I`.
pub fn try_consumer<I: Input, E, F>(f: F) -> TryFnConsumer<F, I, E> {
    TryFnConsumer {
        f,
        _input: PhantomData,
    }
}

impl<I: Input, E, F> Consumer<I> for TryFnConsumer<F, I, E>
where
    F: for<'a> Fn(I::Ref<'a>) -> Result<(), E>,
{
    type Error = E;

    fn accept(&self, args: I::Ref<'_>) -> Result<(), E> {
        (self.f)(args)
    }
}

impl<F: Clone, I, E> Clone for TryFnConsumer<F, I, E> {
    fn clone(&self) -> Self {
        Self {
            f: self.f.clone(),
            _input: PhantomData,
        }
    }
}

impl<F, I, E> fmt::Debug for TryFnConsumer<F, I, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TryFnConsumer").finish_non_exhaustive()
    }
}

/// Consumer that does nothing and never fails. Built by [`noop`].
pub struct Noop<E = Infallible>(PhantomData<fn() -> E>);

/// A consumer with no side effect, usable at any input and error type.
#[must_use]
pub fn noop<E>() -> Noop<E> {
    Noop(PhantomData)
}

impl<I: Input, E> Consumer<I> for Noop<E> {
    type Error = E;

    fn accept(&self, _args: I::Ref<'_>) -> Result<(), E> {
        Ok(())
    }
}

impl<E> Clone for Noop<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Noop<E> {}

impl<E> fmt::Debug for Noop<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Noop")
    }
}
