//! Failure adapters.
//!
//! [`HandleEx`] and [`IgnoreEx`] turn a throwing consumer into one that cannot
//! fail. [`OnEx`] swaps the failure for a fallback run. [`MapErr`] and
//! [`Fallible`] only change the error type. None of them look at the failure
//! value beyond passing it along.

use std::convert::Infallible;
use std::fmt;
use std::marker::PhantomData;

use crate::consumer::Consumer;
use crate::repr::Input;

// ---------------------------------------------------------------------------
// HandleEx
// ---------------------------------------------------------------------------

/// Hands failures to a handler. Built by [`Consumer::handle_ex`].
#[derive(Clone)]
pub struct HandleEx<C, H> {
    inner: C,
    handler: H,
}

impl<C, H> HandleEx<C, H> {
    pub(crate) fn new(inner: C, handler: H) -> Self {
        Self { inner, handler }
    }
}

impl<I, C, H> Consumer<I> for HandleEx<C, H>
where
    I: Input,
    C: Consumer<I>,
    H: Fn(C::Error),
{
    type Error = Infallible;

    fn accept(&self, args: I::Ref<'_>) -> Result<(), Infallible> {
        if let Err(err) = self.inner.accept(args) {
            tracing::trace!("consumer failed, passing failure to handler");
            (self.handler)(err);
        }
        Ok(())
    }
}

impl<C: fmt::Debug, H> fmt::Debug for HandleEx<C, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleEx")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// IgnoreEx
// ---------------------------------------------------------------------------

/// Discards failures. Built by [`Consumer::ignore_ex`].
#[derive(Debug, Clone)]
pub struct IgnoreEx<C> {
    inner: C,
}

impl<C> IgnoreEx<C> {
    pub(crate) fn new(inner: C) -> Self {
        Self { inner }
    }
}

impl<I: Input, C: Consumer<I>> Consumer<I> for IgnoreEx<C> {
    type Error = Infallible;

    fn accept(&self, args: I::Ref<'_>) -> Result<(), Infallible> {
        if self.inner.accept(args).is_err() {
            tracing::trace!("consumer failed, failure discarded");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// OnEx
// ---------------------------------------------------------------------------

/// Runs a fallback consumer when the primary fails. Built by
/// [`Consumer::on_ex`].
///
/// The primary's failure is dropped; the fallback's failure propagates.
#[derive(Debug, Clone)]
pub struct OnEx<C, F> {
    inner: C,
    fallback: F,
}

impl<C, F> OnEx<C, F> {
    pub(crate) fn new(inner: C, fallback: F) -> Self {
        Self { inner, fallback }
    }
}

impl<I, C, F> Consumer<I> for OnEx<C, F>
where
    I: Input,
    C: Consumer<I>,
    F: Consumer<I>,
{
    type Error = F::Error;

    fn accept(&self, args: I::Ref<'_>) -> Result<(), F::Error> {
        match self.inner.accept(args) {
            Ok(()) => Ok(()),
            Err(_) => {
                tracing::trace!("consumer failed, running fallback");
                self.fallback.accept(args)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Error conversion
// ---------------------------------------------------------------------------

/// Converts failures with a function. Built by [`Consumer::map_err`].
#[derive(Clone)]
pub struct MapErr<C, F> {
    inner: C,
    f: F,
}

/// Result of [`Consumer::into_any`].
pub type IntoAny<C, E> = MapErr<C, fn(E) -> anyhow::Error>;

impl<C, F> MapErr<C, F> {
    pub(crate) fn new(inner: C, f: F) -> Self {
        Self { inner, f }
    }
}

impl<I, C, F, E> Consumer<I> for MapErr<C, F>
where
    I: Input,
    C: Consumer<I>,
    F: Fn(C::Error) -> E,
{
    type Error = E;

    fn accept(&self, args: I::Ref<'_>) -> Result<(), E> {
        self.inner.accept(args).map_err(&self.f)
    }
}

impl<C: fmt::Debug, F> fmt::Debug for MapErr<C, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapErr")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

/// A consumer that cannot fail, typed as one that may fail with `E`.
/// Built by [`Consumer::fallible`].
pub struct Fallible<C, E> {
    inner: C,
    _error: PhantomData<fn() -> E>,
}

impl<C, E> Fallible<C, E> {
    pub(crate) fn new(inner: C) -> Self {
        Self {
            inner,
            _error: PhantomData,
        }
    }
}

impl<I, C, E> Consumer<I> for Fallible<C, E>
where
    I: Input,
    C: Consumer<I, Error = Infallible>,
{
    type Error = E;

    fn accept(&self, args: I::Ref<'_>) -> Result<(), E> {
        match self.inner.accept(args) {
            Ok(()) => Ok(()),
            Err(never) => match never {},
        }
    }
}

impl<C: Clone, E> Clone for Fallible<C, E> {
    fn clone(&self) -> Self {
        Self::new(self.inner.clone())
    }
}

impl<C: fmt::Debug, E> fmt::Debug for Fallible<C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Fallible").field(&self.inner).finish()
    }
}
