//! Sequential chaining: [`Consumer::then`] and [`Consumer::before`].
//!
//! Both build a [`Then`], which runs its two halves in order with the same
//! arguments and stops at the first failure.

use crate::consumer::Consumer;
use crate::repr::Input;

/// Runs `first`, then `second`.
#[derive(Debug, Clone)]
pub struct Then<A, B> {
    first: A,
    second: B,
}

impl<A, B> Then<A, B> {
    pub(crate) fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    /// Splits the chain back into its halves.
    #[must_use]
    pub fn into_parts(self) -> (A, B) {
        (self.first, self.second)
    }
}

impl<I, A, B> Consumer<I> for Then<A, B>
where
    I: Input,
    A: Consumer<I>,
    B: Consumer<I, Error = A::Error>,
{
    type Error = A::Error;

    fn accept(&self, args: I::Ref<'_>) -> Result<(), A::Error> {
        self.first.accept(args)?;
        self.second.accept(args)
    }
}
