//! `sidefx` Core: composable side-effecting consumers with boxing-avoidance dispatch.
//!
//! A [`Consumer<I>`](Consumer) performs a side effect over an argument tuple
//! described by the marker `I` (see [`repr`]). Consumers chain with
//! [`then`](Consumer::then) / [`before`](Consumer::before), fold with [`of`] /
//! [`sequence`], and have their failures adapted with
//! [`handle_ex`](Consumer::handle_ex), [`ignore_ex`](Consumer::ignore_ex) and
//! [`on_ex`](Consumer::on_ex). A consumer that cannot fail has
//! `Error = Infallible`.

pub mod adapt;
pub mod batch;
pub mod compose;
pub mod config;
pub mod consumer;
pub mod dispatch;
pub mod error;
pub mod repr;

pub use adapt::{Fallible, HandleEx, IgnoreEx, IntoAny, MapErr, OnEx};
pub use batch::{
    of, of_boxed, sequence, sequence_boxed, try_of, try_sequence, Batch, BatchFolder,
    BoxedBatch, Sequence, UnboxingSequence,
};
pub use compose::Then;
pub use config::{ComposeConfig, DispatchMode};
pub use consumer::{
    consumer, noop, try_consumer, AnyConsumer, Consumer, FnConsumer, Noop, Run, TryFnConsumer,
};
pub use dispatch::{Generalized, Route, Unbox, Unboxing};
pub use error::ComposeError;
pub use repr::{Array, Array2, Array3, Boxed, Input};
