//! Folding lists of consumers into one.
//!
//! [`of`] takes a list whose length is known once collected, so it can hand
//! back a no-op for an empty list and the element itself for a list of one.
//! [`sequence`] always wraps. The `_boxed` variants fold consumers typed at a
//! boxed representation into a raw-input consumer, asking every element for
//! its raw view on each call.

use std::fmt;
use std::marker::PhantomData;

use crate::config::{ComposeConfig, DispatchMode};
use crate::consumer::Consumer;
use crate::dispatch::{accept_unboxed, Unbox, Unboxing};
use crate::error::ComposeError;
use crate::repr::Input;

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

/// Fixed-length fold built by [`of`].
#[derive(Debug, Clone)]
pub enum Batch<C> {
    /// Empty list: does nothing.
    Noop,
    /// One element, called directly.
    Single(C),
    /// Two or more elements, called in order.
    All(Box<[C]>),
}

impl<I, C> Consumer<I> for Batch<C>
where
    I: Input,
    C: Consumer<I>,
{
    type Error = C::Error;

    fn accept(&self, args: I::Ref<'_>) -> Result<(), C::Error> {
        match self {
            Self::Noop => Ok(()),
            Self::Single(op) => op.accept(args),
            Self::All(ops) => {
                for op in ops.iter() {
                    op.accept(args)?;
                }
                Ok(())
            }
        }
    }

    // A single-element batch is that element, raw view included.
    fn unboxed(&self) -> Option<&dyn Consumer<I::Raw, Error = C::Error>>
    where
        I: Unbox,
    {
        match self {
            Self::Single(op) => op.unboxed(),
            Self::Noop | Self::All(_) => None,
        }
    }
}

/// Always-wrapping fold built by [`sequence`].
#[derive(Debug, Clone)]
pub struct Sequence<C> {
    ops: Vec<C>,
}

impl<C> Sequence<C> {
    /// The folded consumers, in call order.
    #[must_use]
    pub fn ops(&self) -> &[C] {
        &self.ops
    }
}

impl<I, C> Consumer<I> for Sequence<C>
where
    I: Input,
    C: Consumer<I>,
{
    type Error = C::Error;

    fn accept(&self, args: I::Ref<'_>) -> Result<(), C::Error> {
        for op in &self.ops {
            op.accept(args)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Boxed folds
// ---------------------------------------------------------------------------

/// Consumers typed at the boxed representation `G`, called in order with raw
/// arguments. Built by [`sequence_boxed`].
///
/// Each element is asked for its raw view on every call. Elements without one
/// share a single boxed copy of the arguments per call.
pub struct UnboxingSequence<C, G> {
    ops: Vec<C>,
    mode: DispatchMode,
    _repr: PhantomData<fn(G)>,
}

impl<C, G> UnboxingSequence<C, G> {
    fn new(ops: Vec<C>, mode: DispatchMode) -> Self {
        Self {
            ops,
            mode,
            _repr: PhantomData,
        }
    }

    /// The folded consumers, in call order.
    #[must_use]
    pub fn ops(&self) -> &[C] {
        &self.ops
    }
}

impl<G, C> Consumer<G::Raw> for UnboxingSequence<C, G>
where
    G: Unbox,
    C: Consumer<G>,
{
    type Error = C::Error;

    fn accept(&self, args: <G::Raw as Input>::Ref<'_>) -> Result<(), C::Error> {
        let mut boxed = None;
        for op in &self.ops {
            accept_unboxed::<G, C>(op, args, self.mode, &mut boxed)?;
        }
        Ok(())
    }
}

impl<C: Clone, G> Clone for UnboxingSequence<C, G> {
    fn clone(&self) -> Self {
        Self::new(self.ops.clone(), self.mode)
    }
}

impl<C: fmt::Debug, G> fmt::Debug for UnboxingSequence<C, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnboxingSequence")
            .field("ops", &self.ops)
            .field("mode", &self.mode)
            .finish()
    }
}

/// Fixed-length fold of boxed consumers built by [`of_boxed`].
pub enum BoxedBatch<C, G> {
    /// Empty list: does nothing.
    Noop,
    /// One element, its route resolved when folded.
    Single(Unboxing<C, G>),
    /// Two or more elements, dispatched one by one on every call.
    All(UnboxingSequence<C, G>),
}

impl<G, C> Consumer<G::Raw> for BoxedBatch<C, G>
where
    G: Unbox,
    C: Consumer<G>,
{
    type Error = C::Error;

    fn accept(&self, args: <G::Raw as Input>::Ref<'_>) -> Result<(), C::Error> {
        match self {
            Self::Noop => Ok(()),
            Self::Single(op) => op.accept(args),
            Self::All(ops) => ops.accept(args),
        }
    }
}

impl<C: Clone, G> Clone for BoxedBatch<C, G> {
    fn clone(&self) -> Self {
        match self {
            Self::Noop => Self::Noop,
            Self::Single(op) => Self::Single(op.clone()),
            Self::All(ops) => Self::All(ops.clone()),
        }
    }
}

impl<C: fmt::Debug, G> fmt::Debug for BoxedBatch<C, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Noop => f.write_str("Noop"),
            Self::Single(op) => f.debug_tuple("Single").field(op).finish(),
            Self::All(ops) => f.debug_tuple("All").field(ops).finish(),
        }
    }
}

// ---------------------------------------------------------------------------
// BatchFolder
// ---------------------------------------------------------------------------

/// Builds folds under a [`ComposeConfig`].
///
/// The free functions in this module use the default config.
#[derive(Debug, Clone, Default)]
pub struct BatchFolder {
    config: ComposeConfig,
}

impl BatchFolder {
    #[must_use]
    pub fn new(config: ComposeConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &ComposeConfig {
        &self.config
    }

    /// Folds a fixed list. Empty yields [`Batch::Noop`], one element yields
    /// [`Batch::Single`].
    ///
    /// `Batch::Single` adds no wrapping behaviour: it calls the element
    /// directly and forwards its [`unboxed`](Consumer::unboxed) view, so a
    /// one-element fold is indistinguishable from the element itself.
    #[must_use]
    pub fn of<C, T>(&self, ops: T) -> Batch<C>
    where
        T: IntoIterator<Item = C>,
    {
        let mut ops: Vec<C> = ops.into_iter().collect();
        tracing::debug!(len = ops.len(), "folding consumer list");
        if ops.len() > 1 {
            Batch::All(ops.into_boxed_slice())
        } else {
            ops.pop().map_or(Batch::Noop, Batch::Single)
        }
    }

    /// Like [`of`](BatchFolder::of) for a list, and elements, that may be absent.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError::MissingList`] when `ops` is `None` and
    /// [`ComposeError::MissingElement`] for the first absent element.
    pub fn try_of<C, T>(&self, ops: Option<T>) -> Result<Batch<C>, ComposeError>
    where
        T: IntoIterator<Item = Option<C>>,
    {
        let ops = ops.ok_or(ComposeError::MissingList { call: "of" })?;
        let ops = ops
            .into_iter()
            .enumerate()
            .map(|(index, op)| op.ok_or(ComposeError::MissingElement { call: "of", index }))
            .collect::<Result<Vec<C>, _>>()?;
        Ok(self.of(ops))
    }

    /// Folds a container of unknown length. The result always wraps, so an
    /// empty container gives a consumer that does nothing when called.
    #[must_use]
    pub fn sequence<C, T>(&self, ops: T) -> Sequence<C>
    where
        T: IntoIterator<Item = C>,
    {
        let ops: Vec<C> = ops.into_iter().collect();
        tracing::debug!(len = ops.len(), "sequencing consumers");
        Sequence { ops }
    }

    /// Like [`sequence`](BatchFolder::sequence) for a container that may be
    /// absent.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError::MissingList`] when `ops` is `None`.
    pub fn try_sequence<C, T>(&self, ops: Option<T>) -> Result<Sequence<C>, ComposeError>
    where
        T: IntoIterator<Item = C>,
    {
        ops.map(|ops| self.sequence(ops))
            .ok_or(ComposeError::MissingList { call: "sequence" })
    }

    /// Folds a fixed list of consumers typed at the boxed representation `G`
    /// into one accepting raw arguments.
    #[must_use]
    pub fn of_boxed<G, C, T>(&self, ops: T) -> BoxedBatch<C, G>
    where
        G: Unbox,
        C: Consumer<G>,
        T: IntoIterator<Item = C>,
    {
        let mut ops: Vec<C> = ops.into_iter().collect();
        tracing::debug!(
            len = ops.len(),
            mode = ?self.config.dispatch,
            "folding boxed consumer list"
        );
        if ops.len() > 1 {
            BoxedBatch::All(UnboxingSequence::new(ops, self.config.dispatch))
        } else {
            ops.pop().map_or(BoxedBatch::Noop, |op| {
                BoxedBatch::Single(Unboxing::with_config(op, &self.config))
            })
        }
    }

    /// Folds a container of consumers typed at the boxed representation `G`
    /// into one accepting raw arguments. Always wraps.
    #[must_use]
    pub fn sequence_boxed<G, C, T>(&self, ops: T) -> UnboxingSequence<C, G>
    where
        G: Unbox,
        C: Consumer<G>,
        T: IntoIterator<Item = C>,
    {
        let ops: Vec<C> = ops.into_iter().collect();
        tracing::debug!(
            len = ops.len(),
            mode = ?self.config.dispatch,
            "sequencing boxed consumers"
        );
        UnboxingSequence::new(ops, self.config.dispatch)
    }
}

/// [`BatchFolder::of`] with the default config.
#[must_use]
pub fn of<C, T>(ops: T) -> Batch<C>
where
    T: IntoIterator<Item = C>,
{
    BatchFolder::default().of(ops)
}

/// [`BatchFolder::try_of`] with the default config.
///
/// # Errors
///
/// See [`BatchFolder::try_of`].
pub fn try_of<C, T>(ops: Option<T>) -> Result<Batch<C>, ComposeError>
where
    T: IntoIterator<Item = Option<C>>,
{
    BatchFolder::default().try_of(ops)
}

/// [`BatchFolder::sequence`] with the default config.
#[must_use]
pub fn sequence<C, T>(ops: T) -> Sequence<C>
where
    T: IntoIterator<Item = C>,
{
    BatchFolder::default().sequence(ops)
}

/// [`BatchFolder::try_sequence`] with the default config.
///
/// # Errors
///
/// See [`BatchFolder::try_sequence`].
pub fn try_sequence<C, T>(ops: Option<T>) -> Result<Sequence<C>, ComposeError>
where
    T: IntoIterator<Item = C>,
{
    BatchFolder::default().try_sequence(ops)
}

/// [`BatchFolder::of_boxed`] with the default config.
#[must_use]
pub fn of_boxed<G, C, T>(ops: T) -> BoxedBatch<C, G>
where
    G: Unbox,
    C: Consumer<G>,
    T: IntoIterator<Item = C>,
{
    BatchFolder::default().of_boxed(ops)
}

/// [`BatchFolder::sequence_boxed`] with the default config.
#[must_use]
pub fn sequence_boxed<G, C, T>(ops: T) -> UnboxingSequence<C, G>
where
    G: Unbox,
    C: Consumer<G>,
    T: IntoIterator<Item = C>,
{
    BatchFolder::default().sequence_boxed(ops)
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::sync::Arc;

    use parking_lot::Mutex;
    use proptest::prelude::*;

    use super::*;
    use crate::consumer::{consumer, try_consumer, Run};
    use crate::dispatch::Route;
    use crate::repr::{Array, Boxed};

    type Log = Arc<Mutex<Vec<String>>>;
    type Raw = (Array<i32>,);
    type BoxedVec = (Boxed<Vec<i32>>,);

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Failed(&'static str);

    #[derive(Debug, Clone)]
    struct Step {
        name: &'static str,
        fail: bool,
        log: Log,
    }

    impl Step {
        fn ok(name: &'static str, log: &Log) -> Self {
            Self { name, fail: false, log: log.clone() }
        }

        fn failing(name: &'static str, log: &Log) -> Self {
            Self { name, fail: true, log: log.clone() }
        }
    }

    impl Consumer<(i32,)> for Step {
        type Error = Failed;

        fn accept(&self, (value,): (i32,)) -> Result<(), Failed> {
            if self.fail {
                return Err(Failed(self.name));
            }
            self.log.lock().push(format!("{}:{value}", self.name));
            Ok(())
        }
    }

    #[test]
    fn empty_of_is_noop() {
        let batch = of(Vec::<Step>::new());
        assert!(matches!(batch, Batch::Noop));
        assert_eq!(batch.accept((1,)), Ok(()));
    }

    #[test]
    fn single_of_is_the_element() {
        let log = Log::default();
        let batch = of([Step::ok("only", &log)]);

        assert!(matches!(&batch, Batch::Single(step) if step.name == "only"));
        batch.accept((3,)).unwrap();
        assert_eq!(*log.lock(), vec!["only:3"]);
    }

    #[test]
    fn of_runs_in_list_order() {
        let log = Log::default();
        let batch = of(vec![Step::ok("a", &log), Step::ok("b", &log), Step::ok("c", &log)]);

        batch.accept((7,)).unwrap();

        assert_eq!(*log.lock(), vec!["a:7", "b:7", "c:7"]);
    }

    #[test]
    fn of_aborts_at_first_failure() {
        let log = Log::default();
        let batch = of(vec![
            Step::ok("a", &log),
            Step::failing("b", &log),
            Step::ok("c", &log),
        ]);

        assert_eq!(batch.accept((1,)), Err(Failed("b")));
        assert_eq!(*log.lock(), vec!["a:1"]);
    }

    #[test]
    fn of_accepts_heterogeneous_boxed_consumers() {
        let log = Log::default();
        let sink = log.clone();
        let ops: Vec<Box<dyn Consumer<(i32,), Error = Infallible>>> = vec![
            Box::new(consumer::<(i32,), _>(move |(value,): (i32,)| {
                sink.lock().push(format!("closure:{value}"));
            })),
            Box::new(Step::failing("bad", &log).ignore_ex()),
            Box::new(Step::ok("step", &log).handle_ex(|_err: Failed| {})),
        ];

        of(ops).run((2,));

        assert_eq!(*log.lock(), vec!["closure:2", "step:2"]);
    }

    #[test]
    fn per_element_handlers_continue_past_failures() {
        let log = Log::default();
        let sink = log.clone();
        let report = move |err: Failed| sink.lock().push(format!("caught:{}", err.0));
        let batch = of(vec![
            Step::failing("a", &log).handle_ex(report.clone()),
            Step::ok("b", &log).handle_ex(report.clone()),
            Step::failing("c", &log).handle_ex(report),
        ]);

        batch.run((4,));

        assert_eq!(*log.lock(), vec!["caught:a", "b:4", "caught:c"]);
    }

    #[test]
    fn try_of_reports_missing_list_and_element() {
        let log = Log::default();

        let err = try_of(None::<Vec<Option<Step>>>).unwrap_err();
        assert_eq!(err, ComposeError::MissingList { call: "of" });

        let err = try_of(Some(vec![Some(Step::ok("a", &log)), None, None])).unwrap_err();
        assert_eq!(err, ComposeError::MissingElement { call: "of", index: 1 });

        let batch = try_of(Some(vec![Some(Step::ok("a", &log))])).unwrap();
        assert!(matches!(batch, Batch::Single(_)));
    }

    #[test]
    fn empty_sequence_leaves_state_unchanged() {
        let log = Log::default();
        log.lock().push("before".to_string());

        let seq = sequence(Vec::<Step>::new());
        seq.accept((1,)).unwrap();

        assert!(seq.ops().is_empty());
        assert_eq!(*log.lock(), vec!["before"]);
    }

    #[test]
    fn sequence_always_wraps_and_runs_in_order() {
        let log = Log::default();
        let seq = sequence(std::iter::once(Step::ok("x", &log)).chain([Step::ok("y", &log)]));

        seq.accept((5,)).unwrap();
        seq.accept((6,)).unwrap();

        assert_eq!(seq.ops().len(), 2);
        assert_eq!(*log.lock(), vec!["x:5", "y:5", "x:6", "y:6"]);
    }

    #[test]
    fn try_sequence_reports_missing_list() {
        let err = try_sequence(None::<Vec<Step>>).unwrap_err();
        assert_eq!(err, ComposeError::MissingList { call: "sequence" });
        assert!(try_sequence(Some(Vec::<Step>::new())).is_ok());
    }

    // -- boxed folds --------------------------------------------------------

    type Probe = Box<dyn Consumer<BoxedVec, Error = String>>;

    /// Raw consumer logging whether it saw the caller's slice or a copy.
    fn raw_probe(log: &Log, tag: &'static str, origin: usize) -> Probe {
        let log = log.clone();
        let raw = consumer::<Raw, _>(move |(xs,): (&[i32],)| {
            let shared = xs.as_ptr() as usize == origin;
            log.lock().push(format!("{tag}:{} shared={shared}", xs.len()));
        });
        Box::new(raw.fallible::<String>().generalize::<BoxedVec>())
    }

    /// Boxed consumer logging the address of the vector it received.
    fn vec_probe(seen: &Arc<Mutex<Vec<usize>>>) -> Probe {
        let seen = seen.clone();
        let op = consumer::<BoxedVec, _>(move |(xs,): (&Vec<i32>,)| {
            seen.lock().push(xs.as_ptr() as usize);
        });
        Box::new(op.fallible::<String>())
    }

    #[test]
    fn mixed_list_dispatches_per_element() {
        let values = vec![1, 2, 3];
        let origin = values.as_ptr() as usize;
        let log = Log::default();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let batch = of_boxed::<BoxedVec, _, _>(vec![
            vec_probe(&seen),
            raw_probe(&log, "raw", origin),
            vec_probe(&seen),
        ]);
        batch.accept((values.as_slice(),)).unwrap();

        assert_eq!(*log.lock(), vec!["raw:3 shared=true"]);
        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], seen[1], "boxed arguments built once per call");
        assert_ne!(seen[0], origin);
    }

    #[test]
    fn generic_mode_boxes_every_element() {
        let values = vec![5, 6];
        let origin = values.as_ptr() as usize;
        let log = Log::default();
        let folder = BatchFolder::new(ComposeConfig { dispatch: DispatchMode::Generic });

        let seq = folder.sequence_boxed::<BoxedVec, _, _>(vec![
            raw_probe(&log, "a", origin),
            raw_probe(&log, "b", origin),
        ]);
        seq.accept((values.as_slice(),)).unwrap();

        assert_eq!(*log.lock(), vec!["a:2 shared=false", "b:2 shared=false"]);
    }

    #[test]
    fn single_boxed_element_resolves_route_up_front() {
        let values = vec![1];
        let log = Log::default();
        let batch = of_boxed::<BoxedVec, _, _>([raw_probe(&log, "one", 0)]);

        assert!(matches!(&batch, BoxedBatch::Single(op) if op.route() == Route::Specialized));
        batch.accept((values.as_slice(),)).unwrap();
        assert_eq!(log.lock().len(), 1);
    }

    #[test]
    fn boxed_folds_abort_at_first_failure() {
        let log = Log::default();
        let failing: Probe = Box::new(try_consumer::<BoxedVec, String, _>(
            |(xs,): (&Vec<i32>,)| -> Result<(), String> { Err(format!("rejected {}", xs.len())) },
        ));
        let seq = sequence_boxed::<BoxedVec, _, _>(vec![
            raw_probe(&log, "first", 0),
            failing,
            raw_probe(&log, "never", 0),
        ]);

        assert_eq!(seq.accept((&[1, 2][..],)), Err("rejected 2".to_string()));
        assert_eq!(*log.lock(), vec!["first:2 shared=false"]);
    }

    #[test]
    fn empty_boxed_fold_is_noop() {
        let batch = of_boxed::<BoxedVec, Probe, _>(Vec::new());
        assert!(matches!(batch, BoxedBatch::Noop));
        assert_eq!(batch.accept((&[][..],)), Ok(()));
    }

    #[test]
    fn single_batch_keeps_raw_view() {
        let log = Log::default();
        let batch = of([raw_probe(&log, "inner", 0)]);
        assert!(batch.unboxed().is_some());

        let pair = of([raw_probe(&log, "a", 0), raw_probe(&log, "b", 0)]);
        assert!(pair.unboxed().is_none());
    }

    proptest! {
        #[test]
        fn of_and_sequence_agree(
            fail_at in proptest::option::of(0usize..5),
            len in 0usize..5,
            value in any::<i32>(),
        ) {
            let names = ["a", "b", "c", "d", "e"];
            let build = |log: &Log| -> Vec<Step> {
                (0..len)
                    .map(|i| {
                        if Some(i) == fail_at {
                            Step::failing(names[i], log)
                        } else {
                            Step::ok(names[i], log)
                        }
                    })
                    .collect()
            };

            let of_log = Log::default();
            let of_result = of(build(&of_log)).accept((value,));
            let seq_log = Log::default();
            let seq_result = sequence(build(&seq_log)).accept((value,));

            prop_assert_eq!(&of_result, &seq_result);
            prop_assert_eq!(of_log.lock().clone(), seq_log.lock().clone());
            let ran = fail_at.filter(|i| *i < len).unwrap_or(len);
            prop_assert_eq!(of_log.lock().len(), ran);
        }

        #[test]
        fn boxed_fold_routes_agree(values in proptest::collection::vec(any::<i32>(), 0..8)) {
            let run_with = |mode: DispatchMode| {
                let log = Log::default();
                let folder = BatchFolder::new(ComposeConfig { dispatch: mode });
                let seq = folder.sequence_boxed::<BoxedVec, _, _>(vec![
                    raw_probe(&log, "a", 0),
                    raw_probe(&log, "b", 0),
                ]);
                seq.accept((values.as_slice(),)).map(|()| log.lock().clone())
            };

            prop_assert_eq!(run_with(DispatchMode::Specialized), run_with(DispatchMode::Generic));
        }
    }
}
