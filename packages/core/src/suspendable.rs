use futures_util::future::LocalBoxFuture;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;

/// A suspendable computation driven step-by-step by the scheduler.
///
/// Each call to [`Suspendable::resume`] advances the computation by exactly
/// one step. The `input` is the value produced by the previous step (the
/// yielded value itself for a plain yield, the resolved value for an awaited
/// one); the very first step receives `None`. This is the two-way channel of
/// the generator protocol: values flow out through [`Step`] and back in
/// through `input`.
///
/// Implement it directly as a hand-rolled state machine, or build one from a
/// closure with [`from_fn`].
pub trait Suspendable {
    /// The value type flowing in and out of the computation.
    type Value;

    /// Advance by one step.
    fn resume(&mut self, input: Option<Self::Value>) -> Step<Self::Value>;
}

/// The tagged result of one step of a [`Suspendable`] computation.
pub enum Step<V> {
    /// The computation suspended and produced an intermediate value.
    Yielded(Yield<V>),
    /// The computation ran to its natural end. The final value is discarded
    /// by the scheduler; it exists so a computation can be driven by other
    /// callers that do care about it.
    Complete(V),
}

/// What a suspended step handed to the scheduler, and therefore how the next
/// step gets scheduled.
pub enum Yield<V> {
    /// A plain value: feed it back in on the next event-loop turn. Never
    /// resumed synchronously, so a long run of plain yields cannot grow the
    /// stack or starve other queued work.
    Value(V),
    /// A future: feed its output back in once it resolves, however long that
    /// takes. A future that never resolves parks the coroutine forever.
    Await(LocalBoxFuture<'static, V>),
}

impl<V> Yield<V> {
    /// Yield a plain value, resuming on the next turn.
    pub fn value(value: V) -> Self {
        Yield::Value(value)
    }

    /// Yield a future, resuming with its output once it resolves.
    pub fn until<F>(future: F) -> Self
    where
        F: Future<Output = V> + 'static,
    {
        Yield::Await(Box::pin(future))
    }
}

impl<V: fmt::Debug> fmt::Debug for Yield<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Yield::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Yield::Await(_) => f.write_str("Await(..)"),
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for Step<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Yielded(inner) => f.debug_tuple("Yielded").field(inner).finish(),
            Step::Complete(value) => f.debug_tuple("Complete").field(value).finish(),
        }
    }
}

/// Build a [`Suspendable`] out of a closure, in the manner of
/// `std::iter::from_fn`.
///
/// The closure is the step function: it receives the previous step's value
/// (`None` on the first call) and returns the next [`Step`].
pub fn from_fn<V, F>(f: F) -> FromFn<F, V>
where
    F: FnMut(Option<V>) -> Step<V>,
{
    FromFn(f, PhantomData)
}

/// A [`Suspendable`] built from a closure, returned by [`from_fn`].
pub struct FromFn<F, V>(F, PhantomData<fn() -> V>);

impl<V, F> Suspendable for FromFn<F, V>
where
    F: FnMut(Option<V>) -> Step<V>,
{
    type Value = V;

    fn resume(&mut self, input: Option<V>) -> Step<V> {
        (self.0)(input)
    }
}
