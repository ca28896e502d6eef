use crate::innerlude::{yield_now, CancellationToken, Step, Suspendable, Yield, YieldNow};
use futures_util::future::LocalBoxFuture;
use std::future::Future;
use std::task::{ready, Context, Poll};

/// Drives one [`Suspendable`] computation to completion, or until its
/// cancellation token trips.
///
/// The driver owns the computation exclusively: nothing else may resume it,
/// so at most one step is ever in flight. Each [`CoroutineDriver::advance`]
/// call makes at most one `resume` call and then either finishes or parks the
/// task, which is what bounds the stack across arbitrarily long runs of
/// plain-value yields.
///
/// The driver is deliberately transparent to failures. It wraps nothing
/// around `resume`, so a panicking step unwinds straight out of the task poll,
/// and it never retries.
pub(crate) struct CoroutineDriver<S: Suspendable> {
    suspendable: S,
    token: CancellationToken,
    state: DriverState<S::Value>,
}

/// Where a driver currently is between steps.
pub(crate) enum DriverState<V> {
    /// About to pull the next step out of the computation. The token is
    /// consulted on entry, making this the cooperative cancellation point.
    Stepping { input: Option<V> },
    /// The last step yielded a plain value; the next one is parked until a
    /// fresh event-loop turn arrives.
    NextTick { input: Option<V>, tick: YieldNow },
    /// The last step yielded a future; parked until it resolves.
    AwaitingExternal { future: LocalBoxFuture<'static, V> },
    /// Ran to its natural end. The final value has been discarded.
    Completed,
    /// Observed cancellation at a step boundary.
    Stopped,
}

impl<S: Suspendable> CoroutineDriver<S> {
    pub(crate) fn new(suspendable: S, token: CancellationToken) -> Self {
        Self {
            suspendable,
            token,
            state: DriverState::Stepping { input: None },
        }
    }

    /// Advance the state machine as far as it can go without blocking.
    ///
    /// `Ready` means the coroutine is finished for good, either completed or
    /// stopped; the runtime drops the driver in response.
    pub(crate) fn advance(&mut self, cx: &mut Context<'_>) -> Poll<()> {
        loop {
            match &mut self.state {
                DriverState::Stepping { input } => {
                    if self.token.is_cancelled() {
                        self.state = DriverState::Stopped;
                        tracing::trace!("cancellation observed at step boundary");
                        return Poll::Ready(());
                    }

                    let input = input.take();
                    match self.suspendable.resume(input) {
                        Step::Complete(_) => {
                            self.state = DriverState::Completed;
                            tracing::trace!("coroutine completed");
                            return Poll::Ready(());
                        }
                        Step::Yielded(Yield::Value(value)) => {
                            self.state = DriverState::NextTick {
                                input: Some(value),
                                tick: yield_now(),
                            };
                        }
                        Step::Yielded(Yield::Await(future)) => {
                            self.state = DriverState::AwaitingExternal { future };
                        }
                    }
                }
                DriverState::NextTick { input, tick } => {
                    ready!(std::pin::Pin::new(tick).poll(cx));
                    let input = input.take();
                    self.state = DriverState::Stepping { input };
                }
                DriverState::AwaitingExternal { future } => {
                    let value = ready!(future.as_mut().poll(cx));
                    self.state = DriverState::Stepping { input: Some(value) };
                }
                DriverState::Completed | DriverState::Stopped => return Poll::Ready(()),
            }
        }
    }

    #[cfg(test)]
    fn is_completed(&self) -> bool {
        matches!(self.state, DriverState::Completed)
    }

    #[cfg(test)]
    fn is_stopped(&self) -> bool {
        matches!(self.state, DriverState::Stopped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::innerlude::from_fn;
    use futures_util::task::noop_waker;
    use std::cell::Cell;
    use std::future::Future;
    use std::rc::Rc;

    #[test]
    fn one_resume_per_advance_for_plain_yields() {
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);

        let steps = Rc::new(Cell::new(0));
        let counter = steps.clone();
        let mut driver = CoroutineDriver::new(
            from_fn(move |_input: Option<i32>| {
                counter.set(counter.get() + 1);
                if counter.get() < 4 {
                    Step::Yielded(Yield::value(counter.get()))
                } else {
                    Step::Complete(0)
                }
            }),
            CancellationToken::new(),
        );

        assert!(driver.advance(&mut cx).is_pending());
        assert_eq!(steps.get(), 1);
        assert!(driver.advance(&mut cx).is_pending());
        assert_eq!(steps.get(), 2);
        assert!(driver.advance(&mut cx).is_pending());
        assert_eq!(steps.get(), 3);

        assert!(driver.advance(&mut cx).is_ready());
        assert_eq!(steps.get(), 4);
        assert!(driver.is_completed());
    }

    #[test]
    fn cancellation_is_observed_at_the_next_boundary() {
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);

        let steps = Rc::new(Cell::new(0));
        let counter = steps.clone();
        let token = CancellationToken::new();
        let mut driver = CoroutineDriver::new(
            from_fn(move |_input: Option<i32>| {
                counter.set(counter.get() + 1);
                Step::Yielded(Yield::value(0))
            }),
            token.clone(),
        );

        assert!(driver.advance(&mut cx).is_pending());
        assert_eq!(steps.get(), 1);

        token.cancel();

        assert!(driver.advance(&mut cx).is_ready());
        assert_eq!(steps.get(), 1, "no step may run after cancellation");
        assert!(driver.is_stopped());
    }

    #[test]
    fn awaited_future_feeds_the_resolved_value_back_in() {
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);

        let (tx, rx) = futures_channel::oneshot::channel::<i32>();
        let mut rx = Some(rx);
        let received = Rc::new(Cell::new(None));
        let seen = received.clone();
        let mut driver = CoroutineDriver::new(
            from_fn(move |input: Option<i32>| match input {
                None => {
                    let rx = rx.take().unwrap();
                    Step::Yielded(Yield::until(async move { rx.await.unwrap() }))
                }
                Some(value) => {
                    seen.set(Some(value));
                    Step::Complete(value)
                }
            }),
            CancellationToken::new(),
        );

        assert!(driver.advance(&mut cx).is_pending());
        assert!(driver.advance(&mut cx).is_pending());
        assert_eq!(received.get(), None, "must not resume before the future resolves");

        tx.send(7).unwrap();

        assert!(driver.advance(&mut cx).is_ready());
        assert_eq!(received.get(), Some(7));
        assert!(driver.is_completed());
    }

    #[test]
    fn cancellation_wins_after_an_awaited_future_resolves() {
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);

        let (tx, rx) = futures_channel::oneshot::channel::<i32>();
        let mut rx = Some(rx);
        let resumed = Rc::new(Cell::new(false));
        let flag = resumed.clone();
        let token = CancellationToken::new();
        let mut driver = CoroutineDriver::new(
            from_fn(move |input: Option<i32>| match input {
                None => {
                    let rx = rx.take().unwrap();
                    Step::Yielded(Yield::until(async move { rx.await.unwrap() }))
                }
                Some(_) => {
                    flag.set(true);
                    Step::Complete(0)
                }
            }),
            token.clone(),
        );

        assert!(driver.advance(&mut cx).is_pending());

        token.cancel();
        tx.send(7).unwrap();

        assert!(driver.advance(&mut cx).is_ready());
        assert!(!resumed.get(), "the settled wait must not produce an observable step");
        assert!(driver.is_stopped());
    }

    // YieldNow is what makes plain-value rescheduling land on a fresh turn.
    #[test]
    fn yield_now_wakes_and_parks_exactly_once() {
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);

        let mut tick = yield_now();
        assert!(std::pin::Pin::new(&mut tick).poll(&mut cx).is_pending());
        assert!(std::pin::Pin::new(&mut tick).poll(&mut cx).is_ready());
    }
}
