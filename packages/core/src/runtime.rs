use crate::innerlude::{LocalTask, SchedulerMsg, Task};
use futures_channel::mpsc::{UnboundedReceiver, UnboundedSender};
use futures_util::StreamExt;
use slab::Slab;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::future::Future;
use std::rc::Rc;

thread_local! {
    static RUNTIMES: RefCell<Vec<Rc<Runtime>>> = RefCell::new(vec![]);
}

/// Pushes a runtime onto the stack
pub(crate) fn push_runtime(runtime: Rc<Runtime>) {
    RUNTIMES.with(|stack| stack.borrow_mut().push(runtime));
}

/// Pops a runtime off the stack
pub(crate) fn pop_runtime() {
    RUNTIMES.with(|stack| stack.borrow_mut().pop());
}

/// Spawn a future onto the current runtime.
///
/// Requires an entered runtime on this thread (see [`RuntimeGuard`]).
pub fn spawn(task: impl Future<Output = ()> + 'static) -> Task {
    Runtime::with(|rt| rt.spawn(task)).expect("to be inside a strand runtime")
}

/// The single-threaded event loop every coroutine is driven on.
///
/// Tasks live in a slab and are woken through an unbounded scheduler channel;
/// a waker enqueues its task id, and the owner of the runtime turns the loop
/// with [`Runtime::poll_tasks`] or the async driving helpers. There is no
/// parallelism anywhere: concurrency means interleaving of task polls on one
/// thread, so task futures are free to hold `Rc` and `RefCell` state.
pub struct Runtime {
    pub(crate) tasks: RefCell<Slab<Rc<LocalTask>>>,
    pub(crate) sender: UnboundedSender<SchedulerMsg>,
    receiver: RefCell<UnboundedReceiver<SchedulerMsg>>,
    queued: RefCell<VecDeque<SchedulerMsg>>,
}

impl Runtime {
    pub fn new() -> Rc<Self> {
        let (sender, receiver) = futures_channel::mpsc::unbounded();
        Rc::new(Self {
            tasks: RefCell::new(Slab::new()),
            sender,
            receiver: RefCell::new(receiver),
            queued: RefCell::new(VecDeque::new()),
        })
    }

    /// Get the currently entered runtime on this thread, if any
    pub fn current() -> Option<Rc<Self>> {
        RUNTIMES.with(|stack| stack.borrow().last().cloned())
    }

    /// Runs a function with the currently entered runtime
    pub(crate) fn with<F, R>(f: F) -> Option<R>
    where
        F: FnOnce(&Runtime) -> R,
    {
        RUNTIMES.with(|stack| stack.borrow().last().map(|rt| f(rt)))
    }

    /// Run one turn of the event loop.
    ///
    /// Drains every wakeup queued *so far* and polls those tasks once each.
    /// Wakeups produced while the batch is being handled (a task rescheduling
    /// itself for the next tick, for example) land in the following turn, so a
    /// task can never starve the rest of the queue by re-waking itself.
    ///
    /// Returns the number of wakeups handled this turn.
    pub fn poll_tasks(&self) -> usize {
        let mut batch: Vec<SchedulerMsg> = self.queued.borrow_mut().drain(..).collect();
        while let Ok(Some(msg)) = self.receiver.borrow_mut().try_next() {
            batch.push(msg);
        }

        let handled = batch.len();
        for msg in batch {
            match msg {
                SchedulerMsg::TaskNotified(id) => {
                    let _ = self.handle_task_wakeup(id);
                }
            }
        }

        handled
    }

    /// Park until at least one task has been woken.
    ///
    /// The runtime is the only consumer of its scheduler channel; the received
    /// wakeup is stashed for the next [`Runtime::poll_tasks`] turn.
    pub async fn wait_for_work(&self) {
        let msg = self.receiver.borrow_mut().next().await;
        if let Some(msg) = msg {
            self.queued.borrow_mut().push_back(msg);
        }
    }

    /// Turn the event loop until no live tasks remain.
    ///
    /// A task parked on a future that never resolves keeps this pending
    /// forever; that is the documented fate of a coroutine awaiting a value
    /// that never arrives.
    pub async fn run_until_idle(&self) {
        self.poll_tasks();
        while !self.is_idle() {
            self.wait_for_work().await;
            self.poll_tasks();
        }
    }

    /// Whether the runtime has no live tasks.
    pub fn is_idle(&self) -> bool {
        self.tasks.borrow().is_empty()
    }
}

/// An RAII guard that marks a runtime as current on this thread, so free
/// functions like [`spawn`] can find it.
pub struct RuntimeGuard(Rc<Runtime>);

impl RuntimeGuard {
    pub fn new(runtime: Rc<Runtime>) -> Self {
        push_runtime(runtime.clone());
        Self(runtime)
    }
}

impl Drop for RuntimeGuard {
    fn drop(&mut self) {
        pop_runtime();
    }
}
