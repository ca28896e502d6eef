use crate::innerlude::{CancellationToken, CoroutineDriver, Runtime, Suspendable, Task};
use rustc_hash::FxHashSet;
use std::cell::{Cell, RefCell};
use std::future::poll_fn;
use std::rc::Rc;

/// The owner-side anchor for a set of coroutines.
///
/// A scope is meant to be embedded in whatever object owns the work — a UI
/// component, a session, a connection — and tied to that owner's lifecycle.
/// Every coroutine started on a scope shares the scope's current root
/// [`CancellationToken`], so one [`CoroutineScope::stop_all_coroutines`] call
/// halts all of them at their next step boundary without enumerating them.
///
/// Stopping never rewinds anything: effects of steps that already ran stay,
/// and a step that is mid-flight finishes. A stopped scope can be reused;
/// the next [`CoroutineScope::start_coroutine`] mints a fresh root token, and
/// coroutines halted under the old root stay halted.
pub struct CoroutineScope {
    runtime: Rc<Runtime>,
    root: RefCell<CancellationToken>,
    torn_down: Cell<bool>,
    spawned: RefCell<FxHashSet<Task>>,
}

impl CoroutineScope {
    /// Create a scope on the given runtime. No coroutines are running yet,
    /// so the scope reports itself as not running.
    pub fn new(runtime: Rc<Runtime>) -> Self {
        let root = CancellationToken::new();
        root.cancel();
        Self {
            runtime,
            root: RefCell::new(root),
            torn_down: Cell::new(false),
            spawned: RefCell::new(FxHashSet::default()),
        }
    }

    /// Start driving a suspendable computation.
    ///
    /// Returns immediately; the first step runs on the runtime's next turn.
    /// May be called any number of times, and every coroutine started this
    /// way shares the scope's root token.
    ///
    /// Starting after [`CoroutineScope::on_teardown`] is a caller error: it
    /// is answered with a warning and a coroutine that never produces an
    /// observable step.
    pub fn start_coroutine<S>(&self, suspendable: S) -> Coroutine
    where
        S: Suspendable + 'static,
        S::Value: 'static,
    {
        let token = if self.torn_down.get() {
            tracing::warn!("start_coroutine called after teardown; the coroutine will never step");
            self.root.borrow().child_token()
        } else {
            let mut root = self.root.borrow_mut();
            if root.is_cancelled() {
                *root = CancellationToken::new();
            }
            root.child_token()
        };

        let mut driver = CoroutineDriver::new(suspendable, token.clone());
        let task = self.runtime.spawn(poll_fn(move |cx| driver.advance(cx)));
        self.spawned.borrow_mut().insert(task);
        tracing::trace!(task = ?task, "started coroutine");

        Coroutine {
            task,
            token,
            runtime: self.runtime.clone(),
        }
    }

    /// Stop every coroutine started on this scope, cooperatively.
    ///
    /// Pure token mutation: each driver notices for itself at its next step
    /// boundary, so cancellation latency is at most one pending tick or one
    /// pending await. Idempotent.
    pub fn stop_all_coroutines(&self) {
        tracing::trace!("stopping all coroutines");
        self.root.borrow().cancel();
    }

    /// React to the owner being torn down.
    ///
    /// Same cancellation effect as [`CoroutineScope::stop_all_coroutines`],
    /// and the scope becomes permanently inert: later starts do not run.
    /// Intended to be wired to the host's destroy notification, which arrives
    /// at most once.
    pub fn on_teardown(&self) {
        if self.torn_down.replace(true) {
            return;
        }
        tracing::debug!("scope torn down; stopping all coroutines");
        self.root.borrow().cancel();
    }

    /// Whether coroutines started on this scope are currently allowed to
    /// step.
    pub fn is_running(&self) -> bool {
        !self.root.borrow().is_cancelled()
    }

    /// How many coroutines started on this scope have not yet finished.
    ///
    /// A stopped coroutine counts as in flight until its driver observes the
    /// cancellation.
    pub fn in_flight(&self) -> usize {
        let mut spawned = self.spawned.borrow_mut();
        spawned.retain(|task| self.runtime.is_live(*task));
        spawned.len()
    }
}

impl Drop for CoroutineScope {
    fn drop(&mut self) {
        // Dropping the scope counts as teardown: nothing outlives the owner.
        self.root.borrow().cancel();
    }
}

/// A handle to one started coroutine.
///
/// Purely observational plus per-coroutine cooperative cancellation; dropping
/// the handle does nothing to the coroutine.
#[derive(Clone)]
pub struct Coroutine {
    task: Task,
    token: CancellationToken,
    runtime: Rc<Runtime>,
}

impl Coroutine {
    /// The underlying task id.
    pub fn task(&self) -> Task {
        self.task
    }

    /// Cooperatively stop this coroutine alone.
    ///
    /// Cancels the driver's own child token; siblings on the same scope are
    /// unaffected, and the driver stops at its next step boundary.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the driver has finished, either by completing or by observing
    /// cancellation.
    pub fn is_finished(&self) -> bool {
        !self.runtime.is_live(self.task)
    }
}
