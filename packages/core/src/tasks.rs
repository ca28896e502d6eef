use crate::innerlude::Runtime;
use futures_util::task::ArcWake;
use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;
use std::task::{Poll, Waker};

/// A task's unique identifier.
///
/// `Task` identifies a driver that has been spawned onto the runtime. It stays
/// valid for the lifetime of the task and is recycled once the task finishes.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Task(pub(crate) usize);

impl Runtime {
    /// Start a new future on the same thread as the rest of the runtime.
    ///
    /// The future is polled only from the runtime's own turns, so anything it
    /// captures may be `!Send`. Spawning enqueues an initial wakeup; the first
    /// poll happens on the next turn, never synchronously inside this call.
    pub fn spawn(&self, task: impl Future<Output = ()> + 'static) -> Task {
        // Insert the task, temporarily holding a borrow on the tasks map
        let task_id = {
            let mut tasks = self.tasks.borrow_mut();

            let entry = tasks.vacant_entry();
            let task_id = Task(entry.key());

            entry.insert(Rc::new(LocalTask {
                task: RefCell::new(Box::pin(task)),
                waker: futures_util::task::waker(Arc::new(LocalTaskHandle {
                    id: task_id,
                    tx: self.sender.clone(),
                })),
            }));

            task_id
        };

        self.sender
            .unbounded_send(SchedulerMsg::TaskNotified(task_id))
            .expect("scheduler channel to be open");

        tracing::trace!(task = ?task_id, "spawned task");

        task_id
    }

    /// Poll a single task once with its own waker, removing it when finished.
    pub(crate) fn handle_task_wakeup(&self, id: Task) -> Poll<()> {
        let task = self.tasks.borrow().get(id.0).cloned();

        // The task already finished and was removed, so the wakeup is stale
        let Some(task) = task else {
            return Poll::Ready(());
        };

        let mut cx = std::task::Context::from_waker(&task.waker);

        let poll_result = task.task.borrow_mut().as_mut().poll(&mut cx);

        if poll_result.is_ready() {
            self.tasks.borrow_mut().try_remove(id.0);
        }

        poll_result
    }

    /// Whether the task is still in the runtime's task table.
    pub(crate) fn is_live(&self, id: Task) -> bool {
        self.tasks.borrow().contains(id.0)
    }
}

/// the task itself is the waker
pub(crate) struct LocalTask {
    pub(crate) task: RefCell<Pin<Box<dyn Future<Output = ()> + 'static>>>,
    pub(crate) waker: Waker,
}

/// The type of message that can be sent to the scheduler.
#[derive(Debug)]
pub(crate) enum SchedulerMsg {
    /// A task has woken and needs to be progressed
    TaskNotified(Task),
}

struct LocalTaskHandle {
    id: Task,
    tx: futures_channel::mpsc::UnboundedSender<SchedulerMsg>,
}

impl ArcWake for LocalTaskHandle {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        _ = arc_self
            .tx
            .unbounded_send(SchedulerMsg::TaskNotified(arc_self.id));
    }
}
