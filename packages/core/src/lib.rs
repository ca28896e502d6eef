//! strand-core: cooperative coroutine scheduling over a single-threaded event loop.
//!
//! A [`Runtime`] owns a set of tasks and a scheduler channel; a
//! [`CoroutineScope`] ties any number of coroutines to one owner's lifetime
//! through a shared [`CancellationToken`]. Coroutines are [`Suspendable`]
//! computations driven one step at a time: a step that yields a plain value is
//! resumed on the next event-loop turn, a step that yields a future is resumed
//! once that future resolves. Cancellation is cooperative only: it is observed
//! at step boundaries and never interrupts a step that is already running.
//!
//! ```rust, no_run
//! use strand_core::prelude::*;
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let runtime = Runtime::new();
//! let scope = CoroutineScope::new(runtime.clone());
//!
//! scope.start_coroutine(from_fn(|input: Option<u32>| match input {
//!     None => Step::Yielded(Yield::until(async {
//!         wait(Duration::from_millis(50)).await;
//!         1
//!     })),
//!     Some(n) => Step::Complete(n),
//! }));
//!
//! runtime.run_until_idle().await;
//! # }
//! ```

mod cancellation;
mod driver;
mod runtime;
mod scope;
mod suspendable;
mod tasks;
mod wait;
mod yield_now;

pub(crate) mod innerlude {
    pub(crate) use crate::cancellation::*;
    pub(crate) use crate::driver::*;
    pub(crate) use crate::runtime::*;
    pub(crate) use crate::scope::*;
    pub(crate) use crate::suspendable::*;
    pub(crate) use crate::tasks::*;
    pub(crate) use crate::yield_now::*;
}

pub use crate::cancellation::CancellationToken;
pub use crate::runtime::{spawn, Runtime, RuntimeGuard};
pub use crate::scope::{Coroutine, CoroutineScope};
pub use crate::suspendable::{from_fn, FromFn, Step, Suspendable, Yield};
pub use crate::tasks::Task;
pub use crate::wait::wait;
pub use crate::yield_now::{yield_now, YieldNow};

/// Re-export of the common types for ease of use.
pub mod prelude {
    pub use crate::{
        from_fn, spawn, wait, yield_now, CancellationToken, Coroutine, CoroutineScope, Runtime,
        RuntimeGuard, Step, Suspendable, Task, Yield,
    };
}
