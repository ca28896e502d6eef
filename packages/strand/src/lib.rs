//! Cooperative coroutines tied to an owner's lifecycle.
//!
//! This crate re-exports the full surface of `strand-core`: a single-threaded
//! [`Runtime`] event loop, [`CoroutineScope`] for lifecycle-tied starting and
//! stopping, the [`Suspendable`] step protocol, and the [`wait`] delay
//! primitive.

pub use strand_core as core;

pub use strand_core::{
    from_fn, spawn, wait, yield_now, CancellationToken, Coroutine, CoroutineScope, FromFn,
    Runtime, RuntimeGuard, Step, Suspendable, Task, Yield, YieldNow,
};

pub mod prelude {
    pub use strand_core::prelude::*;
}
