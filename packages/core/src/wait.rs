use std::time::Duration;

/// Resolve with no payload after at least `duration`.
///
/// The canonical thing to put inside a [`crate::Yield::until`]: a coroutine
/// that yields `wait(..)` is resumed once the delay has elapsed. There is no
/// way to cancel a pending wait; a stopped coroutine blocked in one simply
/// finds the cancellation at the step boundary after the wait resolves.
///
/// Uses the host's standard timer facility: `tokio`'s timer off the web,
/// `setTimeout` through `gloo-timers` on wasm.
pub async fn wait(duration: Duration) {
    #[cfg(not(target_arch = "wasm32"))]
    tokio::time::sleep(duration).await;

    #[cfg(target_arch = "wasm32")]
    gloo_timers::future::TimeoutFuture::new(duration.as_millis() as u32).await;
}
