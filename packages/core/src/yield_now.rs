use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Suspend until the next turn of the event loop.
///
/// Wakes its own task immediately and returns `Pending` exactly once, so
/// whatever follows the `.await` runs on a fresh turn with the rest of the
/// queue given a chance to run in between.
pub fn yield_now() -> YieldNow {
    YieldNow { yielded: false }
}

/// Future returned by [`yield_now`].
#[derive(Debug, Default)]
pub struct YieldNow {
    yielded: bool,
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            Poll::Ready(())
        } else {
            self.yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}
