use std::cell::Cell;
use std::rc::Rc;

/// A single-threaded, one-way cooperative cancellation token.
///
/// Cancellation is a latch: once requested it cannot be undone, and anything
/// that wants to "restart" mints a fresh token instead. Tokens form a tree via
/// [`CancellationToken::child_token`]; cancelling a token is observed by all
/// of its descendants, while cancelling a child stays local to that child.
///
/// Nothing is interrupted by a cancellation. Holders of the token decide for
/// themselves when to look at it, which for coroutine drivers is the start of
/// every step.
#[derive(Clone, Debug)]
pub struct CancellationToken {
    inner: Rc<Inner>,
}

#[derive(Debug)]
struct Inner {
    cancelled: Cell<bool>,
    parent: Option<Rc<Inner>>,
}

impl CancellationToken {
    /// Create a fresh root token, not cancelled.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(Inner {
                cancelled: Cell::new(false),
                parent: None,
            }),
        }
    }

    /// Derive a child token.
    ///
    /// The child observes the parent's cancellation, but cancelling the child
    /// leaves the parent and any siblings untouched.
    pub fn child_token(&self) -> Self {
        Self {
            inner: Rc::new(Inner {
                cancelled: Cell::new(false),
                parent: Some(self.inner.clone()),
            }),
        }
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        if !self.inner.cancelled.replace(true) {
            tracing::trace!("cancellation requested");
        }
    }

    /// Whether this token, or any of its ancestors, has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        let mut current = Some(&self.inner);
        while let Some(inner) = current {
            if inner.cancelled.get() {
                return true;
            }
            current = inner.parent.as_ref();
        }
        false
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_is_idempotent_and_sticky() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());

        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn parent_cancellation_cascades_to_children() {
        let root = CancellationToken::new();
        let a = root.child_token();
        let b = root.child_token();
        let grandchild = a.child_token();

        root.cancel();

        assert!(a.is_cancelled());
        assert!(b.is_cancelled());
        assert!(grandchild.is_cancelled());
    }

    #[test]
    fn child_cancellation_stays_local() {
        let root = CancellationToken::new();
        let a = root.child_token();
        let b = root.child_token();

        a.cancel();

        assert!(a.is_cancelled());
        assert!(!root.is_cancelled());
        assert!(!b.is_cancelled());
    }

    #[test]
    fn clones_share_state() {
        let token = CancellationToken::new();
        let alias = token.clone();

        alias.cancel();

        assert!(token.is_cancelled());
    }
}
