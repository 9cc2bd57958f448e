//! Cancellation-bearing execution context.
//!
//! A [Context] is cancelled when any [CancelHandle] it descends from is cancelled or
//! dropped, or when its deadline passes. Cancellation is observed through channel
//! disconnection, so a context can take part in a [flume::Selector] next to the
//! channel operation it guards.

use std::time::{Duration, Instant};

use flume::{Receiver, Selector, Sender};

#[derive(Debug, Clone, Default)]
/// Governs the lifetime of an operation or of the provider actor.
pub struct Context {
    signals: Vec<Receiver<()>>,
    deadline: Option<Instant>,
}

#[derive(Debug)]
/// Cancels the [Context] returned alongside it, and every context derived from it.
///
/// Dropping the handle cancels too.
pub struct CancelHandle {
    _sender: Sender<()>,
}

/// Outcome of [Context::select].
#[derive(Debug)]
pub(crate) enum Selected<T> {
    Ready(T),
    Cancelled,
    TimedOut,
}

impl Context {
    /// A context that is never cancelled.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derive a child context that can be cancelled with the returned handle.
    pub fn with_cancel(&self) -> (Context, CancelHandle) {
        // Nothing is ever sent, receivers only observe the disconnection.
        let (sender, receiver) = flume::bounded(0);

        let mut signals = self.signals.clone();
        signals.push(receiver);

        let context = Context {
            signals,
            deadline: self.deadline,
        };

        (context, CancelHandle { _sender: sender })
    }

    /// Derive a child context cancelled after `timeout`, or earlier if this one is.
    pub fn with_timeout(&self, timeout: Duration) -> Context {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derive a child context cancelled at `deadline`, or earlier if this one is.
    pub fn with_deadline(&self, deadline: Instant) -> Context {
        let deadline = match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        };

        Context {
            signals: self.signals.clone(),
            deadline: Some(deadline),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.deadline.map_or(false, |d| Instant::now() >= d)
            || self.signals.iter().any(|s| s.is_disconnected())
    }

    /// Block on `selector` until one of its operations is ready, this context is
    /// cancelled, or `timer` passes.
    pub(crate) fn select<'a, T>(
        &'a self,
        selector: Selector<'a, Selected<T>>,
        timer: Option<Instant>,
    ) -> Selected<T> {
        let selector = self
            .signals
            .iter()
            .fold(selector, |selector, signal| {
                selector.recv(signal, |_| Selected::Cancelled)
            });

        let wake = match (self.deadline, timer) {
            (Some(deadline), Some(timer)) => Some(deadline.min(timer)),
            (deadline, timer) => deadline.or(timer),
        };

        match wake {
            None => selector.wait(),
            Some(wake) => match selector.wait_deadline(wake) {
                Ok(selected) => selected,
                Err(_) if self.is_cancelled() => Selected::Cancelled,
                Err(_) => Selected::TimedOut,
            },
        }
    }
}

impl CancelHandle {
    pub fn cancel(self) {}
}

#[cfg(test)]
mod test {
    use std::thread;

    use super::*;

    #[test]
    fn background_is_never_cancelled() {
        let ctx = Context::background();

        assert!(!ctx.is_cancelled());
        assert!(ctx.deadline().is_none());
    }

    #[test]
    fn cancel_propagates_to_children() {
        let (parent, handle) = Context::background().with_cancel();
        let (child, _child_handle) = parent.with_cancel();
        let grandchild = child.with_timeout(Duration::from_secs(60));

        assert!(!grandchild.is_cancelled());

        handle.cancel();

        assert!(parent.is_cancelled());
        assert!(child.is_cancelled());
        assert!(grandchild.is_cancelled());
    }

    #[test]
    fn child_cancel_does_not_affect_parent() {
        let (parent, _handle) = Context::background().with_cancel();
        let (child, child_handle) = parent.with_cancel();

        drop(child_handle);

        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());
    }

    #[test]
    fn deadline_keeps_the_earliest() {
        let ctx = Context::background().with_timeout(Duration::from_millis(10));
        let later = ctx.with_timeout(Duration::from_secs(60));

        assert_eq!(ctx.deadline(), later.deadline());

        thread::sleep(Duration::from_millis(20));

        assert!(later.is_cancelled());
    }

    #[test]
    fn select_wakes_on_cancel() {
        let (ctx, handle) = Context::background().with_cancel();
        let (_sender, receiver) = flume::unbounded::<u8>();

        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            handle.cancel();
        });

        let selector = Selector::new().recv(&receiver, |r| Selected::Ready(r.ok()));

        assert!(matches!(ctx.select(selector, None), Selected::Cancelled));
    }

    #[test]
    fn select_times_out() {
        let ctx = Context::background();
        let (_sender, receiver) = flume::unbounded::<u8>();

        let selector = Selector::new().recv(&receiver, |r| Selected::Ready(r.ok()));
        let timer = Instant::now() + Duration::from_millis(10);

        assert!(matches!(ctx.select(selector, Some(timer)), Selected::TimedOut));
    }

    #[test]
    fn select_prefers_ready_operation() {
        let ctx = Context::background();
        let (sender, receiver) = flume::unbounded::<u8>();
        sender.send(7).unwrap();

        let selector = Selector::new().recv(&receiver, |r| Selected::Ready(r.ok()));

        assert!(matches!(ctx.select(selector, None), Selected::Ready(Some(7))));
    }
}
