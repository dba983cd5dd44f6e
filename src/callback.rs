//! Replaceable event sinks that may or may not suspend.
//!
//! An [`EventCallback`] is either a plain function that runs to completion
//! on the reader task, or a function returning a future that the reader
//! awaits before dispatching the next message. Both are invoked through the
//! single [`EventCallback::invoke`] call.
//!
//! A [`CallbackSlot`] holds the active callback for one event stream. The
//! session owns one slot per stream and shares it with the reader that
//! dispatches into it. Replacing the callback affects only messages
//! dispatched afterwards.

use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use futures_util::future::BoxFuture;

type BlockingFn<T> = dyn Fn(T) + Send + Sync;
type SuspendingFn<T> = dyn Fn(T) -> BoxFuture<'static, ()> + Send + Sync;

/// A consumer-supplied handler for one kind of event.
pub enum EventCallback<T> {
    /// Runs to completion when invoked.
    Blocking(Box<BlockingFn<T>>),
    /// Returns a future that is awaited when invoked.
    Suspending(Box<SuspendingFn<T>>),
}

impl<T: 'static> EventCallback<T> {
    /// Wrap a plain function.
    #[must_use]
    pub fn blocking<F>(f: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        Self::Blocking(Box::new(f))
    }

    /// Wrap an async function.
    #[must_use]
    pub fn suspending<F, Fut>(f: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self::Suspending(Box::new(move |arg| Box::pin(f(arg))))
    }

    /// A callback that ignores its argument.
    #[must_use]
    pub fn noop() -> Self {
        Self::Blocking(Box::new(|_| {}))
    }
}

impl<T> EventCallback<T> {
    /// Whether invoking this callback may suspend.
    #[must_use]
    pub fn is_suspending(&self) -> bool {
        matches!(self, Self::Suspending(_))
    }

    /// Invoke the callback, awaiting it only if it is suspending.
    pub async fn invoke(&self, arg: T) {
        match self {
            Self::Blocking(f) => f(arg),
            Self::Suspending(f) => f(arg).await,
        }
    }
}

impl<T> Debug for EventCallback<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blocking(_) => f.write_str("EventCallback::Blocking"),
            Self::Suspending(_) => f.write_str("EventCallback::Suspending"),
        }
    }
}

/// Holder for the active callback of one event stream. Last write wins.
#[derive(Debug)]
pub struct CallbackSlot<T> {
    current: RwLock<Arc<EventCallback<T>>>,
}

impl<T: 'static> CallbackSlot<T> {
    /// Create a slot holding [`EventCallback::noop`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(EventCallback::noop())),
        }
    }
}

impl<T: 'static> Default for CallbackSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CallbackSlot<T> {
    /// Replace the active callback.
    pub fn set(&self, callback: EventCallback<T>) {
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(callback);
    }

    /// The callback that a dispatch starting now would use.
    #[must_use]
    pub fn current(&self) -> Arc<EventCallback<T>> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Deliver `arg` to the active callback.
    ///
    /// The lock is released before the callback runs, so a callback may
    /// replace its own slot.
    pub async fn dispatch(&self, arg: T) {
        let callback = self.current();
        callback.invoke(arg).await;
    }
}
