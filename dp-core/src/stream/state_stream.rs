//! Replayable multicast state streams
//!
//! A [`StateStream`] always holds a current value. New subscribers read it
//! immediately, later updates replace it and wake every subscriber. Values
//! are conflated: a slow subscriber only ever sees the most recent one, and
//! publishing a value equal to the current one wakes nobody.
//!
//! A stream may end with a terminal error ([`Slot::Terminated`]); after that
//! it ignores further values.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::watch;

/// What a state stream currently holds
#[derive(Debug, Clone, PartialEq)]
pub enum Slot<T> {
    /// Most recent value
    Live(T),
    /// Stream ended with an unrecoverable error
    Terminated(Arc<str>),
}

impl<T> Slot<T> {
    /// The live value, if the stream has not terminated
    pub fn live(&self) -> Option<&T> {
        match self {
            Slot::Live(v) => Some(v),
            Slot::Terminated(_) => None,
        }
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self, Slot::Terminated(_))
    }
}

/// Teardown guard for a callback-style source.
///
/// Runs its teardown exactly once, when dropped.
pub struct Registration {
    teardown: Option<Box<dyn FnOnce() + Send>>,
}

impl Registration {
    pub fn new(teardown: impl FnOnce() + Send + 'static) -> Self {
        Self {
            teardown: Some(Box::new(teardown)),
        }
    }

    /// A registration with nothing to release
    pub fn none() -> Self {
        Self { teardown: None }
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("active", &self.teardown.is_some())
            .finish()
    }
}

struct Inner<T> {
    tx: watch::Sender<Slot<T>>,
    registration: Mutex<Option<Registration>>,
}

/// Shared, always-current value source.
///
/// Cloning is cheap and every clone refers to the same underlying producer.
/// Dropping the last clone releases the source's [`Registration`].
pub struct StateStream<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for StateStream<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for StateStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateStream")
            .field("subscribers", &self.inner.tx.receiver_count())
            .finish()
    }
}

impl<T> StateStream<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create a stream holding `initial`
    pub fn new(initial: T) -> Self {
        let (tx, _) = watch::channel(Slot::Live(initial));
        Self {
            inner: Arc::new(Inner {
                tx,
                registration: Mutex::new(None),
            }),
        }
    }

    /// Create a stream fed by a callback-style source.
    ///
    /// `register` receives an [`Emitter`] (which may be used immediately) and
    /// returns the guard that unregisters the callbacks. The guard lives as
    /// long as the stream.
    pub fn from_registration<F>(initial: T, register: F) -> Self
    where
        F: FnOnce(Emitter<T>) -> Registration,
    {
        let stream = Self::new(initial);
        let registration = register(stream.emitter());
        *stream.inner.registration.lock() = Some(registration);
        stream
    }

    /// Replace the current value and notify subscribers.
    ///
    /// Returns `false` if the stream has terminated. Publishing a value equal
    /// to the current one is accepted but wakes nobody.
    pub fn publish(&self, value: T) -> bool {
        let mut accepted = false;
        self.inner.tx.send_if_modified(|slot| match slot {
            Slot::Terminated(_) => false,
            Slot::Live(current) => {
                accepted = true;
                if *current == value {
                    false
                } else {
                    *current = value;
                    true
                }
            }
        });
        accepted
    }

    /// End the stream with an unrecoverable error
    pub fn terminate(&self, reason: impl Into<String>) {
        let reason: Arc<str> = Arc::from(reason.into());
        self.inner.tx.send_if_modified(|slot| {
            if slot.is_terminated() {
                return false;
            }
            *slot = Slot::Terminated(reason);
            true
        });
    }

    /// Snapshot of the current slot
    pub fn current(&self) -> Slot<T> {
        self.inner.tx.borrow().clone()
    }

    /// Current live value, `None` once terminated
    pub fn value(&self) -> Option<T> {
        self.inner.tx.borrow().live().cloned()
    }

    pub fn is_terminated(&self) -> bool {
        self.inner.tx.borrow().is_terminated()
    }

    /// Start receiving updates. The current value is readable right away.
    pub fn subscribe(&self) -> Subscription<T> {
        Subscription {
            rx: self.inner.tx.subscribe(),
        }
    }

    /// Weak publishing handle that does not keep the stream alive
    pub fn emitter(&self) -> Emitter<T> {
        Emitter {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.inner.tx.receiver_count()
    }

    /// Read-only handle for consumers
    pub fn view(&self) -> StateView<T> {
        StateView {
            stream: self.clone(),
        }
    }
}

/// Read-only handle on a [`StateStream`].
///
/// Handed to consumers that may observe a stream but must not publish to it
/// or terminate it. Keeps the stream alive like any other handle.
pub struct StateView<T> {
    stream: StateStream<T>,
}

impl<T> Clone for StateView<T> {
    fn clone(&self) -> Self {
        Self {
            stream: self.stream.clone(),
        }
    }
}

impl<T> fmt::Debug for StateView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StateView").field(&self.stream).finish()
    }
}

impl<T> StateView<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn current(&self) -> Slot<T> {
        self.stream.current()
    }

    pub fn value(&self) -> Option<T> {
        self.stream.value()
    }

    pub fn is_terminated(&self) -> bool {
        self.stream.is_terminated()
    }

    pub fn subscribe(&self) -> Subscription<T> {
        self.stream.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.stream.subscriber_count()
    }
}

/// Publishing handle held by producers.
///
/// Emitting fails once every [`StateStream`] handle is gone, which is the
/// producer's cue to stop.
pub struct Emitter<T> {
    inner: Weak<Inner<T>>,
}

impl<T> Clone for Emitter<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<T> Emitter<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Publish a value; `false` if the stream is gone or terminated
    pub fn emit(&self, value: T) -> bool {
        match self.upgrade() {
            Some(stream) => stream.publish(value),
            None => false,
        }
    }

    /// Terminate the stream; `false` if it is already gone
    pub fn terminate(&self, reason: impl Into<String>) -> bool {
        match self.upgrade() {
            Some(stream) => {
                stream.terminate(reason);
                true
            }
            None => false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.strong_count() == 0
    }

    fn upgrade(&self) -> Option<StateStream<T>> {
        self.inner.upgrade().map(|inner| StateStream { inner })
    }
}

/// A consumer's view of a [`StateStream`]. Dropping it unsubscribes.
pub struct Subscription<T> {
    rx: watch::Receiver<Slot<T>>,
}

impl<T: Clone> Subscription<T> {
    /// Current slot without marking it seen
    pub fn current(&self) -> Slot<T> {
        self.rx.borrow().clone()
    }

    /// Wait for the next update and return it.
    ///
    /// Returns `None` when the producer side is gone for good. Cancel safe.
    pub async fn changed(&mut self) -> Option<Slot<T>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}
