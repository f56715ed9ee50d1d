//! Per-upstream slot tracking used by the fusion stages
//!
//! A [`SlotReader`] owns one subscription and the last value seen on it.
//! When the upstream terminates, the slot switches to the type's
//! [`Absent`] value for good and stops waking the combiner.

use std::fmt;

use tracing::{debug, warn};

use super::state_stream::{Slot, StateStream, Subscription};
use crate::data::SourceKind;

/// Value a slot takes when its source is unavailable or terminated
pub trait Absent {
    fn absent() -> Self;
}

impl<T> Absent for Option<T> {
    fn absent() -> Self {
        None
    }
}

impl<T> Absent for Vec<T> {
    fn absent() -> Self {
        Vec::new()
    }
}

/// Where a slot's values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotSource {
    /// An observation source
    Observed(SourceKind),
    /// The output of an earlier fusion stage
    Stage(&'static str),
}

impl fmt::Display for SlotSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotSource::Observed(kind) => write!(f, "{}", kind),
            SlotSource::Stage(name) => f.write_str(name),
        }
    }
}

/// Last-known value of one upstream, owned by a single combiner
pub struct SlotReader<T> {
    source: SlotSource,
    subscription: Subscription<T>,
    latest: T,
    terminated: bool,
    closed: bool,
}

impl<T> SlotReader<T>
where
    T: Clone + PartialEq + Absent + Send + Sync + 'static,
{
    /// Subscribe to an observation source, seeding the slot with its
    /// current value
    pub fn new(kind: SourceKind, stream: &StateStream<T>) -> Self {
        Self::with_source(SlotSource::Observed(kind), stream)
    }

    /// Subscribe to the output of another stage
    pub fn from_stage(name: &'static str, stream: &StateStream<T>) -> Self {
        Self::with_source(SlotSource::Stage(name), stream)
    }

    fn with_source(source: SlotSource, stream: &StateStream<T>) -> Self {
        let subscription = stream.subscribe();
        let initial = subscription.current();
        let mut reader = Self {
            source,
            subscription,
            latest: T::absent(),
            terminated: false,
            closed: false,
        };
        reader.apply(initial);
        reader
    }

    /// The observation source feeding this slot, if it is one
    pub fn kind(&self) -> Option<SourceKind> {
        match self.source {
            SlotSource::Observed(kind) => Some(kind),
            SlotSource::Stage(_) => None,
        }
    }

    pub fn value(&self) -> &T {
        &self.latest
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Wait until the upstream publishes, then record the new value.
    ///
    /// Never completes again once the upstream has terminated or closed, so it
    /// can sit in a `select!` next to live slots. Cancel safe.
    pub async fn changed(&mut self) {
        if self.terminated || self.closed {
            return std::future::pending().await;
        }

        match self.subscription.changed().await {
            Some(slot) => self.apply(slot),
            None => {
                debug!("{} source closed; keeping last value", self.source);
                self.closed = true;
                std::future::pending::<()>().await
            }
        }
    }

    fn apply(&mut self, slot: Slot<T>) {
        match slot {
            Slot::Live(value) => self.latest = value,
            Slot::Terminated(reason) => {
                if !self.terminated {
                    warn!("{} source terminated ({}); slot is now absent", self.source, reason);
                }
                self.terminated = true;
                self.latest = T::absent();
            }
        }
    }
}
