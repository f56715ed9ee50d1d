//! State stream contract and the adapters the fusion stages build on
//!
//! - `state_stream` - replay-latest multicast value source
//! - `slot` - per-upstream slot tracking with absent-on-termination

mod slot;
mod state_stream;

pub use slot::{Absent, SlotReader, SlotSource};
pub use state_stream::{Emitter, Registration, Slot, StateStream, StateView, Subscription};
