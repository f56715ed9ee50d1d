//! Three-stage fusion of the observation streams
//!
//! - Stage-1 combines location, local network, public network and battery
//!   into a [`Quad`](crate::data::Quad)
//! - Stage-2 adds the sensor, codec and software inventories plus the
//!   location point-queries, producing a [`FullSnapshot`](crate::data::FullSnapshot)
//! - Stage-3 attaches the fingerprint, producing the [`FinalState`](crate::data::FinalState)
//!
//! Each stage is one task that owns its slots exclusively and recombines
//! whenever any input changes. A failed recombination keeps the stage's
//! previous output.

mod isolation;
mod pipeline;
mod stage1;
mod stage2;
mod stage3;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::stream::StateStream;

pub use isolation::{isolate, FailureCounter};
pub use pipeline::{Pipeline, PipelineOptions, PipelineSources};
pub use stage1::Stage1;
pub use stage2::Stage2;
pub use stage3::Stage3;

/// One combiner: a set of input slots and a pure recombination
#[async_trait]
pub trait Stage: Send + 'static {
    type Output: Clone + PartialEq + Send + Sync + 'static;

    fn name(&self) -> &'static str;

    /// Resolve once any input has a new value
    async fn changed(&mut self);

    /// Build the output from the latest value of every input
    fn combine(&self) -> Result<Self::Output>;

    /// Output used when the very first recombination fails
    fn fallback(&self) -> Self::Output;
}

/// Compute the initial output, then keep recombining on a new task.
///
/// Must be called from within a tokio runtime.
pub fn spawn_stage<S: Stage>(stage: S) -> (StateStream<S::Output>, JoinHandle<()>) {
    let initial = match isolate(|| stage.combine()) {
        Ok(value) => value,
        Err(e) => {
            warn!("{} initial recombination failed, starting from fallback: {}", stage.name(), e);
            stage.fallback()
        }
    };

    let output = StateStream::new(initial);
    let handle = tokio::spawn(run_stage(stage, output.clone()));
    (output, handle)
}

async fn run_stage<S: Stage>(mut stage: S, output: StateStream<S::Output>) {
    let name = stage.name();
    let mut failures = FailureCounter::new(name);
    info!("{} started", name);

    loop {
        stage.changed().await;

        match isolate(|| stage.combine()) {
            Ok(value) => {
                failures.record_success();
                if output.publish(value) {
                    debug!("{} recombined", name);
                }
            }
            Err(e) => failures.record_failure(&e),
        }
    }
}
