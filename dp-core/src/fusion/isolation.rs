//! Failure isolation for recombinations
//!
//! A recombination that errors or panics is contained here: the caller keeps
//! its previous output and tries again on the next upstream change.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::{debug, error};

use crate::constants::fusion::FAILURE_LOG_EVERY;
use crate::error::{DevprintError, Result};

/// Run `f`, turning a panic into an error
pub fn isolate<T>(f: impl FnOnce() -> Result<T>) -> Result<T> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(DevprintError::generic(format!(
            "recombination panicked: {}",
            panic_message(payload.as_ref())
        ))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic payload"
    }
}

/// Consecutive failure tracking for one stage
#[derive(Debug)]
pub struct FailureCounter {
    stage: &'static str,
    consecutive: u32,
}

impl FailureCounter {
    pub fn new(stage: &'static str) -> Self {
        Self {
            stage,
            consecutive: 0,
        }
    }

    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }

    pub fn record_success(&mut self) {
        if self.consecutive > 0 {
            debug!("{} recovered after {} failed recombinations", self.stage, self.consecutive);
            self.consecutive = 0;
        }
    }

    /// Count a failure; logs the first one and then every `FAILURE_LOG_EVERY`
    pub fn record_failure(&mut self, err: &DevprintError) {
        self.consecutive = self.consecutive.saturating_add(1);
        if self.consecutive == 1 || self.consecutive % FAILURE_LOG_EVERY == 0 {
            error!(
                "{} recombination failed (count: {}), keeping previous value: {}",
                self.stage, self.consecutive, err
            );
        }
    }
}
