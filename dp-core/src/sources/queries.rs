//! Synchronous point-queries consumed by Stage-2
//!
//! These are asked once per recombination rather than streamed, so they only
//! need to answer "what is it right now".

use crate::data::AccuracyMode;

/// Location settings readable on demand
#[cfg_attr(test, mockall::automock)]
pub trait LocationQueries: Send + Sync {
    /// Current location accuracy mode
    fn accuracy_mode(&self) -> AccuracyMode;

    /// Package identifiers currently holding the mock-location privilege
    fn mock_location_holders(&self) -> Vec<String>;
}

/// Host without a location subsystem
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocationQueries;

impl LocationQueries for NoLocationQueries {
    fn accuracy_mode(&self) -> AccuracyMode {
        AccuracyMode::Off
    }

    fn mock_location_holders(&self) -> Vec<String> {
        Vec::new()
    }
}
