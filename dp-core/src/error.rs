//! Error types re-exported from `dp-error`

pub use dp_error::{DevprintError, Result};
