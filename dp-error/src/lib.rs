//! Unified error handling for devprint
//!
//! This crate provides the single error type used across all devprint components.
//! It uses thiserror for ergonomic error definitions with proper Display and Error trait impls.

use std::io;
use std::path::PathBuf;

/// Result type alias using DevprintError
pub type Result<T> = std::result::Result<T, DevprintError>;

/// Unified error type for all devprint operations
#[derive(thiserror::Error, Debug)]
pub enum DevprintError {
    // ============================================================================
    // I/O and File System Errors
    // ============================================================================
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: io::Error,
    },

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidConfig {
        field: String,
        reason: String,
    },

    // ============================================================================
    // Frequency Table Errors
    // ============================================================================
    #[error("Invalid probability {value} for {field}={observed} (must be 0.0-1.0)")]
    InvalidProbability {
        field: String,
        observed: String,
        value: f64,
    },

    // ============================================================================
    // Inventory Errors
    // ============================================================================
    #[error("Malformed {inventory} inventory: {reason}")]
    MalformedInventory {
        inventory: String,
        reason: String,
    },

    // ============================================================================
    // Network Errors
    // ============================================================================
    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Generic(String),
}

impl DevprintError {
    /// Create a generic error from a string
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic(msg.into())
    }

    /// Create a config error from a string
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid config error for a named field
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a network error from a string
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a malformed inventory error
    pub fn malformed(inventory: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedInventory {
            inventory: inventory.into(),
            reason: reason.into(),
        }
    }
}

// Allow converting from String to DevprintError
impl From<String> for DevprintError {
    fn from(s: String) -> Self {
        Self::Generic(s)
    }
}

// Allow converting from &str to DevprintError
impl From<&str> for DevprintError {
    fn from(s: &str) -> Self {
        Self::Generic(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = DevprintError::invalid_config("public_ip.endpoints", "must not be empty");
        assert_eq!(
            err.to_string(),
            "Invalid configuration value for public_ip.endpoints: must not be empty"
        );

        let err = DevprintError::malformed("software", "empty package id at index 3");
        assert_eq!(err.to_string(), "Malformed software inventory: empty package id at index 3");

        let err = DevprintError::Timeout("https://api.ipify.org after 5s".into());
        assert_eq!(err.to_string(), "Operation timed out: https://api.ipify.org after 5s");
    }

    #[test]
    fn test_from_str() {
        let err: DevprintError = "boom".into();
        assert!(matches!(err, DevprintError::Generic(ref s) if s == "boom"));
    }
}
