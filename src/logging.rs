/*
 * This file is part of devprint.
 *
 * Copyright (C) 2025 devprint contributors
 *
 * devprint is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * devprint is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with devprint. If not, see <https://www.gnu.org/licenses/>.
 */

//! Logging setup
//!
//! Logs go to the systemd journal when its socket exists, otherwise to
//! stderr so that stdout carries only the JSON output.

use std::path::Path;

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "DEVPRINT_LOG";

const DEFAULT_LOG_LEVEL: &str = "info";
const JOURNAL_SOCKET: &str = "/run/systemd/journal/socket";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Journal,
    Stderr,
}

impl LogTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogTarget::Journal => "systemd journal",
            LogTarget::Stderr => "stderr",
        }
    }
}

/// Filter from `DEVPRINT_LOG`, `info` when unset or empty
pub fn log_level() -> String {
    std::env::var(LOG_ENV)
        .ok()
        .filter(|level| !level.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
}

/// Install the global subscriber; call once at startup
pub fn init_logging(log_level: &str) -> LogTarget {
    if Path::new(JOURNAL_SOCKET).exists() {
        match tracing_journald::layer() {
            Ok(journald_layer) => {
                use tracing_subscriber::prelude::*;
                tracing_subscriber::registry()
                    .with(journald_layer)
                    .with(tracing_subscriber::EnvFilter::new(log_level))
                    .init();
                return LogTarget::Journal;
            }
            Err(e) => {
                eprintln!("Failed to create journald layer: {}, falling back to stderr", e);
            }
        }
    }

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .init();
    LogTarget::Stderr
}

/// Log panics to stderr before unwinding.
///
/// Recombination panics are caught inside the pipeline; this only makes them
/// visible.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        let location = panic_info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown".to_string());

        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("PANIC at {}: {}", location, message);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_log_level_from_env() {
        let previous = std::env::var(LOG_ENV).ok();

        std::env::remove_var(LOG_ENV);
        assert_eq!(log_level(), "info");

        std::env::set_var(LOG_ENV, "dp_core=debug");
        assert_eq!(log_level(), "dp_core=debug");

        std::env::set_var(LOG_ENV, "  ");
        assert_eq!(log_level(), "info");

        match previous {
            Some(value) => std::env::set_var(LOG_ENV, value),
            None => std::env::remove_var(LOG_ENV),
        }
    }
}
