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

//! Command Line Interface

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "devprint")]
#[command(version)]
#[command(about = "devprint - device fingerprint from live host observations")]
#[command(long_about = "devprint - device fingerprint from live host observations

Fuses battery, network, public address and identity observations into one
snapshot, derives a canonical fingerprint and estimates how identifying it is.
Prints the final state as JSON on every change until interrupted.

EXAMPLES:
    devprint                           Follow the final state
    devprint --once                    Print the current state and exit
    devprint --once --export           Print only canonical text and digest
    devprint --config ./settings.json  Use an explicit settings file

ENVIRONMENT VARIABLES:
    DEVPRINT_LOG=debug     Log level / filter (default: info)
    LANG, LC_ALL           Locale reported in the fingerprint

FILES:
    ~/.config/devprint/settings.json   Application settings")]
pub struct Cli {
    /// Print the current state once and exit
    #[arg(long)]
    pub once: bool,

    /// Print only the canonical text and its digest
    #[arg(long)]
    pub export: bool,

    /// Settings file to use instead of the default location
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::parse_from(["devprint", "--once", "--export", "--config", "/tmp/s.json"]);
        assert!(cli.once);
        assert!(cli.export);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/s.json")));

        let cli = Cli::parse_from(["devprint"]);
        assert!(!cli.once && !cli.export && cli.config.is_none());
    }
}
