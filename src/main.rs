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


use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tracing::{debug, info, warn};

use devprint::cli::Cli;
use devprint::host;
use devprint::logging::{init_logging, install_panic_hook, log_level};
use dp_core::settings::{install_settings, load_settings, load_settings_from, Settings};
use dp_core::{FinalState, Pipeline, PipelineOptions, Slot};

// ============================================================================
// Output
// ============================================================================

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize state")?;
    println!("{}", text);
    Ok(())
}

fn print_state(state: &FinalState, export_only: bool) -> anyhow::Result<()> {
    if export_only {
        print_json(&state.export())
    } else {
        print_json(state)
    }
}

fn resolve_settings(cli: &Cli) -> anyhow::Result<Settings> {
    match &cli.config {
        Some(path) => load_settings_from(path)
            .with_context(|| format!("Failed to load settings from {}", path.display())),
        None => Ok(load_settings().unwrap_or_else(|e| {
            warn!("Using default settings: {}", e);
            Settings::default()
        })),
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    install_panic_hook();
    let target = init_logging(&log_level());
    debug!("Logging to {}", target.as_str());

    let settings = resolve_settings(&cli)?;
    install_settings(settings.clone());

    let sources = host::build_sources(&settings).context("Failed to start host sources")?;
    let pipeline = Pipeline::start(sources, PipelineOptions::from_settings(&settings));

    let mut sub = pipeline.subscribe();
    if let Some(state) = pipeline.current() {
        print_state(&state, cli.export)?;
    }

    if cli.once {
        return Ok(());
    }

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Interrupted, shutting down");
                break;
            }
            update = sub.changed() => match update {
                Some(Slot::Live(state)) => print_state(&state, cli.export)?,
                Some(Slot::Terminated(reason)) => {
                    warn!("Final state stream terminated: {}", reason);
                    break;
                }
                None => break,
            }
        }
    }

    drop(sub);
    drop(pipeline);
    Ok(())
}
