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

//! Linux host collaborators
//!
//! - `identity` - brand and model from DMI, locale from the environment
//! - `battery` - power-supply class poller
//! - `network` - default-route interface poller
//!
//! Sensor, codec and software inventories have no Linux counterpart here and
//! stay empty.

pub mod battery;
pub mod identity;
pub mod network;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use dp_core::constants::host::MIN_POLL_MS;
use dp_core::settings::Settings;
use dp_core::{NoLocationQueries, PipelineSources, PublicIpResolver, Registration, StateStream};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

pub const DMI_ROOT: &str = "/sys/class/dmi/id";
pub const POWER_SUPPLY_ROOT: &str = "/sys/class/power_supply";
pub const ROUTE_TABLE: &str = "/proc/net/route";

/// Poll period from a configured millisecond value, never below the floor
pub fn poll_period(ms: u64) -> Duration {
    Duration::from_millis(ms.max(MIN_POLL_MS))
}

/// Stream fed by calling `read` every `period`.
///
/// The first value is read synchronously. Must be called from within a tokio
/// runtime; the polling task ends with the last stream handle.
pub fn spawn_poller<T, F>(name: &'static str, period: Duration, read: F) -> StateStream<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
    F: Fn() -> T + Send + 'static,
{
    let initial = read();
    StateStream::from_registration(initial, move |emitter| {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if !emitter.emit(read()) {
                    debug!("{} poller stopped", name);
                    break;
                }
            }
        });
        Registration::new(move || handle.abort())
    })
}

/// Pipeline inputs backed by this host
pub fn build_sources(settings: &Settings) -> dp_core::Result<PipelineSources> {
    let device = identity::read_identity(Path::new(DMI_ROOT), &identity::locale_from_env());
    info!("Host identity: brand={:?} model={:?} locale={}", device.brand, device.model, device.locale);

    let mut sources = PipelineSources::idle(device, Arc::new(NoLocationQueries));

    let power_root = PathBuf::from(POWER_SUPPLY_ROOT);
    sources.battery = spawn_poller("battery", poll_period(settings.host.battery_poll_ms), move || {
        battery::read_battery(&power_root)
    });

    let route_table = PathBuf::from(ROUTE_TABLE);
    sources.network = spawn_poller("network", poll_period(settings.host.network_poll_ms), move || {
        network::read_network(&route_table)
    });

    if settings.public_ip.enabled {
        sources.public_net = PublicIpResolver::from_settings(&settings.public_ip)?.spawn();
    } else {
        info!("Public address resolution disabled");
    }

    Ok(sources)
}
