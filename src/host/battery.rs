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

//! Battery telemetry from the power-supply class

use std::fs;
use std::path::{Path, PathBuf};

use dp_core::{BatteryHealth, BatteryStatus, BatterySnapshot};

fn read_attr(dir: &Path, attr: &str) -> Option<String> {
    fs::read_to_string(dir.join(attr))
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn read_number(dir: &Path, attr: &str) -> Option<i64> {
    read_attr(dir, attr)?.parse().ok()
}

/// First supply whose `type` is `Battery`, by name order
pub fn find_battery(power_root: &Path) -> Option<PathBuf> {
    let mut entries: Vec<PathBuf> = fs::read_dir(power_root)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .collect();
    entries.sort();

    entries
        .into_iter()
        .find(|dir| read_attr(dir, "type").as_deref() == Some("Battery"))
}

pub fn parse_status(raw: &str) -> BatteryStatus {
    match raw {
        "Charging" => BatteryStatus::Charging,
        "Discharging" => BatteryStatus::Discharging,
        "Full" => BatteryStatus::Full,
        "Not charging" => BatteryStatus::Idle,
        _ => BatteryStatus::Unknown,
    }
}

pub fn parse_health(raw: &str) -> BatteryHealth {
    match raw {
        "Good" => BatteryHealth::Good,
        "Overheat" => BatteryHealth::Overheat,
        "Dead" => BatteryHealth::Dead,
        "Over voltage" => BatteryHealth::OverVoltage,
        _ => BatteryHealth::Unknown,
    }
}

/// Design capacity in mAh.
///
/// Uses `charge_full_design` (uAh) when present, otherwise derives it from
/// `energy_full_design` (uWh) and `voltage_min_design` (uV).
fn design_capacity_mah(dir: &Path) -> u32 {
    if let Some(charge_uah) = read_number(dir, "charge_full_design") {
        return u32::try_from(charge_uah.max(0) / 1_000).unwrap_or(u32::MAX);
    }

    match (
        read_number(dir, "energy_full_design"),
        read_number(dir, "voltage_min_design"),
    ) {
        (Some(energy_uwh), Some(voltage_uv)) if voltage_uv > 0 => {
            // float-to-int casts saturate
            (energy_uwh.max(0) as f64 / voltage_uv as f64 * 1_000.0).round() as u32
        }
        _ => 0,
    }
}

/// Current battery reading; the default snapshot when there is no battery
pub fn read_battery(power_root: &Path) -> BatterySnapshot {
    let Some(dir) = find_battery(power_root) else {
        return BatterySnapshot::default();
    };

    BatterySnapshot {
        level_pct: read_number(&dir, "capacity")
            .map(|pct| pct.clamp(0, 100) as u8)
            .unwrap_or(0),
        status: read_attr(&dir, "status")
            .map(|s| parse_status(&s))
            .unwrap_or_default(),
        health: read_attr(&dir, "health")
            .map(|s| parse_health(&s))
            .unwrap_or_default(),
        // tenths of a degree
        temperature_c: read_number(&dir, "temp")
            .map(|t| t as f32 / 10.0)
            .unwrap_or(0.0),
        capacity_mah: design_capacity_mah(&dir),
    }
}
