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

//! Device identity from DMI and the process locale

use std::fs;
use std::path::Path;

use dp_core::constants::placeholders::UNDETERMINED_LOCALE;
use dp_core::DeviceIdentity;

/// Locale variables in lookup priority order
const LOCALE_VARS: &[&str] = &["LC_ALL", "LC_MESSAGES", "LANG"];

fn read_sysfs_attr(path: &Path, attr: &str) -> Option<String> {
    if attr.contains("..") || attr.contains('/') || attr.contains('\0') {
        return None;
    }
    fs::read_to_string(path.join(attr))
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Brand from `sys_vendor` (or `board_vendor`), model from `product_name`
/// (or `board_name`). Missing values are left empty.
pub fn read_identity(dmi_root: &Path, locale: &str) -> DeviceIdentity {
    let brand = read_sysfs_attr(dmi_root, "sys_vendor")
        .or_else(|| read_sysfs_attr(dmi_root, "board_vendor"))
        .unwrap_or_default();
    let model = read_sysfs_attr(dmi_root, "product_name")
        .or_else(|| read_sysfs_attr(dmi_root, "board_name"))
        .unwrap_or_default();

    DeviceIdentity::new(brand, model, locale)
}

/// POSIX locale (`en_US.UTF-8@euro`) to a BCP-47 tag (`en-US`).
///
/// `C`, `POSIX` and empty values are undetermined.
pub fn posix_locale_to_tag(raw: &str) -> String {
    let base = raw
        .split(&['.', '@'][..])
        .next()
        .unwrap_or_default()
        .trim();

    if base.is_empty() || base == "C" || base == "POSIX" {
        return UNDETERMINED_LOCALE.to_string();
    }
    base.replace('_', "-")
}

/// Locale tag from the first non-empty of `LC_ALL`, `LC_MESSAGES`, `LANG`
pub fn locale_from_env() -> String {
    LOCALE_VARS
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.trim().is_empty())
        .map(|value| posix_locale_to_tag(&value))
        .unwrap_or_else(|| UNDETERMINED_LOCALE.to_string())
}
